//! Boundary transport policies for the molecular-dynamics model.
//!
//! Every policy is a pure function of the drifted position, the velocity and
//! the domain size. Dispatch goes through [`TRANSPORT_TABLE`], indexed by the
//! configured [`BoundaryMode`], so the integrator never branches on the mode.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::utils::math::wrap_periodic;

/// Lower edge of the right-hand window (fraction of `Ly`).
pub const HOLE_WINDOW_LOW: f64 = 0.25;
/// Upper edge of the right-hand window (fraction of `Ly`).
pub const HOLE_WINDOW_HIGH: f64 = 0.75;
/// Inner ghost band: `Lx < x < 1.05 Lx`.
pub const GHOST_BAND_INNER: f64 = 1.05;
/// Outer ghost band: `1.05 Lx <= x < 1.1 Lx`.
pub const GHOST_BAND_OUTER: f64 = 1.1;

/// Height of the tube mouth as a fraction of `Ly`.
pub const TUBE_WINDOW: f64 = 0.5;
/// Minimum inflow speed forced at the tube entrance.
pub const TUBE_FORCED_SPEED: f64 = 10.0;
/// Extra path length (in units of `Lx`) a particle travels back through the tube.
pub const TUBE_DISTANCE_PENALTY: f64 = 1.5;

/// Enumerated boundary topology, selected once per configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BoundaryMode {
    /// Periodic in both axes.
    #[default]
    PeriodicXY,
    /// Periodic in x, reflective in y.
    PeriodicX,
    /// Fully reflective closed box.
    Closed,
    /// Closed box with a window on the right edge opening into a ghost band.
    HoleInABox,
    /// [`BoundaryMode::HoleInABox`] with periodic y.
    HoleInABoxPeriodicY,
    /// Right-edge crossings outside the window phase-jump back to the left side.
    HoleInABoxWrapped,
    /// Channel geometry with forced inflow and a positional offset on re-entry.
    Tube,
}

/// Result of applying a transport policy to one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transport {
    pub position: DVec2,
    pub velocity: DVec2,
    /// Momentum (per unit mass) handed to the walls along each axis.
    pub flux: DVec2,
}

/// Signature shared by every transport policy: `(position, velocity, dims)`.
pub type TransportFn = fn(DVec2, DVec2, DVec2) -> Transport;

/// Lookup table from [`BoundaryMode::index`] to its policy.
pub const TRANSPORT_TABLE: [TransportFn; 7] = [
    transport_periodic_xy,
    transport_periodic_x,
    transport_closed,
    transport_hole_in_a_box,
    transport_hole_in_a_box_periodic_y,
    transport_hole_in_a_box_wrapped,
    transport_tube,
];

impl BoundaryMode {
    pub const ALL: [BoundaryMode; 7] = [
        BoundaryMode::PeriodicXY,
        BoundaryMode::PeriodicX,
        BoundaryMode::Closed,
        BoundaryMode::HoleInABox,
        BoundaryMode::HoleInABoxPeriodicY,
        BoundaryMode::HoleInABoxWrapped,
        BoundaryMode::Tube,
    ];

    /// Maps the configuration index (`edgeCondition`) to a mode.
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            BoundaryMode::PeriodicXY => "periodic-xy",
            BoundaryMode::PeriodicX => "periodic-x",
            BoundaryMode::Closed => "closed",
            BoundaryMode::HoleInABox => "hole-in-a-box",
            BoundaryMode::HoleInABoxPeriodicY => "hole-in-a-box-periodic-y",
            BoundaryMode::HoleInABoxWrapped => "hole-in-a-box-wrapped",
            BoundaryMode::Tube => "tube",
        }
    }

    pub fn transport_fn(self) -> TransportFn {
        TRANSPORT_TABLE[self.index()]
    }

    #[inline]
    pub fn transport(self, position: DVec2, velocity: DVec2, dims: DVec2) -> Transport {
        (self.transport_fn())(position, velocity, dims)
    }

    /// Axes `(x, y)` along which pair separations use the minimum-image convention.
    pub fn minimum_image_axes(self) -> (bool, bool) {
        match self {
            BoundaryMode::PeriodicXY | BoundaryMode::HoleInABoxWrapped => (true, true),
            BoundaryMode::PeriodicX => (true, false),
            BoundaryMode::HoleInABoxPeriodicY => (false, true),
            BoundaryMode::Closed | BoundaryMode::HoleInABox | BoundaryMode::Tube => (false, false),
        }
    }

    /// Reduces a raw separation `d = p_i - p_j` to the nearest periodic image.
    #[inline]
    pub fn minimum_image(self, d: DVec2, dims: DVec2) -> DVec2 {
        let (wrap_x, wrap_y) = self.minimum_image_axes();
        let mut out = d;
        if wrap_x && out.x.abs() > 0.5 * dims.x {
            out.x -= dims.x.copysign(out.x);
        }
        if wrap_y && out.y.abs() > 0.5 * dims.y {
            out.y -= dims.y.copysign(out.y);
        }
        out
    }
}

impl std::fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============ Per-axis building blocks ============

/// Forces a non-negative component and records the momentum handed over.
#[inline]
fn reflect_up(v: &mut f64, flux: &mut f64) {
    let reflected = v.abs();
    *flux += (reflected - *v).abs();
    *v = reflected;
}

/// Forces a non-positive component and records the momentum handed over.
#[inline]
fn reflect_down(v: &mut f64, flux: &mut f64) {
    let reflected = -v.abs();
    *flux += (reflected - *v).abs();
    *v = reflected;
}

#[inline]
fn reflect_axis(p: f64, v: &mut f64, flux: &mut f64, length: f64) {
    if p < 0.0 {
        reflect_up(v, flux);
    }
    if p > length {
        reflect_down(v, flux);
    }
}

#[inline]
fn in_hole_window(y: f64, ly: f64) -> bool {
    y > HOLE_WINDOW_LOW * ly && y < HOLE_WINDOW_HIGH * ly
}

/// Right-edge behaviour shared by the reflective hole-in-a-box variants.
#[inline]
fn hole_right_edge(p: DVec2, v: &mut DVec2, flux: &mut DVec2, dims: DVec2) {
    if p.x <= dims.x {
        return;
    }
    if p.x < dims.x * GHOST_BAND_INNER {
        if !in_hole_window(p.y, dims.y) {
            reflect_down(&mut v.x, &mut flux.x);
        }
    } else if p.x < dims.x * GHOST_BAND_OUTER {
        v.x = v.x.abs();
    }
}

// ============ Policies ============

pub fn transport_periodic_xy(position: DVec2, velocity: DVec2, dims: DVec2) -> Transport {
    Transport {
        position: DVec2::new(
            wrap_periodic(position.x, dims.x),
            wrap_periodic(position.y, dims.y),
        ),
        velocity,
        flux: DVec2::ZERO,
    }
}

pub fn transport_periodic_x(position: DVec2, velocity: DVec2, dims: DVec2) -> Transport {
    let mut v = velocity;
    let mut flux = DVec2::ZERO;
    reflect_axis(position.y, &mut v.y, &mut flux.y, dims.y);
    Transport {
        position: DVec2::new(wrap_periodic(position.x, dims.x), position.y),
        velocity: v,
        flux,
    }
}

pub fn transport_closed(position: DVec2, velocity: DVec2, dims: DVec2) -> Transport {
    let mut v = velocity;
    let mut flux = DVec2::ZERO;
    reflect_axis(position.x, &mut v.x, &mut flux.x, dims.x);
    reflect_axis(position.y, &mut v.y, &mut flux.y, dims.y);
    Transport {
        position,
        velocity: v,
        flux,
    }
}

pub fn transport_hole_in_a_box(position: DVec2, velocity: DVec2, dims: DVec2) -> Transport {
    let mut v = velocity;
    let mut flux = DVec2::ZERO;
    if position.x < 0.0 {
        reflect_up(&mut v.x, &mut flux.x);
    }
    hole_right_edge(position, &mut v, &mut flux, dims);
    reflect_axis(position.y, &mut v.y, &mut flux.y, dims.y);
    Transport {
        position,
        velocity: v,
        flux,
    }
}

pub fn transport_hole_in_a_box_periodic_y(
    position: DVec2,
    velocity: DVec2,
    dims: DVec2,
) -> Transport {
    let mut v = velocity;
    let mut flux = DVec2::ZERO;
    if position.x < 0.0 {
        reflect_up(&mut v.x, &mut flux.x);
    }
    hole_right_edge(position, &mut v, &mut flux, dims);
    Transport {
        position: DVec2::new(position.x, wrap_periodic(position.y, dims.y)),
        velocity: v,
        flux,
    }
}

pub fn transport_hole_in_a_box_wrapped(
    position: DVec2,
    velocity: DVec2,
    dims: DVec2,
) -> Transport {
    let mut p = position;
    let mut v = velocity;
    if p.x < 0.0 {
        p.x += dims.x;
    } else if p.x > dims.x {
        if p.x < dims.x * GHOST_BAND_INNER {
            if !in_hole_window(p.y, dims.y) {
                p.x -= dims.x;
            }
        } else if p.x < dims.x * GHOST_BAND_OUTER {
            v.x = v.x.abs();
        }
    }
    p.y = wrap_periodic(p.y, dims.y);
    Transport {
        position: p,
        velocity: v,
        flux: DVec2::ZERO,
    }
}

pub fn transport_tube(position: DVec2, velocity: DVec2, dims: DVec2) -> Transport {
    let mut p = position;
    let mut v = velocity;
    let mut flux = DVec2::ZERO;

    if p.x < 0.0 {
        let forced = v.x.abs().max(TUBE_FORCED_SPEED);
        flux.x += (forced - v.x).abs();
        v.x = forced;
    }
    if p.x > dims.x {
        let low = 0.5 * (1.0 - TUBE_WINDOW) * dims.y;
        let high = 0.5 * (1.0 + TUBE_WINDOW) * dims.y;
        if p.y > low && p.y < high {
            p.y = (p.y - 0.5 * dims.y) / TUBE_WINDOW + 0.5 * dims.y;
            p.x -= dims.x * TUBE_DISTANCE_PENALTY;
        } else {
            reflect_down(&mut v.x, &mut flux.x);
        }
    }
    reflect_axis(p.y, &mut v.y, &mut flux.y, dims.y);

    Transport {
        position: p,
        velocity: v,
        flux,
    }
}
