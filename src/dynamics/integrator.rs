use glam::DVec2;

use crate::{
    core::{BoundaryMode, Particle},
    dynamics::potential::{ExplosionGuard, LennardJones},
    utils::math::wrap_periodic,
};

/// Everything the pair pass needs besides the particles themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairContext {
    pub potential: LennardJones,
    pub boundary: BoundaryMode,
    pub dims: DVec2,
}

impl PairContext {
    pub fn new(potential: LennardJones, boundary: BoundaryMode, dims: DVec2) -> Self {
        Self {
            potential,
            boundary,
            dims,
        }
    }

    /// Boundary-aware separation `a - b`.
    #[inline]
    pub fn separation(&self, a: DVec2, b: DVec2) -> DVec2 {
        self.boundary.minimum_image(a - b, self.dims)
    }
}

/// Result of one velocity-Verlet sub-step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubstepOutcome {
    /// Potential energy of pairs that are both inside the primary domain.
    pub potential: f64,
    /// Reflection flux collected by the boundary policy, per axis.
    pub flux: DVec2,
    /// Particles whose acceleration hit the explosion bound.
    pub clamped: usize,
}

/// Zeroes all accelerations and accumulates the pair forces.
///
/// Pairs where either particle sits in the ghost band (`x > Lx`) are skipped.
/// Returns the potential energy of pairs with both `x < Lx`.
pub fn accumulate_accelerations(particles: &mut [Particle], ctx: &PairContext) -> f64 {
    for p in particles.iter_mut() {
        p.acceleration = DVec2::ZERO;
    }

    let lx = ctx.dims.x;
    let mut potential = 0.0;
    for i in 0..particles.len() {
        let (head, tail) = particles.split_at_mut(i + 1);
        let pi = &mut head[i];
        if pi.position.x > lx {
            continue;
        }
        for pj in tail.iter_mut() {
            if pj.position.x > lx {
                continue;
            }
            let d = ctx.separation(pi.position, pj.position);
            let Some(term) = ctx.potential.pair(d) else {
                continue;
            };
            pi.acceleration += term.coefficient * d;
            pj.acceleration -= term.coefficient * d;

            if pi.position.x < lx && pj.position.x < lx {
                potential += term.potential;
            }
        }
    }
    potential
}

#[cfg(feature = "parallel")]
fn acceleration_pass(particles: &mut [Particle], ctx: &PairContext, parallel: bool) -> f64 {
    if parallel {
        super::parallel::accumulate_accelerations(particles, ctx)
    } else {
        accumulate_accelerations(particles, ctx)
    }
}

#[cfg(not(feature = "parallel"))]
fn acceleration_pass(particles: &mut [Particle], ctx: &PairContext, _parallel: bool) -> f64 {
    accumulate_accelerations(particles, ctx)
}

/// One velocity-Verlet sub-step of the molecular-dynamics model.
///
/// Drift and first half-kick use the previous acceleration, the drifted state
/// goes through the boundary policy, accelerations are rebuilt and clamped,
/// and the second half-kick uses the new acceleration.
pub fn velocity_verlet_step(
    particles: &mut [Particle],
    ctx: &PairContext,
    guard: &ExplosionGuard,
    dt: f64,
    parallel: bool,
) -> SubstepOutcome {
    let dt2 = dt * dt;
    let transport = ctx.boundary.transport_fn();
    let mut flux = DVec2::ZERO;

    for p in particles.iter_mut() {
        let drifted = p.position + p.velocity * dt + 0.5 * p.acceleration * dt2;
        let kicked = p.velocity + 0.5 * p.acceleration * dt;
        let moved = transport(drifted, kicked, ctx.dims);
        p.position = moved.position;
        p.velocity = moved.velocity;
        flux += moved.flux;
    }

    let potential = acceleration_pass(particles, ctx, parallel);
    let clamped = guard.apply(particles);

    for p in particles.iter_mut() {
        p.velocity += 0.5 * p.acceleration * dt;
    }

    SubstepOutcome {
        potential,
        flux,
        clamped,
    }
}

/// Drift step of the hard-sphere model with optional per-axis wrap.
pub fn drift_and_wrap(particles: &mut [Particle], dt: f64, dims: DVec2, wrap: (bool, bool)) {
    for p in particles.iter_mut() {
        p.position += p.velocity * dt;
        if wrap.0 {
            p.position.x = wrap_periodic(p.position.x, dims.x);
        }
        if wrap.1 {
            p.position.y = wrap_periodic(p.position.y, dims.y);
        }
    }
}
