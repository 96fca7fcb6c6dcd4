use glam::DVec2;

use crate::{
    config::HardSphereParams,
    core::{CollisionRecord, Particle},
    utils::math::normalize_or_x,
};

/// Geometry shared by contact discovery, impulse resolution, and depenetration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeometry {
    pub radius: f64,
    pub dims: DVec2,
    pub wrap_x: bool,
    pub wrap_y: bool,
}

impl ContactGeometry {
    pub fn new(radius: f64, dims: DVec2, wrap_x: bool, wrap_y: bool) -> Self {
        Self {
            radius,
            dims,
            wrap_x,
            wrap_y,
        }
    }

    pub fn from_params(params: &HardSphereParams) -> Self {
        Self::new(params.radius, params.dims(), params.wrap_x, params.wrap_y)
    }

    /// Squared contact distance between two discs.
    #[inline]
    pub fn diameter_sq(&self) -> f64 {
        let diameter = 2.0 * self.radius;
        diameter * diameter
    }
}

/// Collects every contact of particle `index` into `out`; returns whether any was found.
///
/// Particle contacts come first in index order, followed by at most one wall
/// per non-wrapped axis.
pub fn find_contacts_into(
    out: &mut Vec<CollisionRecord>,
    index: usize,
    particles: &[Particle],
    geometry: &ContactGeometry,
) -> bool {
    out.clear();
    let p = particles[index].position;
    let limit = geometry.diameter_sq();

    for (j, other) in particles.iter().enumerate() {
        if j == index {
            continue;
        }
        let d = other.position - p;
        if d.length_squared() > limit {
            continue;
        }
        out.push(CollisionRecord::particle(j, p + 0.5 * d, normalize_or_x(d)));
    }

    let r = geometry.radius;
    if !geometry.wrap_x {
        if p.x - r < 0.0 {
            out.push(CollisionRecord::wall(DVec2::new(0.0, p.y), DVec2::NEG_X));
        } else if p.x + r > geometry.dims.x {
            out.push(CollisionRecord::wall(DVec2::new(geometry.dims.x, p.y), DVec2::X));
        }
    }
    if !geometry.wrap_y {
        if p.y - r < 0.0 {
            out.push(CollisionRecord::wall(DVec2::new(p.x, 0.0), DVec2::NEG_Y));
        } else if p.y + r > geometry.dims.y {
            out.push(CollisionRecord::wall(DVec2::new(p.x, geometry.dims.y), DVec2::Y));
        }
    }

    !out.is_empty()
}

/// Allocating convenience wrapper around [`find_contacts_into`].
pub fn find_contacts(
    index: usize,
    particles: &[Particle],
    geometry: &ContactGeometry,
) -> Vec<CollisionRecord> {
    let mut out = Vec::new();
    find_contacts_into(&mut out, index, particles, geometry);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> ContactGeometry {
        ContactGeometry::new(0.5, DVec2::new(10.0, 10.0), false, false)
    }

    #[test]
    fn touching_discs_are_in_contact() {
        let particles = vec![
            Particle::new(DVec2::new(4.0, 5.0), DVec2::ZERO),
            Particle::new(DVec2::new(4.9, 5.0), DVec2::ZERO),
            Particle::new(DVec2::new(6.5, 5.0), DVec2::ZERO),
        ];
        let contacts = find_contacts(0, &particles, &geometry());
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].other, Some(1));
        assert!((contacts[0].normal - DVec2::X).length() < 1e-12);
        assert!((contacts[0].point - DVec2::new(4.45, 5.0)).length() < 1e-12);
    }

    #[test]
    fn walls_are_reported_on_closed_axes_only() {
        let particles = vec![Particle::new(DVec2::new(0.2, 9.8), DVec2::ZERO)];
        let contacts = find_contacts(0, &particles, &geometry());
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().all(CollisionRecord::is_wall));
        assert_eq!(contacts[0].normal, DVec2::NEG_X);
        assert_eq!(contacts[1].normal, DVec2::Y);

        let wrapped = ContactGeometry {
            wrap_x: true,
            wrap_y: true,
            ..geometry()
        };
        assert!(find_contacts(0, &particles, &wrapped).is_empty());
    }
}
