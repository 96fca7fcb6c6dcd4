use crate::{
    collision::contact::{find_contacts_into, ContactGeometry},
    core::{CollisionRecord, Particle},
};

/// Bounded iterative positional correction, applied in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Depenetrator {
    pub max_passes: u32,
    /// Relative overshoot added to every correction.
    pub bias: f64,
}

impl Depenetrator {
    pub fn new(max_passes: u32, bias: f64) -> Self {
        Self { max_passes, bias }
    }

    /// Pushes every particle out of its neighbours and back inside the walls.
    ///
    /// A wall contact only moves the particle along the wall normal.
    ///
    /// Particles are corrected one at a time against the already-corrected
    /// positions of the others. Returns the number of correction passes run.
    pub fn resolve(&self, particles: &mut [Particle], geometry: &ContactGeometry) -> usize {
        if self.max_passes == 0 {
            return 0;
        }

        let mut contacts: Vec<CollisionRecord> = Vec::new();
        let mut passes = 0;
        let diameter = 2.0 * geometry.radius;
        let scale = 1.0 + self.bias;

        for i in 0..particles.len() {
            for _ in 0..self.max_passes {
                if !find_contacts_into(&mut contacts, i, particles, geometry) {
                    break;
                }
                passes += 1;
                for record in &contacts {
                    let position = particles[i].position;
                    particles[i].position = match record.other {
                        Some(j) => {
                            let depth = diameter - (particles[j].position - position).length();
                            position - record.normal * depth * scale
                        }
                        None => {
                            let target = record.point.dot(record.normal) - geometry.radius * scale;
                            position + record.normal * (target - position.dot(record.normal))
                        }
                    };
                }
            }
        }
        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    #[test]
    fn overlapping_pair_is_separated_to_contact_distance() {
        let geometry = ContactGeometry::new(0.5, DVec2::new(10.0, 10.0), false, false);
        let mut particles = vec![
            Particle::new(DVec2::new(5.0, 5.0), DVec2::ZERO),
            Particle::new(DVec2::new(5.4, 5.0), DVec2::ZERO),
        ];
        let passes = Depenetrator::new(5, 1e-6).resolve(&mut particles, &geometry);
        assert!(passes >= 1);
        let separation = (particles[1].position - particles[0].position).length();
        assert!(separation >= 1.0 - 1e-9);
    }

    #[test]
    fn wall_penetration_reseats_inside_the_box() {
        let geometry = ContactGeometry::new(0.5, DVec2::new(10.0, 10.0), false, false);
        let mut particles = vec![Particle::new(DVec2::new(-0.2, 9.9), DVec2::ZERO)];
        Depenetrator::new(5, 0.0).resolve(&mut particles, &geometry);
        let p = particles[0].position;
        assert!((p.x - 0.5).abs() < 1e-12);
        assert!((p.y - 9.5).abs() < 1e-12);
    }

    #[test]
    fn zero_passes_leave_positions_untouched() {
        let geometry = ContactGeometry::new(0.5, DVec2::new(10.0, 10.0), false, false);
        let mut particles = vec![
            Particle::new(DVec2::new(5.0, 5.0), DVec2::ZERO),
            Particle::new(DVec2::new(5.1, 5.0), DVec2::ZERO),
        ];
        let before = particles.clone();
        assert_eq!(Depenetrator::new(0, 0.0).resolve(&mut particles, &geometry), 0);
        assert_eq!(particles, before);
    }
}
