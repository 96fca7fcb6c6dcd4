use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Named scalar metrics published after every frame.
pub type StatsMap = BTreeMap<String, f64>;

/// Kinematic state of one particle. Identity is the index in the owning store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: DVec2,
    pub velocity: DVec2,
    /// Only meaningful for the molecular-dynamics model.
    pub acceleration: DVec2,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
        }
    }
}

impl Particle {
    pub fn new(position: DVec2, velocity: DVec2) -> Self {
        Self {
            position,
            velocity,
            acceleration: DVec2::ZERO,
        }
    }

    /// Kinetic energy per unit mass, `|v|^2 / 2`.
    #[inline]
    pub fn specific_kinetic_energy(&self) -> f64 {
        0.5 * self.velocity.length_squared()
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.acceleration.is_finite()
    }
}

/// Transient contact produced by one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRecord {
    /// Index of the counterpart particle, `None` for a domain wall.
    pub other: Option<usize>,
    pub point: DVec2,
    /// Unit normal pointing from the particle towards the counterpart.
    pub normal: DVec2,
}

impl CollisionRecord {
    pub fn particle(other: usize, point: DVec2, normal: DVec2) -> Self {
        Self {
            other: Some(other),
            point,
            normal,
        }
    }

    pub fn wall(point: DVec2, normal: DVec2) -> Self {
        Self {
            other: None,
            point,
            normal,
        }
    }

    #[inline]
    pub fn is_wall(&self) -> bool {
        self.other.is_none()
    }
}

/// The two interchangeable physical models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Continuous 12-6 pair potential integrated with velocity-Verlet.
    MolecularDynamics,
    /// Discrete elastic collisions between discs of fixed radius.
    HardSphere,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::MolecularDynamics => "molecular-dynamics",
            ModelKind::HardSphere => "hard-sphere",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_kinetic_energy_is_half_speed_squared() {
        let p = Particle::new(DVec2::ZERO, DVec2::new(3.0, 4.0));
        assert!((p.specific_kinetic_energy() - 12.5).abs() < 1e-12);
    }

    #[test]
    fn wall_records_have_no_counterpart() {
        let wall = CollisionRecord::wall(DVec2::ZERO, DVec2::NEG_X);
        let other = CollisionRecord::particle(3, DVec2::ONE, DVec2::X);
        assert!(wall.is_wall());
        assert_eq!(other.other, Some(3));
        assert!(!other.is_wall());
    }
}
