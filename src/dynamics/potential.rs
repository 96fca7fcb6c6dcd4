use glam::DVec2;

use crate::{core::Particle, utils::math::clamp_length};

/// Pairs closer than this (in units of sigma) have no defined direction and are skipped.
pub const MIN_PAIR_SEPARATION: f64 = 1e-9;

/// 12-6 pair potential with length scale `sigma` and well depth `epsilon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LennardJones {
    pub sigma: f64,
    pub epsilon: f64,
}

/// Force and energy of one pair at separation `r`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairTerm {
    /// Factor applied to the separation vector `d` to obtain the acceleration.
    pub coefficient: f64,
    pub potential: f64,
}

impl LennardJones {
    pub fn new(sigma: f64, epsilon: f64) -> Self {
        Self { sigma, epsilon }
    }

    /// `f(r) = 24 s s^6 (2 s^6 - 1)` with `s = sigma / r`.
    #[inline]
    pub fn force_magnitude(&self, r: f64) -> f64 {
        let s = self.sigma / r;
        let s3 = s * s * s;
        let s6 = s3 * s3;
        24.0 * s * s6 * (2.0 * s6 - 1.0)
    }

    /// `u(r) = 4 epsilon s^6 (s^6 - 1)`.
    #[inline]
    pub fn potential(&self, r: f64) -> f64 {
        let s = self.sigma / r;
        let s3 = s * s * s;
        let s6 = s3 * s3;
        4.0 * self.epsilon * s6 * (s6 - 1.0)
    }

    #[inline]
    pub fn evaluate(&self, r: f64) -> PairTerm {
        let s = self.sigma / r;
        let s3 = s * s * s;
        let s6 = s3 * s3;
        let force = 24.0 * s * s6 * (2.0 * s6 - 1.0);
        PairTerm {
            coefficient: force * s,
            potential: 4.0 * self.epsilon * s6 * (s6 - 1.0),
        }
    }

    /// Pair term for separation vector `d`, or `None` for coincident particles.
    #[inline]
    pub fn pair(&self, d: DVec2) -> Option<PairTerm> {
        let r = d.length();
        if r <= MIN_PAIR_SEPARATION * self.sigma {
            return None;
        }
        Some(self.evaluate(r))
    }

    /// Magnitude of the pair acceleration at `r`, i.e. `|coefficient(r) * r|`.
    pub fn acceleration_magnitude(&self, r: f64) -> f64 {
        (self.force_magnitude(r) * self.sigma).abs()
    }
}

/// Stability bound on per-particle acceleration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionGuard {
    pub max_acceleration: f64,
}

impl ExplosionGuard {
    /// Bound equal to the pair acceleration at `sigma * threshold`.
    pub fn new(potential: &LennardJones, threshold: f64) -> Self {
        Self {
            max_acceleration: potential.acceleration_magnitude(potential.sigma * threshold),
        }
    }

    #[inline]
    pub fn clamp(&self, acceleration: DVec2) -> DVec2 {
        if !acceleration.is_finite() {
            return DVec2::ZERO;
        }
        clamp_length(acceleration, self.max_acceleration)
    }

    /// Clamps every particle's acceleration in place; returns how many were limited.
    pub fn apply(&self, particles: &mut [Particle]) -> usize {
        let limit_sq = self.max_acceleration * self.max_acceleration;
        let mut clamped = 0;
        for p in particles.iter_mut() {
            let a = p.acceleration;
            if !a.is_finite() || a.length_squared() > limit_sq {
                p.acceleration = self.clamp(a);
                clamped += 1;
            }
        }
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn potential_crosses_zero_at_sigma() {
        let lj = LennardJones::new(1.0, 1.0);
        assert!(lj.potential(1.0).abs() < 1e-12);
        assert!(lj.potential(0.9) > 0.0);
        assert!(lj.potential(1.5) < 0.0);
    }

    #[test]
    fn force_is_repulsive_inside_the_minimum() {
        let lj = LennardJones::new(1.0, 1.0);
        let r_min = 2f64.powf(1.0 / 6.0);
        assert!(lj.force_magnitude(r_min).abs() < 1e-9);
        assert!(lj.force_magnitude(0.95) > 0.0);
        assert!(lj.force_magnitude(1.5) < 0.0);
    }

    #[test]
    fn coincident_pairs_are_skipped() {
        let lj = LennardJones::new(1.0, 1.0);
        assert!(lj.pair(DVec2::ZERO).is_none());
        assert!(lj.pair(DVec2::new(1.0, 0.0)).is_some());
    }

    #[test]
    fn guard_preserves_direction() {
        let lj = LennardJones::new(1.0, 1.0);
        let guard = ExplosionGuard::new(&lj, 0.8);
        let mut particles = vec![Particle::default(); 2];
        particles[0].acceleration = DVec2::new(1e9, -1e9);
        particles[1].acceleration = DVec2::new(1.0, 0.0);
        let clamped = guard.apply(&mut particles);
        assert_eq!(clamped, 1);
        let a0 = particles[0].acceleration;
        assert!((a0.length() - guard.max_acceleration).abs() < 1e-6);
        assert!((a0.normalize() - DVec2::new(1.0, -1.0).normalize()).length() < 1e-12);
        assert_eq!(particles[1].acceleration, DVec2::new(1.0, 0.0));
    }
}
