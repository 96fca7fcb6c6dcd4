//! Adaptive step-size controllers.
//!
//! Both controllers are pure functions of the current kinematic extremes and
//! always return a finite, strictly positive step no larger than their cap.

use crate::core::Particle;

/// Regularizes the MD denominator when the ensemble is at rest.
pub const MD_DENOMINATOR_EPSILON: f64 = 1e-12;
/// Speed added to the hard-sphere maximum so a resting ensemble has a finite step.
pub const HARD_SPHERE_SPEED_EPSILON: f64 = 1e-4;

/// Largest speed and acceleration magnitude over the ensemble.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicExtremes {
    pub max_speed: f64,
    pub max_acceleration: f64,
}

impl KinematicExtremes {
    pub fn of(particles: &[Particle]) -> Self {
        let (v2, a2) = particles.iter().fold((0.0f64, 0.0f64), |(v2, a2), p| {
            (
                v2.max(p.velocity.length_squared()),
                a2.max(p.acceleration.length_squared()),
            )
        });
        Self {
            max_speed: v2.sqrt(),
            max_acceleration: a2.sqrt(),
        }
    }
}

fn checked(dt: f64) -> f64 {
    assert!(
        dt.is_finite() && dt > 0.0,
        "adaptive timestep produced a non-positive step: {dt}"
    );
    dt
}

/// `min(dt_max, path_threshold * l_min / (2 sqrt(|a|max) + |v|max + eps))`.
pub fn md_adaptive_dt(
    extremes: KinematicExtremes,
    l_min: f64,
    path_threshold: f64,
    dt_max: f64,
) -> f64 {
    let denominator =
        2.0 * extremes.max_acceleration.sqrt() + extremes.max_speed + MD_DENOMINATOR_EPSILON;
    checked((path_threshold * l_min / denominator).min(dt_max))
}

/// `min(radius / (|v|max + eps), dt_max) * multiplier`, never above `dt_max`.
pub fn hard_sphere_adaptive_dt(max_speed: f64, radius: f64, dt_max: f64, multiplier: f64) -> f64 {
    let dt = (radius / (max_speed + HARD_SPHERE_SPEED_EPSILON)).min(dt_max) * multiplier;
    checked(dt.min(dt_max))
}
