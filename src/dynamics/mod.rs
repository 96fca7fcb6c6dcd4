//! Pair potential, integrators, and step-size control.

pub mod integrator;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod potential;
pub mod timestep;

pub use integrator::{
    accumulate_accelerations, drift_and_wrap, velocity_verlet_step, PairContext, SubstepOutcome,
};
pub use potential::{ExplosionGuard, LennardJones, PairTerm};
pub use timestep::{hard_sphere_adaptive_dt, md_adaptive_dt, KinematicExtremes};
