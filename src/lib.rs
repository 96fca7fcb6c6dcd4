//! Particle Ensemble – 2-D particle simulation for Rust.
//!
//! Two interchangeable physical models share one engine contract: a
//! molecular-dynamics model with a 12-6 pair potential integrated by
//! velocity-Verlet, and a hard-sphere model with elastic impulse collisions.
//! An orchestrator owns a [`Simulation`], initializes it from a
//! [`ConfigStore`], and calls [`SimulationEngine::update`] once per frame.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod stats;
pub mod utils;

pub use glam::DVec2;

pub use config::{ConfigStore, HardSphereParams, MdParams, MemoryStore};
pub use crate::core::{BoundaryMode, CollisionRecord, ModelKind, Particle, StatsMap};
pub use engine::{HardSphereEngine, MdEngine, Simulation, SimulationEngine};
pub use error::{Error, Result};
pub use gpu::{AcceleratedBackend, GpuParticle, NoopBackend, SoftwareBackend};
pub use utils::profiling::FrameProfile;
