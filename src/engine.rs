//! Engine contract shared by both physical models and the tagged variant
//! that an orchestrator owns.

pub mod hard_sphere;
pub mod md;

pub use hard_sphere::HardSphereEngine;
pub use md::MdEngine;

use glam::DVec2;
use rand::{rng, rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::ConfigStore,
    core::{ModelKind, Particle, StatsMap},
    utils::profiling::FrameProfile,
};

/// Operations an orchestrator drives, identical across both models.
pub trait SimulationEngine {
    fn model(&self) -> ModelKind;

    /// Rebuilds all state from `store`, substituting defaults for anything
    /// missing or malformed. The engine is left paused.
    fn initialize(&mut self, store: &mut dyn ConfigStore);

    /// Runs one frame of sub-steps when running, then publishes statistics.
    fn update(&mut self);

    /// Clears the per-frame accumulators; cumulative metrics are kept.
    fn reset_stats(&mut self);

    fn is_running(&self) -> bool;
    fn set_running(&mut self, running: bool);

    fn particle_count(&self) -> usize;
    fn dt(&self) -> f64;
    fn dims(&self) -> DVec2;
    fn particles(&self) -> &[Particle];
    fn stats(&self) -> &StatsMap;
    fn profile(&self) -> &FrameProfile;

    /// Requests the accelerated path; models without one ignore the request.
    fn set_gpu_enabled(&mut self, enabled: bool);
    fn gpu_enabled(&self) -> bool;

    /// Toggles the rayon passes; a no-op without the `parallel` feature.
    fn set_parallel_enabled(&mut self, enabled: bool);
    fn parallel_enabled(&self) -> bool;
}

/// Explicit simulation context: exactly one model, chosen at configuration time.
pub enum Simulation {
    MolecularDynamics(MdEngine),
    HardSphere(HardSphereEngine),
}

impl Simulation {
    pub fn new(kind: ModelKind) -> Self {
        match kind {
            ModelKind::MolecularDynamics => Simulation::MolecularDynamics(MdEngine::new()),
            ModelKind::HardSphere => Simulation::HardSphere(HardSphereEngine::new()),
        }
    }

    /// Builds the model and initializes it from `store` in one go.
    pub fn from_config(kind: ModelKind, store: &mut dyn ConfigStore) -> Self {
        let mut sim = Self::new(kind);
        sim.initialize(store);
        sim
    }

    pub fn engine(&self) -> &dyn SimulationEngine {
        match self {
            Simulation::MolecularDynamics(e) => e,
            Simulation::HardSphere(e) => e,
        }
    }

    pub fn engine_mut(&mut self) -> &mut dyn SimulationEngine {
        match self {
            Simulation::MolecularDynamics(e) => e,
            Simulation::HardSphere(e) => e,
        }
    }
}

impl SimulationEngine for Simulation {
    fn model(&self) -> ModelKind {
        self.engine().model()
    }

    fn initialize(&mut self, store: &mut dyn ConfigStore) {
        self.engine_mut().initialize(store);
    }

    fn update(&mut self) {
        self.engine_mut().update();
    }

    fn reset_stats(&mut self) {
        self.engine_mut().reset_stats();
    }

    fn is_running(&self) -> bool {
        self.engine().is_running()
    }

    fn set_running(&mut self, running: bool) {
        self.engine_mut().set_running(running);
    }

    fn particle_count(&self) -> usize {
        self.engine().particle_count()
    }

    fn dt(&self) -> f64 {
        self.engine().dt()
    }

    fn dims(&self) -> DVec2 {
        self.engine().dims()
    }

    fn particles(&self) -> &[Particle] {
        self.engine().particles()
    }

    fn stats(&self) -> &StatsMap {
        self.engine().stats()
    }

    fn profile(&self) -> &FrameProfile {
        self.engine().profile()
    }

    fn set_gpu_enabled(&mut self, enabled: bool) {
        self.engine_mut().set_gpu_enabled(enabled);
    }

    fn gpu_enabled(&self) -> bool {
        self.engine().gpu_enabled()
    }

    fn set_parallel_enabled(&mut self, enabled: bool) {
        self.engine_mut().set_parallel_enabled(enabled);
    }

    fn parallel_enabled(&self) -> bool {
        self.engine().parallel_enabled()
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => SeedableRng::seed_from_u64(s),
        None => SeedableRng::seed_from_u64(rng().random()),
    }
}

pub(crate) fn uniform_velocity(rng: &mut StdRng, max_speed: f64) -> DVec2 {
    if max_speed <= 0.0 {
        return DVec2::ZERO;
    }
    DVec2::new(
        rng.random_range(-max_speed..=max_speed),
        rng.random_range(-max_speed..=max_speed),
    )
}
