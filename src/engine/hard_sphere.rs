use std::time::Instant;

use glam::DVec2;
use log::debug;
use rand::Rng;

use crate::{
    collision::{contact::ContactGeometry, depenetration::Depenetrator, response},
    config::{ConfigStore, HardSphereParams, FRAME_BUDGET_MS},
    core::{ModelKind, Particle, StatsMap},
    dynamics::{integrator::drift_and_wrap, timestep::hard_sphere_adaptive_dt, KinematicExtremes},
    engine::{seeded_rng, uniform_velocity, SimulationEngine},
    error::{Error, Result},
    stats::{hard_sphere_stats, CollisionTally},
    utils::{
        logging::{warn_if_frame_budget_exceeded, ScopedTimer},
        profiling::{FrameProfile, ProfileTimer},
    },
};

/// Discs of fixed radius exchanging instantaneous elastic impulses.
pub struct HardSphereEngine {
    params: HardSphereParams,
    particles: Vec<Particle>,
    /// State at the start of the current sub-step; contact resolution reads only this.
    snapshot: Vec<Particle>,
    dt: f64,
    elapsed: f64,
    running: bool,
    parallel_enabled: bool,
    geometry: ContactGeometry,
    depenetrator: Depenetrator,
    frame_tally: CollisionTally,
    max_tally: CollisionTally,
    stats: StatsMap,
    profile: FrameProfile,
}

impl Default for HardSphereEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HardSphereEngine {
    pub fn new() -> Self {
        let params = HardSphereParams::default();
        Self {
            geometry: ContactGeometry::from_params(&params),
            depenetrator: Depenetrator::new(params.depenetration_steps, params.depenetration_bias),
            dt: params.dt,
            params,
            particles: Vec::new(),
            snapshot: Vec::new(),
            elapsed: 0.0,
            running: false,
            parallel_enabled: cfg!(feature = "parallel"),
            frame_tally: CollisionTally::default(),
            max_tally: CollisionTally::default(),
            stats: StatsMap::new(),
            profile: FrameProfile::default(),
        }
    }

    pub fn with_params(params: HardSphereParams) -> Result<Self> {
        params.validate()?;
        let mut engine = Self::new();
        engine.rebuild(params);
        Ok(engine)
    }

    /// Builds an engine over caller-supplied discs; initial overlaps are removed.
    pub fn from_particles(mut params: HardSphereParams, particles: Vec<Particle>) -> Result<Self> {
        if particles.is_empty() {
            return Err(Error::InvalidParam(
                "at least one particle is required".to_string(),
            ));
        }
        if let Some(bad) = particles.iter().position(|p| !p.is_finite()) {
            return Err(Error::InvalidParam(format!(
                "particle {bad} has a non-finite component"
            )));
        }
        params.particle_count = particles.len();
        params.validate()?;

        let mut engine = Self::new();
        engine.params = params;
        engine.particles = particles
            .into_iter()
            .map(|p| Particle::new(p.position, p.velocity))
            .collect();
        engine.reset_state();
        Ok(engine)
    }

    pub fn params(&self) -> &HardSphereParams {
        &self.params
    }

    /// Running maxima of the per-frame simultaneous-contact tallies.
    pub fn collision_maxima(&self) -> &CollisionTally {
        &self.max_tally
    }

    /// Tallies of the frame in progress.
    pub fn frame_tally(&self) -> &CollisionTally {
        &self.frame_tally
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    fn rebuild(&mut self, params: HardSphereParams) {
        let mut rng = seeded_rng(params.seed);
        let (half_x, half_y) = (0.5 * params.lx, 0.5 * params.ly);
        self.particles = (0..params.particle_count)
            .map(|_| {
                let position = DVec2::new(
                    rng.random_range(0.0..=half_x),
                    rng.random_range(0.0..=half_y),
                );
                Particle::new(position, uniform_velocity(&mut rng, params.max_init_speed))
            })
            .collect();
        self.params = params;
        self.reset_state();
    }

    fn reset_state(&mut self) {
        self.geometry = ContactGeometry::from_params(&self.params);
        self.depenetrator =
            Depenetrator::new(self.params.depenetration_steps, self.params.depenetration_bias);
        self.dt = self.params.dt;
        self.elapsed = 0.0;
        self.running = false;
        self.frame_tally = CollisionTally::default();
        self.max_tally = CollisionTally::default();
        self.stats.clear();
        self.profile.reset();

        self.depenetrator.resolve(&mut self.particles, &self.geometry);
        self.snapshot.clone_from(&self.particles);
    }

    fn interact(&mut self) {
        let _timer = ScopedTimer::new("hs::interact");
        self.snapshot.clone_from(&self.particles);
        let resolve_all = self.params.resolve_all_contacts;

        #[cfg(feature = "parallel")]
        if self.parallel_enabled {
            crate::dynamics::parallel::interact(
                &mut self.particles,
                &self.snapshot,
                &self.geometry,
                resolve_all,
                &mut self.frame_tally,
            );
            return;
        }

        response::interact(
            &mut self.particles,
            &self.snapshot,
            &self.geometry,
            resolve_all,
            &mut self.frame_tally,
        );
    }

    fn substep(&mut self) {
        {
            let started = Instant::now();
            self.interact();
            let _timer = ScopedTimer::new("hs::depenetrate");
            self.depenetrator.resolve(&mut self.particles, &self.geometry);
            self.profile.resolve_time += started.elapsed();
        }

        if self.params.adaptive_timestep {
            let _t = ProfileTimer::new(&mut self.profile.adapt_time);
            self.dt = hard_sphere_adaptive_dt(
                KinematicExtremes::of(&self.particles).max_speed,
                self.params.radius,
                self.params.dt_max,
                self.params.ats_multiplier,
            );
        }

        {
            let _t = ProfileTimer::new(&mut self.profile.integrate_time);
            let _timer = ScopedTimer::new("hs::step");
            drift_and_wrap(
                &mut self.particles,
                self.dt,
                self.params.dims(),
                (self.params.wrap_x, self.params.wrap_y),
            );
        }
        self.elapsed += self.dt;
    }
}

impl SimulationEngine for HardSphereEngine {
    fn model(&self) -> ModelKind {
        ModelKind::HardSphere
    }

    fn initialize(&mut self, store: &mut dyn ConfigStore) {
        let params = HardSphereParams::load(store);
        debug!(
            "initializing {} with N={} domain={}x{} dt={} radius={} wrap=({}, {})",
            self.model().name(),
            params.particle_count,
            params.lx,
            params.ly,
            params.dt,
            params.radius,
            params.wrap_x,
            params.wrap_y
        );
        self.rebuild(params);
    }

    fn update(&mut self) {
        if !self.running {
            return;
        }
        assert!(!self.particles.is_empty(), "update() on an engine without particles");

        let frame_start = Instant::now();
        self.profile.reset();
        self.profile.particle_count = self.particles.len();
        self.profile.substeps = self.params.substeps;

        for _ in 0..self.params.substeps {
            self.substep();
        }

        {
            let _t = ProfileTimer::new(&mut self.profile.stats_time);
            self.max_tally.max_with(&self.frame_tally);
            self.stats = hard_sphere_stats(
                &self.particles,
                self.params.mass,
                &self.max_tally,
                self.elapsed,
            );
        }
        self.reset_stats();
        self.profile.total_time = frame_start.elapsed();
        if warn_if_frame_budget_exceeded(self.profile.total_time, FRAME_BUDGET_MS) {
            debug!("{}", self.profile.report());
        }
    }

    fn reset_stats(&mut self) {
        self.frame_tally = CollisionTally::default();
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn dt(&self) -> f64 {
        self.dt
    }

    fn dims(&self) -> DVec2 {
        self.params.dims()
    }

    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn stats(&self) -> &StatsMap {
        &self.stats
    }

    fn profile(&self) -> &FrameProfile {
        &self.profile
    }

    fn set_gpu_enabled(&mut self, enabled: bool) {
        if enabled {
            debug!("{} has no accelerated path; request ignored", self.model().name());
        }
    }

    fn gpu_enabled(&self) -> bool {
        false
    }

    fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled && cfg!(feature = "parallel");
    }

    fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }
}
