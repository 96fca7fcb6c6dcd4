use std::time::Instant;

use glam::DVec2;
use log::{debug, warn};

use crate::{
    config::{ConfigStore, MdParams, FRAME_BUDGET_MS},
    core::{ModelKind, Particle, StatsMap},
    dynamics::{
        integrator::{accumulate_accelerations, velocity_verlet_step, PairContext, SubstepOutcome},
        potential::{ExplosionGuard, LennardJones},
        timestep::{md_adaptive_dt, KinematicExtremes},
    },
    engine::{seeded_rng, uniform_velocity, SimulationEngine},
    error::{Error, Result},
    gpu::{AcceleratedBackend, GpuCounters, GpuParticle, KernelParams, NoopBackend},
    stats::{md_stats, MdAccumulators, MdCollisionCounters},
    utils::{
        logging::{warn_if_frame_budget_exceeded, ScopedTimer},
        profiling::{FrameProfile, ProfileTimer},
    },
};

/// Continuous 12-6 potential model integrated with velocity-Verlet.
pub struct MdEngine {
    params: MdParams,
    particles: Vec<Particle>,
    dt: f64,
    elapsed: f64,
    running: bool,
    parallel_enabled: bool,
    pair: PairContext,
    guard: ExplosionGuard,
    accumulators: MdAccumulators,
    collisions: MdCollisionCounters,
    stats: StatsMap,
    profile: FrameProfile,
    backend: Box<dyn AcceleratedBackend>,
    gpu_active: bool,
    device_mirror: Vec<GpuParticle>,
}

impl Default for MdEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Column-major grid of `grid_rows` rows starting near the origin.
pub fn grid_placement(params: &MdParams) -> Vec<DVec2> {
    let rows = params.grid_rows.max(1);
    let ax = params.lx / rows as f64;
    let ay = params.ly / rows as f64;
    (0..params.particle_count)
        .map(|i| {
            let (ix, iy) = (i / rows, i % rows);
            DVec2::new(
                ax * (ix as f64 + 0.5) * params.init_position_scale,
                ay * (iy as f64 + 0.5) * params.init_position_scale,
            )
        })
        .collect()
}

impl MdEngine {
    /// Paused, empty engine; call [`SimulationEngine::initialize`] to populate it.
    pub fn new() -> Self {
        let params = MdParams::default();
        let potential = LennardJones::new(params.sigma, params.epsilon);
        Self {
            pair: PairContext::new(potential, params.boundary, params.dims()),
            guard: ExplosionGuard::new(&potential, params.explosion_threshold),
            dt: params.dt,
            params,
            particles: Vec::new(),
            elapsed: 0.0,
            running: false,
            parallel_enabled: cfg!(feature = "parallel"),
            accumulators: MdAccumulators::default(),
            collisions: MdCollisionCounters::default(),
            stats: StatsMap::new(),
            profile: FrameProfile::default(),
            backend: Box::new(NoopBackend::new()),
            gpu_active: false,
            device_mirror: Vec::new(),
        }
    }

    /// Builds a grid-initialized engine from validated parameters.
    pub fn with_params(params: MdParams) -> Result<Self> {
        params.validate()?;
        let mut engine = Self::new();
        engine.rebuild(params);
        Ok(engine)
    }

    /// Builds an engine over caller-supplied particles; `particle_count` follows the list.
    pub fn from_particles(mut params: MdParams, particles: Vec<Particle>) -> Result<Self> {
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
        engine.particles = particles;
        engine.reset_state();
        Ok(engine)
    }

    /// Replaces the accelerated backend; any active accelerated run is stopped first.
    pub fn set_backend<B>(&mut self, backend: B)
    where
        B: AcceleratedBackend + 'static,
    {
        if self.gpu_active {
            self.disable_gpu();
        }
        self.backend = Box::new(backend);
        if self.params.gpu {
            self.enable_gpu();
        }
    }

    pub fn with_backend<B>(mut self, backend: B) -> Self
    where
        B: AcceleratedBackend + 'static,
    {
        self.set_backend(backend);
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn params(&self) -> &MdParams {
        &self.params
    }

    /// Bound applied to every acceleration after the pair pass.
    pub fn max_acceleration(&self) -> f64 {
        self.guard.max_acceleration
    }

    /// Cumulative contact counters since the last (re)initialization.
    pub fn collision_counters(&self) -> &MdCollisionCounters {
        &self.collisions
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    fn rebuild(&mut self, params: MdParams) {
        let mut rng = seeded_rng(params.seed);
        self.particles = grid_placement(&params)
            .into_iter()
            .map(|position| {
                Particle::new(position, uniform_velocity(&mut rng, params.max_init_speed))
            })
            .collect();
        self.params = params;
        self.reset_state();
    }

    /// Derives the cached pair model from `params` and clears every counter.
    fn reset_state(&mut self) {
        // Device contents belong to the discarded state; no readback.
        self.gpu_active = false;
        self.device_mirror.clear();
        let potential = LennardJones::new(self.params.sigma, self.params.epsilon);
        self.pair = PairContext::new(potential, self.params.boundary, self.params.dims());
        self.guard = ExplosionGuard::new(&potential, self.params.explosion_threshold);
        self.dt = self.params.dt;
        self.elapsed = 0.0;
        self.running = false;
        self.accumulators = MdAccumulators::default();
        self.collisions = MdCollisionCounters::default();
        self.stats.clear();
        self.profile.reset();

        // The first half-kick needs the accelerations of the initial state.
        accumulate_accelerations(&mut self.particles, &self.pair);
        self.guard.apply(&mut self.particles);

        if self.params.gpu {
            self.enable_gpu();
        }
    }

    fn kernel_params(&self) -> KernelParams {
        KernelParams::new(
            self.particles.len(),
            self.params.dims(),
            self.dt,
            self.params.sigma,
            self.params.epsilon,
            self.guard.max_acceleration,
            self.params.boundary,
        )
    }

    fn enable_gpu(&mut self) {
        if self.gpu_active {
            return;
        }
        let n = self.particles.len();
        self.device_mirror = self.particles.iter().map(GpuParticle::from).collect();
        let started = self
            .backend
            .build(n)
            .and_then(|()| self.backend.upload(&self.device_mirror));
        match started {
            Ok(()) => {
                self.gpu_active = true;
                debug!("accelerated path active on {}", self.backend.name());
            }
            Err(e) => {
                warn!("accelerated path unavailable, staying on CPU: {e}");
                self.device_mirror.clear();
            }
        }
    }

    fn disable_gpu(&mut self) {
        if !self.gpu_active {
            return;
        }
        if let Err(e) = self.sync_from_device() {
            warn!("final readback from {} failed: {e}", self.backend.name());
        }
        self.gpu_active = false;
        self.device_mirror.clear();
    }

    fn sync_from_device(&mut self) -> Result<GpuCounters> {
        let counters = self.backend.readback(&mut self.device_mirror)?;
        for (host, device) in self.particles.iter_mut().zip(&self.device_mirror) {
            *host = device.to_particle();
        }
        Ok(counters)
    }

    fn gpu_substep(&mut self) -> Result<SubstepOutcome> {
        let _timer = ScopedTimer::new("md::gpu");
        let kp = self.kernel_params();
        self.backend.dispatch_prestep(&kp)?;
        self.backend.dispatch_accel(&kp)?;
        self.backend.dispatch_reduce(&kp)?;
        self.backend.dispatch_integrate(&kp)?;
        let counters = self.sync_from_device()?;
        Ok(SubstepOutcome {
            potential: f64::from(counters.potential),
            flux: counters.flux(),
            clamped: 0,
        })
    }

    fn cpu_substep(&mut self) -> SubstepOutcome {
        let _timer = ScopedTimer::new("md::integrate");
        velocity_verlet_step(
            &mut self.particles,
            &self.pair,
            &self.guard,
            self.dt,
            self.parallel_enabled,
        )
    }

    fn adapt_timestep(&mut self) {
        let _t = ProfileTimer::new(&mut self.profile.adapt_time);
        self.dt = md_adaptive_dt(
            KinematicExtremes::of(&self.particles),
            self.params.lx.min(self.params.ly),
            self.params.path_threshold,
            self.params.dt_max,
        );
    }

    fn substep(&mut self) {
        // The step is sized from the state it is about to integrate.
        if self.params.adaptive_timestep {
            self.adapt_timestep();
        }
        let dt = self.dt;
        let started = Instant::now();
        let device_outcome = if self.gpu_active {
            match self.gpu_substep() {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    // Host state still holds the last successful readback.
                    warn!("accelerated sub-step failed, falling back to CPU: {e}");
                    self.gpu_active = false;
                    self.device_mirror.clear();
                    None
                }
            }
        } else {
            None
        };
        let outcome = device_outcome.unwrap_or_else(|| self.cpu_substep());
        self.profile.integrate_time += started.elapsed();

        if outcome.clamped > 0 {
            log::trace!("explosion guard clamped {} accelerations", outcome.clamped);
        }

        {
            let _t = ProfileTimer::new(&mut self.profile.stats_time);
            self.accumulators
                .sample(&self.particles, &outcome, dt, self.params.dims());
        }
        {
            let _t = ProfileTimer::new(&mut self.profile.resolve_time);
            self.collisions.count(
                &self.particles,
                self.params.boundary,
                self.params.dims(),
                self.params.sigma,
                self.params.collision_radius_threshold,
            );
        }

        self.elapsed += dt;
    }
}

impl SimulationEngine for MdEngine {
    fn model(&self) -> ModelKind {
        ModelKind::MolecularDynamics
    }

    fn initialize(&mut self, store: &mut dyn ConfigStore) {
        let params = MdParams::load(store);
        debug!(
            "initializing {} with N={} domain={}x{} dt={} boundary={}",
            self.model().name(),
            params.particle_count,
            params.lx,
            params.ly,
            params.dt,
            params.boundary
        );
        self.rebuild(params);
    }

    fn update(&mut self) {
        if !self.running {
            return;
        }
        assert!(!self.particles.is_empty(), "update() on an engine without particles");

        let frame_start = Instant::now();
        let substeps = self.params.substeps;
        self.profile.reset();
        self.profile.particle_count = self.particles.len();
        self.profile.substeps = substeps;

        for _ in 0..substeps {
            self.substep();
        }

        {
            let _t = ProfileTimer::new(&mut self.profile.stats_time);
            self.stats = md_stats(
                &self.accumulators,
                &self.collisions,
                self.particles.len(),
                self.params.dims(),
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
        self.accumulators.reset();
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
        self.params.gpu = enabled;
        if enabled {
            self.enable_gpu();
        } else {
            self.disable_gpu();
        }
    }

    fn gpu_enabled(&self) -> bool {
        self.gpu_active
    }

    fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled && cfg!(feature = "parallel");
    }

    fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }
}
