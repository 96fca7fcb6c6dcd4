//! Configuration defaults and typed parameter blocks for both engines.

pub mod store;

use glam::DVec2;
use serde::{Deserialize, Serialize};

pub use store::{read_checked, read_value, ConfigStore, ConfigValue, MemoryStore};

use crate::{
    core::BoundaryMode,
    error::{Error, Result},
};

/// Configuration section read by the molecular-dynamics engine.
pub const MD_SECTION: &str = "VERLET";
/// Configuration section read by the hard-sphere engine.
pub const HARD_SPHERE_SECTION: &str = "STEPPER";

/// Default particle count for both models.
pub const DEFAULT_PARTICLE_COUNT: usize = 10;
/// Default square domain edge length.
pub const DEFAULT_DOMAIN_SIZE: f64 = 1.0;
/// Wall-clock budget of one `update()` before a warning is logged.
pub const FRAME_BUDGET_MS: f32 = 16.7;

/// Default base timestep of the molecular-dynamics model.
pub const DEFAULT_MD_TIME_STEP: f64 = 0.0167;
/// Default MD sub-steps per frame.
pub const DEFAULT_MD_SUBSTEPS: u32 = 4;
pub const DEFAULT_SIGMA: f64 = 1.0;
pub const DEFAULT_EPSILON: f64 = 1.0;
/// Contact radius used for collision statistics, in units of sigma.
pub const DEFAULT_COLLISION_RADIUS_THRESHOLD: f64 = 0.95;
/// Scaling of the adaptive MD step relative to the smaller domain edge.
pub const DEFAULT_PATH_THRESHOLD: f64 = 0.00015;
/// Separation (in units of sigma) whose pair acceleration bounds every particle.
pub const DEFAULT_EXPLOSION_THRESHOLD: f64 = 0.8;
pub const DEFAULT_GRID_ROWS: usize = 2;
pub const DEFAULT_MD_MAX_INIT_SPEED: f64 = 0.5;
pub const DEFAULT_INIT_POSITION_SCALE: f64 = 0.5;

/// Default base timestep of the hard-sphere model.
pub const DEFAULT_HS_TIME_STEP: f64 = 0.016667;
/// Default hard-sphere sub-steps per frame.
pub const DEFAULT_HS_SUBSTEPS: u32 = 5;
pub const DEFAULT_PARTICLE_RADIUS: f64 = 0.1;
pub const DEFAULT_PARTICLE_MASS: f64 = 1.0;
pub const DEFAULT_HS_MAX_INIT_SPEED: f64 = 1.0;
pub const DEFAULT_DEPENETRATION_STEPS: u32 = 5;
pub const DEFAULT_DEPENETRATION_BIAS: f64 = 0.000001;
pub const DEFAULT_ATS_MULTIPLIER: f64 = 0.9;

fn positive(v: &f64) -> bool {
    v.is_finite() && *v > 0.0
}

fn non_negative(v: &f64) -> bool {
    v.is_finite() && *v >= 0.0
}

/// `(0, 1]`, for factors that may only shrink a capped quantity.
fn unit_fraction(v: &f64) -> bool {
    positive(v) && *v <= 1.0
}

fn seed_from(raw: i64) -> Option<u64> {
    u64::try_from(raw).ok()
}

fn seed_to_raw(seed: Option<u64>) -> i64 {
    seed.and_then(|s| i64::try_from(s).ok()).unwrap_or(-1)
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidParam(message.to_string()))
    }
}

/// Parameters of the molecular-dynamics model (section `VERLET`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdParams {
    pub particle_count: usize,
    pub lx: f64,
    pub ly: f64,
    /// Base step; also the step used when adaptation is disabled.
    pub dt: f64,
    /// Upper bound of the adaptive step.
    pub dt_max: f64,
    pub substeps: u32,
    pub adaptive_timestep: bool,
    pub gpu: bool,
    pub sigma: f64,
    pub epsilon: f64,
    pub collision_radius_threshold: f64,
    pub path_threshold: f64,
    pub boundary: BoundaryMode,
    pub explosion_threshold: f64,
    pub grid_rows: usize,
    pub max_init_speed: f64,
    pub init_position_scale: f64,
    /// `None` seeds the initial velocities from a non-deterministic source.
    pub seed: Option<u64>,
}

impl Default for MdParams {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            lx: DEFAULT_DOMAIN_SIZE,
            ly: DEFAULT_DOMAIN_SIZE,
            dt: DEFAULT_MD_TIME_STEP,
            dt_max: DEFAULT_MD_TIME_STEP,
            substeps: DEFAULT_MD_SUBSTEPS,
            adaptive_timestep: true,
            gpu: false,
            sigma: DEFAULT_SIGMA,
            epsilon: DEFAULT_EPSILON,
            collision_radius_threshold: DEFAULT_COLLISION_RADIUS_THRESHOLD,
            path_threshold: DEFAULT_PATH_THRESHOLD,
            boundary: BoundaryMode::default(),
            explosion_threshold: DEFAULT_EXPLOSION_THRESHOLD,
            grid_rows: DEFAULT_GRID_ROWS,
            max_init_speed: DEFAULT_MD_MAX_INIT_SPEED,
            init_position_scale: DEFAULT_INIT_POSITION_SCALE,
            seed: None,
        }
    }
}

impl MdParams {
    /// Reads every key of the `VERLET` section, repairing defects with defaults.
    pub fn load(store: &mut dyn ConfigStore) -> Self {
        let d = Self::default();
        let s = MD_SECTION;

        let boundary_index = read_checked(
            store,
            s,
            "edgeCondition",
            d.boundary.index() as i64,
            |v| BoundaryMode::from_index(*v).is_some(),
        );

        Self {
            particle_count: read_checked(store, s, "N", d.particle_count, |v| *v > 0),
            lx: read_checked(store, s, "Lx", d.lx, positive),
            ly: read_checked(store, s, "Ly", d.ly, positive),
            dt: read_checked(store, s, "dt", d.dt, positive),
            dt_max: read_checked(store, s, "dtMax", d.dt_max, positive),
            substeps: read_checked(store, s, "nAvg", d.substeps, |v| *v > 0),
            adaptive_timestep: read_value(store, s, "bUseAdaptiveTimeStep", d.adaptive_timestep),
            gpu: read_value(store, s, "bSimulateOnGPU", d.gpu),
            sigma: read_checked(store, s, "sigma", d.sigma, positive),
            epsilon: read_checked(store, s, "epsilon", d.epsilon, non_negative),
            collision_radius_threshold: read_checked(
                store,
                s,
                "collisionRadiusThreshold",
                d.collision_radius_threshold,
                positive,
            ),
            path_threshold: read_checked(store, s, "ATSPathThreshold", d.path_threshold, positive),
            boundary: BoundaryMode::from_index(boundary_index).unwrap_or_default(),
            explosion_threshold: read_checked(
                store,
                s,
                "explosionProtectionThreshold",
                d.explosion_threshold,
                positive,
            ),
            grid_rows: read_checked(store, s, "nRow", d.grid_rows, |v| *v > 0),
            max_init_speed: read_checked(store, s, "vMax", d.max_init_speed, non_negative),
            init_position_scale: read_checked(
                store,
                s,
                "initPosScale",
                d.init_position_scale,
                positive,
            ),
            seed: seed_from(read_value(store, s, "seed", seed_to_raw(d.seed))),
        }
    }

    pub fn dims(&self) -> DVec2 {
        DVec2::new(self.lx, self.ly)
    }

    /// Checks the same ranges `load` enforces, for programmatic construction.
    pub fn validate(&self) -> Result<()> {
        ensure(self.particle_count > 0, "particle count must be > 0")?;
        ensure(positive(&self.lx) && positive(&self.ly), "domain size must be finite and > 0")?;
        ensure(positive(&self.dt), "dt must be finite and > 0")?;
        ensure(positive(&self.dt_max), "dtMax must be finite and > 0")?;
        ensure(self.substeps > 0, "sub-steps per frame must be > 0")?;
        ensure(positive(&self.sigma), "sigma must be finite and > 0")?;
        ensure(non_negative(&self.epsilon), "epsilon must be finite and >= 0")?;
        ensure(
            positive(&self.collision_radius_threshold),
            "collision radius threshold must be > 0",
        )?;
        ensure(positive(&self.path_threshold), "path threshold must be > 0")?;
        ensure(positive(&self.explosion_threshold), "explosion threshold must be > 0")?;
        Ok(())
    }
}

/// Parameters of the hard-sphere model (section `STEPPER`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardSphereParams {
    pub particle_count: usize,
    pub lx: f64,
    pub ly: f64,
    pub dt: f64,
    pub dt_max: f64,
    pub wrap_x: bool,
    pub wrap_y: bool,
    pub radius: f64,
    pub mass: f64,
    pub substeps: u32,
    pub adaptive_timestep: bool,
    pub max_init_speed: f64,
    pub depenetration_steps: u32,
    pub depenetration_bias: f64,
    pub ats_multiplier: f64,
    /// Resolve every qualifying direct contact instead of only the first one.
    pub resolve_all_contacts: bool,
    pub seed: Option<u64>,
}

impl Default for HardSphereParams {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            lx: DEFAULT_DOMAIN_SIZE,
            ly: DEFAULT_DOMAIN_SIZE,
            dt: DEFAULT_HS_TIME_STEP,
            dt_max: DEFAULT_HS_TIME_STEP,
            wrap_x: false,
            wrap_y: false,
            radius: DEFAULT_PARTICLE_RADIUS,
            mass: DEFAULT_PARTICLE_MASS,
            substeps: DEFAULT_HS_SUBSTEPS,
            adaptive_timestep: true,
            max_init_speed: DEFAULT_HS_MAX_INIT_SPEED,
            depenetration_steps: DEFAULT_DEPENETRATION_STEPS,
            depenetration_bias: DEFAULT_DEPENETRATION_BIAS,
            ats_multiplier: DEFAULT_ATS_MULTIPLIER,
            resolve_all_contacts: false,
            seed: None,
        }
    }
}

impl HardSphereParams {
    /// Reads every key of the `STEPPER` section, repairing defects with defaults.
    pub fn load(store: &mut dyn ConfigStore) -> Self {
        let d = Self::default();
        let s = HARD_SPHERE_SECTION;

        Self {
            particle_count: read_checked(store, s, "N", d.particle_count, |v| *v > 0),
            lx: read_checked(store, s, "Lx", d.lx, positive),
            ly: read_checked(store, s, "Ly", d.ly, positive),
            dt: read_checked(store, s, "dt", d.dt, positive),
            dt_max: read_checked(store, s, "dtMax", d.dt_max, positive),
            wrap_x: read_value(store, s, "xWrap", d.wrap_x),
            wrap_y: read_value(store, s, "yWrap", d.wrap_y),
            radius: read_checked(store, s, "particleRadius", d.radius, positive),
            mass: read_checked(store, s, "particleMass", d.mass, positive),
            substeps: read_checked(store, s, "nAvg", d.substeps, |v| *v > 0),
            adaptive_timestep: read_value(store, s, "bUseAdaptiveTimeStep", d.adaptive_timestep),
            max_init_speed: read_checked(store, s, "maxRandV", d.max_init_speed, non_negative),
            depenetration_steps: read_value(store, s, "depenetrationSteps", d.depenetration_steps),
            depenetration_bias: read_checked(
                store,
                s,
                "depenetrationBonus",
                d.depenetration_bias,
                non_negative,
            ),
            ats_multiplier: read_checked(store, s, "ATSMultiplier", d.ats_multiplier, unit_fraction),
            resolve_all_contacts: read_value(
                store,
                s,
                "bResolveAllContacts",
                d.resolve_all_contacts,
            ),
            seed: seed_from(read_value(store, s, "seed", seed_to_raw(d.seed))),
        }
    }

    pub fn dims(&self) -> DVec2 {
        DVec2::new(self.lx, self.ly)
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.particle_count > 0, "particle count must be > 0")?;
        ensure(positive(&self.lx) && positive(&self.ly), "domain size must be finite and > 0")?;
        ensure(positive(&self.dt), "dt must be finite and > 0")?;
        ensure(positive(&self.dt_max), "dtMax must be finite and > 0")?;
        ensure(self.substeps > 0, "sub-steps per frame must be > 0")?;
        ensure(positive(&self.radius), "particle radius must be finite and > 0")?;
        ensure(positive(&self.mass), "particle mass must be finite and > 0")?;
        ensure(non_negative(&self.depenetration_bias), "depenetration bias must be >= 0")?;
        ensure(unit_fraction(&self.ats_multiplier), "ATS multiplier must be in (0, 1]")?;
        Ok(())
    }
}
