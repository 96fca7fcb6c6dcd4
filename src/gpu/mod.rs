//! Accelerated-execution contract for the molecular-dynamics model.
//!
//! The engine uploads particles in a fixed single-precision layout, runs the
//! prestep, accel, reduce, and integrate kernels in that order for every
//! sub-step, and reads the buffer back whenever it needs host-side state.

pub mod software_backend;
pub use software_backend::SoftwareBackend;

use glam::{DVec2, Vec2};

use crate::{
    core::{BoundaryMode, Particle},
    error::{Error, Result},
};

/// Particles handled by one accel work group.
pub const BLOCK_SIZE: usize = 32;

/// Device-side particle record; 24 bytes, no padding.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GpuParticle {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub acceleration: [f32; 2],
}

impl GpuParticle {
    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }

    pub fn acceleration(&self) -> Vec2 {
        Vec2::from_array(self.acceleration)
    }

    pub fn to_particle(&self) -> Particle {
        Particle {
            position: self.position().as_dvec2(),
            velocity: self.velocity().as_dvec2(),
            acceleration: self.acceleration().as_dvec2(),
        }
    }
}

impl From<&Particle> for GpuParticle {
    fn from(p: &Particle) -> Self {
        Self {
            position: p.position.as_vec2().to_array(),
            velocity: p.velocity.as_vec2().to_array(),
            acceleration: p.acceleration.as_vec2().to_array(),
        }
    }
}

/// Uniforms shared by all four kernels.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct KernelParams {
    pub n: u32,
    /// `ceil(n / BLOCK_SIZE)`.
    pub block_count: u32,
    pub lx: f32,
    pub ly: f32,
    pub dt: f32,
    pub sigma: f32,
    pub epsilon: f32,
    pub max_accel: f32,
    /// `BoundaryMode` index.
    pub boundary: u32,
}

impl KernelParams {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n: usize,
        dims: DVec2,
        dt: f64,
        sigma: f64,
        epsilon: f64,
        max_accel: f64,
        boundary: BoundaryMode,
    ) -> Self {
        Self {
            n: n as u32,
            block_count: block_count(n) as u32,
            lx: dims.x as f32,
            ly: dims.y as f32,
            dt: dt as f32,
            sigma: sigma as f32,
            epsilon: epsilon as f32,
            max_accel: max_accel as f32,
            boundary: boundary.index() as u32,
        }
    }

    pub fn boundary_mode(&self) -> BoundaryMode {
        BoundaryMode::from_index(i64::from(self.boundary)).unwrap_or_default()
    }

    pub fn dims(&self) -> Vec2 {
        Vec2::new(self.lx, self.ly)
    }
}

pub fn block_count(n: usize) -> usize {
    n.div_ceil(BLOCK_SIZE)
}

/// Reductions produced since the previous readback.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GpuCounters {
    pub flux: [f32; 2],
    pub potential: f32,
}

impl GpuCounters {
    pub fn flux(&self) -> DVec2 {
        Vec2::from_array(self.flux).as_dvec2()
    }
}

/// Backend able to run the molecular-dynamics kernels away from the host path.
pub trait AcceleratedBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Builds kernels and allocates buffers for `n` particles.
    fn build(&self, n: usize) -> Result<()>;

    fn upload(&self, particles: &[GpuParticle]) -> Result<()>;

    /// Drift, first half-kick, and boundary transport.
    fn dispatch_prestep(&self, params: &KernelParams) -> Result<()>;

    /// Per-block partial accelerations and potential energy.
    fn dispatch_accel(&self, params: &KernelParams) -> Result<()>;

    /// Sums the partials into each particle and applies the explosion bound.
    fn dispatch_reduce(&self, params: &KernelParams) -> Result<()>;

    /// Second half-kick.
    fn dispatch_integrate(&self, params: &KernelParams) -> Result<()>;

    /// Copies the device buffer into `out` and returns (then clears) the counters.
    fn readback(&self, out: &mut [GpuParticle]) -> Result<GpuCounters>;
}

/// Backend with no device behind it; every request reports unavailability.
#[derive(Debug, Default)]
pub struct NoopBackend;

impl NoopBackend {
    pub fn new() -> Self {
        Self
    }

    fn unavailable<T>(&self) -> Result<T> {
        Err(Error::BackendUnavailable(format!(
            "{} has no accelerated device",
            self.name()
        )))
    }
}

impl AcceleratedBackend for NoopBackend {
    fn name(&self) -> &str {
        "cpu-noop"
    }

    fn build(&self, _n: usize) -> Result<()> {
        self.unavailable()
    }

    fn upload(&self, _particles: &[GpuParticle]) -> Result<()> {
        self.unavailable()
    }

    fn dispatch_prestep(&self, _params: &KernelParams) -> Result<()> {
        self.unavailable()
    }

    fn dispatch_accel(&self, _params: &KernelParams) -> Result<()> {
        self.unavailable()
    }

    fn dispatch_reduce(&self, _params: &KernelParams) -> Result<()> {
        self.unavailable()
    }

    fn dispatch_integrate(&self, _params: &KernelParams) -> Result<()> {
        self.unavailable()
    }

    fn readback(&self, _out: &mut [GpuParticle]) -> Result<GpuCounters> {
        self.unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout_is_packed() {
        assert_eq!(std::mem::size_of::<GpuParticle>(), 24);
        assert_eq!(std::mem::align_of::<GpuParticle>(), 4);
    }

    #[test]
    fn block_count_rounds_up() {
        assert_eq!(block_count(1), 1);
        assert_eq!(block_count(32), 1);
        assert_eq!(block_count(33), 2);
    }

    #[test]
    fn noop_backend_is_never_available() {
        let backend = NoopBackend::new();
        assert!(matches!(backend.build(4), Err(Error::BackendUnavailable(_))));
    }
}
