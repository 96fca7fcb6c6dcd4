use glam::Vec2;
use parking_lot::Mutex;

use crate::{
    core::BoundaryMode,
    error::{Error, Result},
    gpu::{block_count, AcceleratedBackend, GpuCounters, GpuParticle, KernelParams, BLOCK_SIZE},
};

/// Partial sums written by one (particle, block) invocation of the accel kernel.
#[derive(Debug, Default, Clone, Copy)]
struct Partial {
    acceleration: Vec2,
    potential: f32,
}

/// Host-memory reference implementation of the kernel contract.
///
/// Every kernel runs in single precision over buffers that stay resident
/// between dispatches, mirroring what a compute device would hold.
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    particle_buffer: Mutex<Option<Vec<GpuParticle>>>,
    partial_buffer: Mutex<Option<Vec<Partial>>>,
    counter_buffer: Mutex<GpuCounters>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_built() -> Error {
        Error::BackendUnavailable("software backend used before build".to_string())
    }

    fn check_len(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::BufferMismatch { expected, actual })
        }
    }
}

#[inline]
fn minimum_image(d: Vec2, dims: Vec2, boundary: BoundaryMode) -> Vec2 {
    let (wrap_x, wrap_y) = boundary.minimum_image_axes();
    let mut out = d;
    if wrap_x && out.x.abs() > 0.5 * dims.x {
        out.x -= dims.x.copysign(out.x);
    }
    if wrap_y && out.y.abs() > 0.5 * dims.y {
        out.y -= dims.y.copysign(out.y);
    }
    out
}

/// `(coefficient, potential)` of the 12-6 pair term in single precision.
#[inline]
fn pair_term(r: f32, sigma: f32, epsilon: f32) -> (f32, f32) {
    let s = sigma / r;
    let s3 = s * s * s;
    let s6 = s3 * s3;
    let force = 24.0 * s * s6 * (2.0 * s6 - 1.0);
    (force * s, 4.0 * epsilon * s6 * (s6 - 1.0))
}

impl AcceleratedBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "software-f32"
    }

    fn build(&self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(Error::InvalidParam(
                "accelerated buffers need at least one particle".to_string(),
            ));
        }
        *self.particle_buffer.lock() = Some(vec![GpuParticle::default(); n]);
        *self.partial_buffer.lock() = Some(vec![Partial::default(); n * block_count(n)]);
        *self.counter_buffer.lock() = GpuCounters::default();
        log::debug!("{} built for {n} particles", self.name());
        Ok(())
    }

    fn upload(&self, particles: &[GpuParticle]) -> Result<()> {
        let mut lock = self.particle_buffer.lock();
        let buffer = lock.as_mut().ok_or_else(Self::not_built)?;
        Self::check_len(buffer.len(), particles.len())?;
        buffer.copy_from_slice(particles);
        Ok(())
    }

    fn dispatch_prestep(&self, params: &KernelParams) -> Result<()> {
        let mut lock = self.particle_buffer.lock();
        let buffer = lock.as_mut().ok_or_else(Self::not_built)?;
        Self::check_len(buffer.len(), params.n as usize)?;

        let dt = params.dt;
        let dims = params.dims();
        let transport = params.boundary_mode().transport_fn();
        let mut flux = Vec2::ZERO;
        for p in buffer.iter_mut() {
            let a = p.acceleration();
            let drifted = p.position() + p.velocity() * dt + 0.5 * a * dt * dt;
            let kicked = p.velocity() + 0.5 * a * dt;
            // The transport policies are shared with the host path.
            let moved = transport(drifted.as_dvec2(), kicked.as_dvec2(), dims.as_dvec2());
            p.position = moved.position.as_vec2().to_array();
            p.velocity = moved.velocity.as_vec2().to_array();
            flux += moved.flux.as_vec2();
        }

        let mut counters = self.counter_buffer.lock();
        counters.flux[0] += flux.x;
        counters.flux[1] += flux.y;
        Ok(())
    }

    fn dispatch_accel(&self, params: &KernelParams) -> Result<()> {
        let particles = self.particle_buffer.lock();
        let particles = particles.as_ref().ok_or_else(Self::not_built)?;
        let mut partials = self.partial_buffer.lock();
        let partials = partials.as_mut().ok_or_else(Self::not_built)?;

        let n = params.n as usize;
        let blocks = params.block_count as usize;
        Self::check_len(particles.len(), n)?;
        Self::check_len(partials.len(), n * blocks)?;

        let dims = params.dims();
        let boundary = params.boundary_mode();
        let min_r = crate::dynamics::potential::MIN_PAIR_SEPARATION as f32 * params.sigma;

        for i in 0..n {
            let pi = particles[i].position();
            for block in 0..blocks {
                let mut partial = Partial::default();
                if pi.x <= params.lx {
                    let start = block * BLOCK_SIZE;
                    let end = (start + BLOCK_SIZE).min(n);
                    for (j, other) in particles[start..end].iter().enumerate() {
                        let j = start + j;
                        let pj = other.position();
                        if j == i || pj.x > params.lx {
                            continue;
                        }
                        let d = minimum_image(pi - pj, dims, boundary);
                        let r = d.length();
                        if r <= min_r {
                            continue;
                        }
                        let (coefficient, potential) = pair_term(r, params.sigma, params.epsilon);
                        partial.acceleration += coefficient * d;
                        if j > i && pi.x < params.lx && pj.x < params.lx {
                            partial.potential += potential;
                        }
                    }
                }
                partials[i * blocks + block] = partial;
            }
        }
        Ok(())
    }

    fn dispatch_reduce(&self, params: &KernelParams) -> Result<()> {
        let mut particles = self.particle_buffer.lock();
        let particles = particles.as_mut().ok_or_else(Self::not_built)?;
        let partials = self.partial_buffer.lock();
        let partials = partials.as_ref().ok_or_else(Self::not_built)?;

        let blocks = params.block_count as usize;
        Self::check_len(partials.len(), particles.len() * blocks)?;

        let mut potential = 0.0f32;
        for (p, row) in particles.iter_mut().zip(partials.chunks_exact(blocks)) {
            let mut a = Vec2::ZERO;
            for partial in row {
                a += partial.acceleration;
                potential += partial.potential;
            }
            if !a.is_finite() {
                a = Vec2::ZERO;
            } else if a.length_squared() > params.max_accel * params.max_accel {
                a = a.normalize_or_zero() * params.max_accel;
            }
            p.acceleration = a.to_array();
        }

        self.counter_buffer.lock().potential += potential;
        Ok(())
    }

    fn dispatch_integrate(&self, params: &KernelParams) -> Result<()> {
        let mut lock = self.particle_buffer.lock();
        let buffer = lock.as_mut().ok_or_else(Self::not_built)?;
        Self::check_len(buffer.len(), params.n as usize)?;
        for p in buffer.iter_mut() {
            let v = p.velocity() + 0.5 * p.acceleration() * params.dt;
            p.velocity = v.to_array();
        }
        Ok(())
    }

    fn readback(&self, out: &mut [GpuParticle]) -> Result<GpuCounters> {
        let lock = self.particle_buffer.lock();
        let buffer = lock.as_ref().ok_or_else(Self::not_built)?;
        Self::check_len(buffer.len(), out.len())?;
        out.copy_from_slice(buffer);
        Ok(std::mem::take(&mut *self.counter_buffer.lock()))
    }
}
