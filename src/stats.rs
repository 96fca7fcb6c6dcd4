//! Per-frame accumulators and the named metrics published after every frame.

use glam::DVec2;

use crate::{
    core::{boundary::GHOST_BAND_INNER, BoundaryMode, Particle, StatsMap},
    dynamics::SubstepOutcome,
};

pub const STAT_ENERGY: &str = "E";
pub const STAT_TEMPERATURE: &str = "T";
pub const STAT_FLUX_PRESSURE: &str = "pFlux";
pub const STAT_VIRIAL_PRESSURE: &str = "pvirial";
pub const STAT_TIME: &str = "Time";
pub const STAT_HITS_DOUBLE: &str = "Hits double";
pub const STAT_HITS_TRIPLE: &str = "Hits triple";
pub const STAT_IN_BOX: &str = "In box";

pub const STAT_IMPULSE: &str = "I";
pub const STAT_COL_DOUBLES: &str = "ColDoubles";
pub const STAT_COL_TRIPLES: &str = "ColTriples";
pub const STAT_COL_QUADRUPLES: &str = "ColQuadruples";

/// Molecular-dynamics sums gathered over the sub-steps of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MdAccumulators {
    pub kinetic: f64,
    pub potential: f64,
    pub virial: f64,
    pub flux: DVec2,
    pub samples: u32,
    /// Simulated time covered by the samples.
    pub frame_time: f64,
    /// Particles with `x < 1.05 Lx` after the most recent sub-step.
    pub in_box: usize,
}

impl MdAccumulators {
    /// Folds the post-step state of one sub-step into the frame sums.
    pub fn sample(&mut self, particles: &[Particle], outcome: &SubstepOutcome, dt: f64, dims: DVec2) {
        let mut in_box = 0;
        for p in particles {
            if p.position.x < dims.x {
                self.kinetic += p.specific_kinetic_energy();
            }
            self.virial += p.position.dot(p.acceleration);
            if p.position.x < dims.x * GHOST_BAND_INNER {
                in_box += 1;
            }
        }
        self.in_box = in_box;
        self.potential += outcome.potential;
        self.flux += outcome.flux;
        self.samples += 1;
        self.frame_time += dt;
    }

    pub fn reset(&mut self) {
        let in_box = self.in_box;
        *self = Self {
            in_box,
            ..Self::default()
        };
    }
}

/// Cumulative pair-contact counters of the molecular-dynamics model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MdCollisionCounters {
    /// Particles that had at least one higher-index partner in contact.
    pub colliding: u64,
    /// ... exactly one partner.
    pub doubles: u64,
    /// ... exactly two partners.
    pub triples: u64,
}

impl MdCollisionCounters {
    /// Counts contacts `r <= sigma * threshold` over unordered pairs.
    pub fn count(
        &mut self,
        particles: &[Particle],
        boundary: BoundaryMode,
        dims: DVec2,
        sigma: f64,
        threshold: f64,
    ) {
        let reach = sigma * threshold;
        let reach_sq = reach * reach;
        for (i, pi) in particles.iter().enumerate() {
            let partners = particles[i + 1..]
                .iter()
                .filter(|pj| {
                    boundary
                        .minimum_image(pi.position - pj.position, dims)
                        .length_squared()
                        <= reach_sq
                })
                .count();
            if partners > 0 {
                self.colliding += 1;
            }
            match partners {
                1 => self.doubles += 1,
                2 => self.triples += 1,
                _ => {}
            }
        }
    }

    fn percent(part: u64, whole: u64) -> f64 {
        if whole == 0 {
            0.0
        } else {
            100.0 * part as f64 / whole as f64
        }
    }

    pub fn double_percent(&self) -> f64 {
        Self::percent(self.doubles, self.colliding)
    }

    pub fn triple_percent(&self) -> f64 {
        Self::percent(self.triples, self.colliding)
    }
}

/// Builds the molecular-dynamics metrics for one finished frame.
pub fn md_stats(
    acc: &MdAccumulators,
    counters: &MdCollisionCounters,
    particle_count: usize,
    dims: DVec2,
    elapsed: f64,
) -> StatsMap {
    let n = particle_count as f64;
    let samples = f64::from(acc.samples.max(1));
    let area = dims.x * dims.y;
    let kinetic = acc.kinetic / samples;
    let potential = acc.potential / samples;
    let temperature = kinetic / n;
    let flux_pressure = if acc.frame_time > 0.0 {
        (acc.flux.x / (2.0 * dims.x) + acc.flux.y / (2.0 * dims.y)) / acc.frame_time
    } else {
        0.0
    };

    let mut stats = StatsMap::new();
    stats.insert(STAT_ENERGY.into(), (kinetic + potential) / n);
    stats.insert(STAT_TEMPERATURE.into(), temperature);
    stats.insert(STAT_FLUX_PRESSURE.into(), flux_pressure);
    stats.insert(
        STAT_VIRIAL_PRESSURE.into(),
        n * temperature / area + 0.5 * acc.virial / (samples * area),
    );
    stats.insert(STAT_TIME.into(), elapsed);
    stats.insert(STAT_HITS_DOUBLE.into(), counters.double_percent());
    stats.insert(STAT_HITS_TRIPLE.into(), counters.triple_percent());
    stats.insert(STAT_IN_BOX.into(), acc.in_box as f64);
    stats
}

/// Hard-sphere simultaneous-contact tallies for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionTally {
    pub doubles: u64,
    pub triples: u64,
    pub quadruples: u64,
}

impl CollisionTally {
    /// Records one particle with `direct` simultaneous direct contacts.
    #[inline]
    pub fn record(&mut self, direct: usize) {
        match direct {
            1 => self.doubles += 1,
            2 => self.triples += 1,
            3 => self.quadruples += 1,
            _ => {}
        }
    }

    pub fn merge(&mut self, other: &CollisionTally) {
        self.doubles += other.doubles;
        self.triples += other.triples;
        self.quadruples += other.quadruples;
    }

    /// Component-wise running maximum.
    pub fn max_with(&mut self, other: &CollisionTally) {
        self.doubles = self.doubles.max(other.doubles);
        self.triples = self.triples.max(other.triples);
        self.quadruples = self.quadruples.max(other.quadruples);
    }
}

/// Builds the hard-sphere metrics from the live state and the running maxima.
pub fn hard_sphere_stats(
    particles: &[Particle],
    mass: f64,
    maxima: &CollisionTally,
    elapsed: f64,
) -> StatsMap {
    let (speed_sq, speed) = particles.iter().fold((0.0, 0.0), |(sq, s), p| {
        (sq + p.velocity.length_squared(), s + p.velocity.length())
    });

    let mut stats = StatsMap::new();
    stats.insert(STAT_ENERGY.into(), 0.5 * mass * speed_sq);
    stats.insert(STAT_IMPULSE.into(), mass * speed);
    stats.insert(STAT_COL_DOUBLES.into(), maxima.doubles as f64);
    stats.insert(STAT_COL_TRIPLES.into(), maxima.triples as f64);
    stats.insert(STAT_COL_QUADRUPLES.into(), maxima.quadruples as f64);
    stats.insert(STAT_TIME.into(), elapsed);
    stats
}
