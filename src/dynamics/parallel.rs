//! Rayon-backed variants of the O(N²) passes.
//!
//! Each task owns one particle and reads a snapshot of the others, so there
//! are no shared accumulators and nothing observes a half-updated state.

use glam::DVec2;
use rayon::prelude::*;

use crate::{
    collision::{contact::ContactGeometry, response::resolve_particle},
    core::Particle,
    dynamics::integrator::PairContext,
    stats::CollisionTally,
};

/// Parallel counterpart of [`super::integrator::accumulate_accelerations`].
pub fn accumulate_accelerations(particles: &mut [Particle], ctx: &PairContext) -> f64 {
    let lx = ctx.dims.x;
    let positions: Vec<DVec2> = particles.iter().map(|p| p.position).collect();

    let per_particle: Vec<(DVec2, f64)> = (0..positions.len())
        .into_par_iter()
        .map(|i| {
            let pi = positions[i];
            let mut acceleration = DVec2::ZERO;
            let mut potential = 0.0;
            if pi.x > lx {
                return (acceleration, potential);
            }
            for (j, &pj) in positions.iter().enumerate() {
                if j == i || pj.x > lx {
                    continue;
                }
                let d = ctx.separation(pi, pj);
                let Some(term) = ctx.potential.pair(d) else {
                    continue;
                };
                acceleration += term.coefficient * d;
                // Each unordered pair contributes its energy once.
                if j > i && pi.x < lx && pj.x < lx {
                    potential += term.potential;
                }
            }
            (acceleration, potential)
        })
        .collect();

    let mut total = 0.0;
    for (p, (acceleration, potential)) in particles.iter_mut().zip(per_particle) {
        p.acceleration = acceleration;
        total += potential;
    }
    total
}

/// Parallel counterpart of [`crate::collision::response::interact`].
pub fn interact(
    particles: &mut [Particle],
    snapshot: &[Particle],
    geometry: &ContactGeometry,
    resolve_all: bool,
    tally: &mut CollisionTally,
) {
    let frame = particles
        .par_iter_mut()
        .enumerate()
        .fold(
            || (Vec::new(), CollisionTally::default()),
            |(mut contacts, mut local), (i, p)| {
                let outcome = resolve_particle(i, snapshot, geometry, resolve_all, &mut contacts);
                p.velocity = outcome.velocity;
                local.record(outcome.direct_contacts);
                (contacts, local)
            },
        )
        .map(|(_, local)| local)
        .reduce(CollisionTally::default, |mut a, b| {
            a.merge(&b);
            a
        });
    tally.merge(&frame);
}
