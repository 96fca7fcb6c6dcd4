use glam::DVec2;

use crate::{
    collision::contact::{find_contacts_into, ContactGeometry},
    core::{CollisionRecord, Particle},
    stats::CollisionTally,
};

/// Direct contacts closer than this fraction of the radius carry no usable normal.
pub const DEGENERATE_CONTACT_FRACTION: f64 = 1e-3;

/// Post-collision state of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionOutcome {
    pub velocity: DVec2,
    /// Approaching, non-degenerate particle contacts.
    pub direct_contacts: usize,
}

/// Elastic impulse of `other` on `this`, or `None` when the pair separates or coincides.
#[inline]
pub fn pair_impulse(this: &Particle, other: &Particle, degenerate_sq: f64) -> Option<DVec2> {
    let d = this.position - other.position;
    let dv = this.velocity - other.velocity;
    let approach = d.dot(dv);
    if approach > 0.0 {
        return None;
    }
    let dist_sq = d.length_squared();
    if dist_sq <= degenerate_sq {
        return None;
    }
    Some(approach / dist_sq * d)
}

/// Reflects `velocity` about an outward wall normal if it is moving into the wall.
#[inline]
pub fn reflect_off_wall(velocity: DVec2, normal: DVec2) -> DVec2 {
    let into = velocity.dot(normal);
    if into > 0.0 {
        velocity - 2.0 * into * normal
    } else {
        velocity
    }
}

/// Resolves particle `index` against the start-of-sub-step `snapshot`.
pub fn resolve_particle(
    index: usize,
    snapshot: &[Particle],
    geometry: &ContactGeometry,
    resolve_all: bool,
    contacts: &mut Vec<CollisionRecord>,
) -> InteractionOutcome {
    let this = &snapshot[index];
    let mut velocity = this.velocity;
    if !find_contacts_into(contacts, index, snapshot, geometry) {
        return InteractionOutcome {
            velocity,
            direct_contacts: 0,
        };
    }

    let degenerate = DEGENERATE_CONTACT_FRACTION * geometry.radius;
    let degenerate_sq = degenerate * degenerate;
    let mut cumulative = DVec2::ZERO;
    let mut direct = 0usize;
    for record in contacts.iter() {
        let Some(j) = record.other else {
            continue;
        };
        let Some(impulse) = pair_impulse(this, &snapshot[j], degenerate_sq) else {
            continue;
        };
        if direct == 0 || resolve_all {
            cumulative += impulse;
        }
        direct += 1;
    }

    if direct > 0 {
        let divisor = if resolve_all { (direct as f64).sqrt() } else { 1.0 };
        velocity -= cumulative / divisor;
    }

    for record in contacts.iter().filter(|c| c.is_wall()) {
        velocity = reflect_off_wall(velocity, record.normal);
    }

    InteractionOutcome {
        velocity,
        direct_contacts: direct,
    }
}

/// Sequential interact pass: every particle reads `snapshot`, writes `particles`.
pub fn interact(
    particles: &mut [Particle],
    snapshot: &[Particle],
    geometry: &ContactGeometry,
    resolve_all: bool,
    tally: &mut CollisionTally,
) {
    let mut contacts = Vec::with_capacity(snapshot.len());
    for (i, p) in particles.iter_mut().enumerate() {
        let outcome = resolve_particle(i, snapshot, geometry, resolve_all, &mut contacts);
        p.velocity = outcome.velocity;
        tally.record(outcome.direct_contacts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> ContactGeometry {
        ContactGeometry::new(0.5, DVec2::new(10.0, 10.0), false, false)
    }

    #[test]
    fn head_on_pair_exchanges_velocities() {
        let snapshot = vec![
            Particle::new(DVec2::new(4.55, 5.0), DVec2::new(1.0, 0.0)),
            Particle::new(DVec2::new(5.45, 5.0), DVec2::new(-1.0, 0.0)),
        ];
        let mut live = snapshot.clone();
        let mut tally = CollisionTally::default();
        interact(&mut live, &snapshot, &geometry(), false, &mut tally);
        assert!((live[0].velocity - DVec2::new(-1.0, 0.0)).length() < 1e-12);
        assert!((live[1].velocity - DVec2::new(1.0, 0.0)).length() < 1e-12);
        assert_eq!(tally.doubles, 2);
    }

    #[test]
    fn separating_pairs_are_left_alone() {
        let snapshot = vec![
            Particle::new(DVec2::new(4.55, 5.0), DVec2::new(-1.0, 0.0)),
            Particle::new(DVec2::new(5.45, 5.0), DVec2::new(1.0, 0.0)),
        ];
        let mut live = snapshot.clone();
        let mut tally = CollisionTally::default();
        interact(&mut live, &snapshot, &geometry(), false, &mut tally);
        assert_eq!(live, snapshot);
        assert_eq!(tally, CollisionTally::default());
    }

    #[test]
    fn walls_only_reflect_approaching_particles() {
        assert_eq!(
            reflect_off_wall(DVec2::new(-2.0, 1.0), DVec2::NEG_X),
            DVec2::new(2.0, 1.0)
        );
        assert_eq!(
            reflect_off_wall(DVec2::new(2.0, 1.0), DVec2::NEG_X),
            DVec2::new(2.0, 1.0)
        );
    }

    #[test]
    fn compound_contacts_are_counted_but_only_first_resolved_by_default() {
        let snapshot = vec![
            Particle::new(DVec2::new(5.0, 5.0), DVec2::ZERO),
            Particle::new(DVec2::new(5.9, 5.0), DVec2::new(-1.0, 0.0)),
            Particle::new(DVec2::new(4.1, 5.0), DVec2::new(1.0, 0.0)),
        ];
        let mut contacts = Vec::new();
        let first = resolve_particle(0, &snapshot, &geometry(), false, &mut contacts);
        assert_eq!(first.direct_contacts, 2);
        assert!((first.velocity - DVec2::new(-1.0, 0.0)).length() < 1e-12);

        let all = resolve_particle(0, &snapshot, &geometry(), true, &mut contacts);
        assert_eq!(all.direct_contacts, 2);
        // Opposite impulses cancel.
        assert!(all.velocity.length() < 1e-12);
    }
}
