use particle_ensemble::{
    core::boundary::{
        transport_closed, transport_hole_in_a_box, transport_hole_in_a_box_periodic_y,
        transport_hole_in_a_box_wrapped, transport_periodic_x, transport_periodic_xy,
        transport_tube, TransportFn, TRANSPORT_TABLE,
    },
    stats::STAT_FLUX_PRESSURE,
    utils::math::wrap_periodic,
    *,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const DIMS: DVec2 = DVec2::new(4.0, 3.0);

fn samples(seed: u64, count: usize) -> Vec<(DVec2, DVec2)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let position = DVec2::new(rng.random_range(-2.0..=7.0), rng.random_range(-2.0..=6.0));
            let velocity = DVec2::new(rng.random_range(-3.0..=3.0), rng.random_range(-3.0..=3.0));
            (position, velocity)
        })
        .collect()
}

#[test]
fn table_dispatch_matches_direct_policies() {
    let direct: [TransportFn; 7] = [
        transport_periodic_xy,
        transport_periodic_x,
        transport_closed,
        transport_hole_in_a_box,
        transport_hole_in_a_box_periodic_y,
        transport_hole_in_a_box_wrapped,
        transport_tube,
    ];
    for (mode, policy) in BoundaryMode::ALL.iter().zip(direct) {
        for (p, v) in samples(mode.index() as u64, 64) {
            assert_eq!(mode.transport(p, v, DIMS), policy(p, v, DIMS), "mode {mode}");
            assert_eq!(TRANSPORT_TABLE[mode.index()](p, v, DIMS), policy(p, v, DIMS));
        }
    }
}

#[test]
fn periodic_wrap_lands_inside_the_domain() {
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..2_000 {
        let value: f64 = rng.random_range(-50.0..=50.0);
        let wrapped = wrap_periodic(value, 3.0);
        assert!((0.0..3.0).contains(&wrapped), "{value} -> {wrapped}");
    }
    assert_eq!(wrap_periodic(-1e-18, 3.0), 0.0);

    for (p, v) in samples(3, 256) {
        let t = transport_periodic_xy(p, v, DIMS);
        assert!((0.0..DIMS.x).contains(&t.position.x));
        assert!((0.0..DIMS.y).contains(&t.position.y));
        assert_eq!(t.velocity, v);
        assert_eq!(t.flux, DVec2::ZERO);
    }
}

#[test]
fn reflective_policies_never_create_speed() {
    for mode in [
        BoundaryMode::PeriodicX,
        BoundaryMode::Closed,
        BoundaryMode::HoleInABox,
        BoundaryMode::HoleInABoxPeriodicY,
    ] {
        for (p, v) in samples(40 + mode.index() as u64, 128) {
            let t = mode.transport(p, v, DIMS);
            assert_eq!(t.velocity.length_squared(), v.length_squared(), "mode {mode}");
            assert!(t.flux.x >= 0.0 && t.flux.y >= 0.0);
        }
    }
}

#[test]
fn minimum_image_never_exceeds_half_the_domain() {
    for mode in BoundaryMode::ALL {
        let (wrap_x, wrap_y) = mode.minimum_image_axes();
        for (p, _) in samples(90, 128) {
            let d = p - DVec2::new(1.0, 1.0);
            let image = mode.minimum_image(d, DIMS);
            if wrap_x && d.x.abs() < DIMS.x {
                assert!(image.x.abs() <= 0.5 * DIMS.x + 1e-12);
            } else if !wrap_x {
                assert_eq!(image.x, d.x);
            }
            if wrap_y && d.y.abs() < DIMS.y {
                assert!(image.y.abs() <= 0.5 * DIMS.y + 1e-12);
            } else if !wrap_y {
                assert_eq!(image.y, d.y);
            }
        }
    }
}

#[test]
fn closed_box_reports_wall_pressure() {
    let params = MdParams {
        lx: 4.0,
        ly: 4.0,
        dt: 0.01,
        dt_max: 0.01,
        epsilon: 0.0,
        adaptive_timestep: false,
        boundary: BoundaryMode::Closed,
        ..MdParams::default()
    };
    let particles = vec![Particle::new(DVec2::new(3.9, 2.0), DVec2::new(20.0, 0.0))];
    let mut engine = MdEngine::from_particles(params, particles).expect("valid setup");
    engine.set_running(true);
    engine.update();

    let p = engine.particles()[0];
    assert!(p.velocity.x < 0.0);
    assert!(engine.stats()[STAT_FLUX_PRESSURE] > 0.0);
}
