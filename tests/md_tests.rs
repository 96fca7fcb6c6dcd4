use approx::assert_relative_eq;
use particle_ensemble::{
    config::{DEFAULT_PARTICLE_COUNT, MD_SECTION},
    dynamics::LennardJones,
    stats::{
        STAT_ENERGY, STAT_FLUX_PRESSURE, STAT_HITS_DOUBLE, STAT_IN_BOX, STAT_TEMPERATURE,
        STAT_TIME,
    },
    *,
};
use std::time::Duration;

fn closed_params(l: f64, dt: f64) -> MdParams {
    MdParams {
        lx: l,
        ly: l,
        dt,
        dt_max: dt,
        substeps: 10,
        adaptive_timestep: false,
        boundary: BoundaryMode::Closed,
        seed: Some(7),
        ..MdParams::default()
    }
}

fn kinetic(particles: &[Particle]) -> f64 {
    particles.iter().map(Particle::specific_kinetic_energy).sum()
}

#[test]
fn kinetic_energy_is_conserved_for_a_non_interacting_pair() {
    let params = MdParams {
        epsilon: 0.0,
        ..closed_params(100.0, 0.01)
    };
    let particles = vec![
        Particle::new(DVec2::new(20.0, 50.0), DVec2::new(0.3, 0.1)),
        Particle::new(DVec2::new(80.0, 50.0), DVec2::new(-0.2, 0.05)),
    ];
    let mut engine = MdEngine::from_particles(params, particles).expect("valid setup");
    let initial = kinetic(engine.particles());

    engine.set_running(true);
    for _ in 0..100 {
        engine.update();
    }

    assert_relative_eq!(kinetic(engine.particles()), initial, max_relative = 1e-6);
    assert_relative_eq!(engine.stats()[STAT_TIME], 10.0, max_relative = 1e-9);
}

#[test]
fn total_energy_is_conserved_for_a_bound_pair() {
    let params = closed_params(10.0, 0.001);
    let particles = vec![
        Particle::new(DVec2::new(4.35, 5.0), DVec2::ZERO),
        Particle::new(DVec2::new(5.65, 5.0), DVec2::ZERO),
    ];
    let lj = LennardJones::new(params.sigma, params.epsilon);
    let energy = |ps: &[Particle]| {
        kinetic(ps) + lj.potential((ps[0].position - ps[1].position).length())
    };

    let mut engine = MdEngine::from_particles(params, particles).expect("valid setup");
    let initial = energy(engine.particles());
    engine.set_running(true);
    let mut closest = f64::MAX;
    for _ in 0..300 {
        engine.update();
        let ps = engine.particles();
        closest = closest.min((ps[0].position - ps[1].position).length());
    }

    // The pair actually oscillated through the repulsive core.
    assert!(closest < 1.1, "closest approach {closest}");
    assert_relative_eq!(energy(engine.particles()), initial, max_relative = 1e-4);
    let momentum: DVec2 = engine.particles().iter().map(|p| p.velocity).sum();
    assert!(momentum.length() < 1e-9);
}

#[test]
fn explosion_guard_bounds_near_singular_encounters() {
    let params = closed_params(10.0, 0.001);
    let particles = vec![
        Particle::new(DVec2::new(5.0, 5.0), DVec2::ZERO),
        Particle::new(DVec2::new(5.3, 5.0), DVec2::ZERO),
    ];
    let mut engine = MdEngine::from_particles(params, particles).expect("valid setup");
    let bound = engine.max_acceleration();
    assert!(bound.is_finite() && bound > 0.0);

    engine.set_running(true);
    engine.update();
    for p in engine.particles() {
        assert!(p.is_finite());
        assert!(p.acceleration.length() <= bound * (1.0 + 1e-9));
    }
}

#[test]
fn paused_update_changes_nothing() {
    let mut engine = MdEngine::with_params(closed_params(10.0, 0.01)).expect("valid params");
    let before = engine.particles().to_vec();
    assert!(!engine.is_running());
    engine.update();
    assert_eq!(engine.particles(), before.as_slice());
    assert!(engine.stats().is_empty());
}

#[test]
fn initialize_substitutes_defaults_and_persists_them() {
    let mut store = MemoryStore::new().with(MD_SECTION, "nRow", "not-a-number");
    let mut engine = MdEngine::new();
    engine.initialize(&mut store);

    assert_eq!(engine.particle_count(), DEFAULT_PARTICLE_COUNT);
    assert_eq!(store.get(MD_SECTION, "nRow").as_deref(), Some("2"));
    assert_eq!(store.get(MD_SECTION, "N").as_deref(), Some("10"));
    // Two rows, five columns at a quarter of the domain apart.
    let xs: Vec<f64> = engine.particles().iter().map(|p| p.position.x).collect();
    assert_relative_eq!(xs[0], 0.125);
    assert_relative_eq!(xs[9], 1.125);
    for p in engine.particles() {
        assert!(p.position.y > 0.0 && p.position.y < 1.0);
        assert!(p.velocity.x.abs() <= 0.5 && p.velocity.y.abs() <= 0.5);
    }
}

#[test]
fn reinitialization_rebuilds_state() {
    let mut store = MemoryStore::new()
        .with(MD_SECTION, "N", 6)
        .with(MD_SECTION, "Lx", 10.0)
        .with(MD_SECTION, "Ly", 10.0)
        .with(MD_SECTION, "seed", 3);
    let mut engine = MdEngine::new();
    engine.initialize(&mut store);
    let first = engine.particles().to_vec();

    engine.set_running(true);
    engine.update();
    assert!(!engine.stats().is_empty());
    assert_ne!(engine.particles(), first.as_slice());

    engine.initialize(&mut store);
    assert!(!engine.is_running());
    assert!(engine.stats().is_empty());
    assert_eq!(engine.collision_counters().colliding, 0);
    assert_eq!(engine.particle_count(), 6);
    for (a, b) in engine.particles().iter().zip(&first) {
        assert_eq!(a.position, b.position);
        assert_eq!(a.velocity, b.velocity);
    }
}

#[test]
fn adaptive_step_stays_positive_and_capped() {
    let params = MdParams {
        adaptive_timestep: true,
        dt_max: 0.005,
        ..closed_params(10.0, 0.005)
    };
    let resting = vec![
        Particle::new(DVec2::new(2.0, 2.0), DVec2::ZERO),
        Particle::new(DVec2::new(8.0, 8.0), DVec2::ZERO),
    ];
    let mut engine = MdEngine::from_particles(params.clone(), resting).expect("valid setup");
    engine.set_running(true);
    engine.update();
    assert!(engine.dt() > 0.0 && engine.dt() <= 0.005);

    let fast = vec![
        Particle::new(DVec2::new(2.0, 2.0), DVec2::new(50.0, 0.0)),
        Particle::new(DVec2::new(8.0, 8.0), DVec2::ZERO),
    ];
    let mut engine = MdEngine::from_particles(params, fast).expect("valid setup");
    engine.set_running(true);
    engine.update();
    assert!(engine.dt() > 0.0 && engine.dt() < 0.005);
}

#[test]
fn first_substep_uses_the_adapted_step() {
    let params = MdParams {
        adaptive_timestep: true,
        substeps: 1,
        epsilon: 0.0,
        ..closed_params(10.0, 0.0167)
    };
    let start = DVec2::new(2.0, 5.0);
    let particles = vec![Particle::new(start, DVec2::new(50.0, 0.0))];
    let mut engine = MdEngine::from_particles(params.clone(), particles).expect("valid setup");
    engine.set_running(true);
    engine.update();

    let expected = params.path_threshold * 10.0 / 50.0;
    assert_relative_eq!(engine.elapsed(), expected, max_relative = 1e-9);
    let moved = (engine.particles()[0].position - start).length();
    assert_relative_eq!(moved, 50.0 * expected, max_relative = 1e-9);
}

#[test]
fn frame_accumulators_restart_every_frame() {
    let params = MdParams {
        epsilon: 0.0,
        collision_radius_threshold: 1.2,
        ..closed_params(20.0, 0.01)
    };
    // The pair rests at the force minimum inside the contact radius; the
    // third particle hits the right wall on the first sub-step only.
    let r_min = 2f64.powf(1.0 / 6.0);
    let particles = vec![
        Particle::new(DVec2::new(19.9, 2.0), DVec2::new(20.0, 0.0)),
        Particle::new(DVec2::new(5.0, 15.0), DVec2::ZERO),
        Particle::new(DVec2::new(5.0 + r_min, 15.0), DVec2::ZERO),
    ];
    let mut engine = MdEngine::from_particles(params, particles).expect("valid setup");
    engine.set_running(true);

    engine.update();
    assert!(engine.stats()[STAT_FLUX_PRESSURE] > 0.0);
    assert_eq!(engine.collision_counters().colliding, 10);

    engine.update();
    assert_eq!(engine.stats()[STAT_FLUX_PRESSURE], 0.0);
    // Kinetic energy of a single frame's samples, not two frames summed.
    assert_relative_eq!(engine.stats()[STAT_ENERGY], 200.0 / 3.0, max_relative = 1e-6);
    assert_eq!(engine.collision_counters().colliding, 20);
}

#[test]
fn collision_counting_is_profiled_as_resolve_time() {
    let mut engine = MdEngine::with_params(MdParams {
        particle_count: 64,
        grid_rows: 8,
        init_position_scale: 1.0,
        ..closed_params(12.0, 0.001)
    })
    .expect("valid params");
    engine.set_running(true);
    engine.update();
    let profile = engine.profile();
    assert!(profile.resolve_time > Duration::ZERO);
    assert!(profile.resolve_time <= profile.total_time);
}

#[test]
fn collision_counts_are_cumulative_across_reset_stats() {
    let params = MdParams {
        epsilon: 1.0,
        ..closed_params(10.0, 1e-5)
    };
    let particles = vec![
        Particle::new(DVec2::new(5.0, 5.0), DVec2::ZERO),
        Particle::new(DVec2::new(5.9, 5.0), DVec2::ZERO),
    ];
    let mut engine = MdEngine::from_particles(params, particles).expect("valid setup");
    engine.set_running(true);
    engine.update();
    let after_one = *engine.collision_counters();
    assert_eq!(after_one.colliding, 10);
    assert_relative_eq!(engine.stats()[STAT_HITS_DOUBLE], 100.0);

    engine.reset_stats();
    assert_eq!(*engine.collision_counters(), after_one);
    engine.update();
    assert_eq!(engine.collision_counters().colliding, 20);
}

#[test]
fn stats_cover_every_metric() {
    let mut engine = MdEngine::with_params(MdParams {
        particle_count: 8,
        ..closed_params(10.0, 0.001)
    })
    .expect("valid params");
    engine.set_running(true);
    engine.update();
    let stats = engine.stats();
    for key in ["E", "T", "pFlux", "pvirial", "Time", "Hits double", "Hits triple", "In box"] {
        assert!(stats.contains_key(key), "missing {key}");
        assert!(stats[key].is_finite(), "{key} not finite");
    }
    assert_eq!(stats[STAT_IN_BOX], 8.0);
    assert!(stats[STAT_TEMPERATURE] >= 0.0);
    assert!(stats[STAT_ENERGY].is_finite());
}

#[test]
fn periodic_drift_wraps_into_the_domain() {
    let params = MdParams {
        boundary: BoundaryMode::PeriodicXY,
        substeps: 1,
        ..closed_params(10.0, 0.1)
    };
    let particles = vec![
        Particle::new(DVec2::new(9.95, 0.02), DVec2::new(1.0, -1.0)),
        Particle::new(DVec2::new(5.0, 5.0), DVec2::ZERO),
    ];
    let mut engine = MdEngine::from_particles(params, particles).expect("valid setup");
    engine.set_running(true);
    engine.update();
    let p = engine.particles()[0].position;
    assert!((0.0..10.0).contains(&p.x) && (0.0..10.0).contains(&p.y));
    assert!((p.x - 0.05).abs() < 1e-6, "x = {}", p.x);
    assert!((p.y - 9.92).abs() < 1e-6, "y = {}", p.y);
}

#[test]
fn empty_particle_list_is_rejected() {
    let err = MdEngine::from_particles(MdParams::default(), Vec::new()).err();
    assert!(matches!(err, Some(Error::InvalidParam(_))));
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_engine_matches_sequential() {
    let params = MdParams {
        particle_count: 24,
        grid_rows: 4,
        init_position_scale: 0.6,
        ..closed_params(6.0, 0.001)
    };
    let mut seq = MdEngine::with_params(params.clone()).expect("valid params");
    let mut par = MdEngine::with_params(params).expect("valid params");
    seq.set_parallel_enabled(false);
    par.set_parallel_enabled(true);
    seq.set_running(true);
    par.set_running(true);
    for _ in 0..5 {
        seq.update();
        par.update();
    }
    for (a, b) in seq.particles().iter().zip(par.particles()) {
        assert!((a.position - b.position).length() < 1e-9);
        assert!((a.velocity - b.velocity).length() < 1e-9);
    }
}
