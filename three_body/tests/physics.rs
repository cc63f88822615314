use glam::DVec2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use three_body::presets::figure_eight;
use three_body::{gravitational_force, Body, Simulation};

/// Two resting bodies separated along the x-axis
fn two_body_system(dist: f64, m1: f64, m2: f64) -> Simulation {
    let mut sim = Simulation::new(0.01, 1.0).unwrap();
    sim.add_body(Body::new("a", m1, DVec2::new(-dist / 2.0, 0.0), DVec2::ZERO))
        .unwrap();
    sim.add_body(Body::new("b", m2, DVec2::new(dist / 2.0, 0.0), DVec2::ZERO))
        .unwrap();
    sim
}

/// Figure-eight preset rebuilt with a different time step
fn figure_eight_with_step(time_step: f64) -> Simulation {
    let mut scenario = figure_eight();
    scenario.time_step = time_step;
    scenario.build().unwrap()
}

fn random_body(rng: &mut StdRng, name: &str) -> Body {
    Body::new(
        name,
        rng.gen_range(0.1..10.0),
        DVec2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)),
        DVec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)),
    )
}

// ==================================================================================
// Force tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let sim = two_body_system(1.0, 2.0, 3.0);
    let forces = sim.net_forces();

    assert!((forces[0] + forces[1]).length() < 1e-12);
    // G * m1 * m2 / d^2
    assert!((forces[0].length() - 6.0).abs() < 1e-12);
}

#[test]
fn gravity_symmetry_random_pairs() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let a = random_body(&mut rng, "a");
        let b = random_body(&mut rng, "b");
        let g = rng.gen_range(0.1..10.0);

        let on_a = gravitational_force(g, &a, &b);
        let on_b = gravitational_force(g, &b, &a);

        let scale = on_a.length().max(1.0);
        assert!(
            (on_a + on_b).length() <= 1e-12 * scale,
            "forces not opposite: {:?} vs {:?}",
            on_a,
            on_b
        );
        assert!(on_a.dot(b.position - a.position) > 0.0);
    }
}

#[test]
fn gravity_zero_distance_is_null() {
    let mut sim = Simulation::new(0.01, 1.0).unwrap();
    let pos = DVec2::new(0.3, -0.7);
    sim.add_body(Body::new("a", 1.0, pos, DVec2::new(1.0, 0.0))).unwrap();
    sim.add_body(Body::new("b", 5.0, pos, DVec2::new(0.0, 1.0))).unwrap();

    assert_eq!(sim.net_forces(), vec![DVec2::ZERO, DVec2::ZERO]);

    sim.step();
    for body in sim.bodies() {
        assert!(body.position.is_finite());
        assert!(body.velocity.is_finite());
    }
    assert_eq!(sim.bodies()[0].velocity, DVec2::new(1.0, 0.0));
    assert_eq!(sim.bodies()[1].velocity, DVec2::new(0.0, 1.0));
}

// ==================================================================================
// Integration tests
// ==================================================================================

#[test]
fn figure_eight_conserves_momentum() {
    let mut sim = figure_eight_with_step(0.005);
    let before = sim.total_momentum();
    sim.step();
    let after = sim.total_momentum();

    assert!((after - before).length() < 1e-12, "{:?} -> {:?}", before, after);
}

#[test]
fn random_system_conserves_momentum() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut sim = Simulation::new(0.001, 1.0).unwrap();
    for i in 0..8 {
        sim.add_body(random_body(&mut rng, &format!("body {}", i)))
            .unwrap();
    }

    let before = sim.total_momentum();
    for _ in 0..10 {
        sim.step();
    }
    assert!((sim.total_momentum() - before).length() < 1e-9);
}

#[test]
fn figure_eight_energy_stays_bounded() {
    let mut sim = figure_eight_with_step(0.005);
    let initial = sim.total_energy();
    for _ in 0..1000 {
        sim.step();
    }
    let drift = ((sim.total_energy() - initial) / initial).abs();
    assert!(drift < 5e-2, "relative energy drift {}", drift);
}

#[test]
fn half_steps_differ_from_full_step() {
    let mut full = figure_eight_with_step(0.01);
    let mut half = figure_eight_with_step(0.005);

    full.step();
    half.step();
    half.step();

    assert!((full.elapsed() - half.elapsed()).abs() < 1e-15);

    let divergence = full
        .bodies()
        .iter()
        .zip(half.bodies())
        .map(|(a, b)| a.position.distance(b.position))
        .fold(0.0, f64::max);
    assert!(divergence > 1e-9, "divergence {}", divergence);
}

#[test]
fn single_body_moves_in_straight_line() {
    let p0 = DVec2::new(1.0, -2.0);
    let v0 = DVec2::new(0.5, 0.25);
    let mut sim = Simulation::new(0.01, 1.0).unwrap();
    sim.add_body(Body::new("alone", 3.0, p0, v0)).unwrap();

    for _ in 0..500 {
        sim.step();
        assert_eq!(sim.net_forces(), vec![DVec2::ZERO]);
    }

    let body = &sim.bodies()[0];
    assert_eq!(body.velocity, v0);
    let expected = p0 + v0 * sim.elapsed();
    assert!((body.position - expected).length() < 1e-10);
}

// ==================================================================================
// Trail tests
// ==================================================================================

#[test]
fn trail_is_bounded_and_ordered() {
    const N: usize = 5;
    let mut sim = Simulation::new(0.005, 1.0).unwrap();
    sim.add_body(
        Body::new("traced", 1.0, DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0)).with_trail(N),
    )
    .unwrap();
    sim.add_body(Body::new("anchor", 10.0, DVec2::ZERO, DVec2::ZERO))
        .unwrap();

    let mut history = Vec::new();
    for _ in 0..(3 * N) {
        sim.step();
        history.push(sim.bodies()[0].position);

        let trail = sim.bodies()[0].trail.as_ref().unwrap();
        assert!(trail.len() <= N);
    }

    let trail = sim.bodies()[0].trail.as_ref().unwrap();
    assert_eq!(trail.len(), N);
    let kept: Vec<DVec2> = trail.points().copied().collect();
    assert_eq!(kept, history[history.len() - N..]);
    assert_eq!(trail.newest(), Some(sim.bodies()[0].position));
}

#[test]
fn bodies_without_trail_record_nothing() {
    let mut sim = two_body_system(2.0, 1.0, 1.0);
    for _ in 0..10 {
        sim.step();
    }
    assert!(sim.bodies().iter().all(|b| b.trail.is_none()));
}

#[test]
fn body_order_is_stable() {
    let mut sim = figure_eight_with_step(0.005);
    for _ in 0..10 {
        sim.step();
    }
    let names: Vec<&str> = sim.bodies().iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["Body 1", "Body 2", "Body 3"]);
}
