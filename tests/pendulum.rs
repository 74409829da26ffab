use labsim::simulation::constants::STANDARD_GRAVITY;
use labsim::{
    energy_drift, find_extremes, mean_period, theoretical_period, Calculator, CriteriaSet,
    PendulumCalculator, PendulumState, Simulation, TimeLimit,
};

pub fn swing(length: f64, angle_deg: f64, friction: f64, end: f64) -> Vec<PendulumState> {
    let calculator = PendulumCalculator::new(PendulumState::released(length, 1.0, angle_deg.to_radians(), friction));
    let criteria = CriteriaSet::new().with(TimeLimit { end });
    Simulation::new(calculator, 1e-3, criteria)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// ==================================================================================
// Conservation
// ==================================================================================

#[test]
fn frictionless_swing_conserves_energy() {
    for angle in [1.0, 10.0, 30.0] {
        let trajectory = swing(1.0, angle, 0.0, 10.0);
        let e0 = trajectory[0].full_energy();
        let drift = energy_drift(&trajectory) / e0;

        assert!(drift < 1e-6, "angle {}: relative energy drift {}", angle, drift);
    }
}

#[test]
fn friction_drains_energy() {
    let trajectory = swing(1.0, 20.0, 0.1, 10.0);
    let energies: Vec<f64> = trajectory.iter().map(|s| s.full_energy()).collect();
    let e0 = energies[0];

    let means: Vec<f64> = energies.windows(10).map(|w| w.iter().sum::<f64>() / 10.0).collect();
    for (i, pair) in means.windows(2).enumerate() {
        assert!(pair[1] <= pair[0] + 1e-9 * e0, "energy rose near sample {}: {} -> {}", i, pair[0], pair[1]);
    }
    assert!(energies.last().unwrap() < &(0.5 * e0), "too little damping: {}", energies.last().unwrap());
}

// ==================================================================================
// Period
// ==================================================================================

#[test]
fn small_swing_period_matches_theory() {
    for (length, angle) in [(1.0, 1.0), (0.5, 2.0), (2.0, 1.5)] {
        let trajectory = swing(length, angle, 0.0, 10.0);
        let period = mean_period(&find_extremes(&trajectory)).unwrap();
        let expected = theoretical_period(length, STANDARD_GRAVITY);

        assert!(
            ((period - expected) / expected).abs() < 1e-3,
            "length {} angle {}: period {} vs {}",
            length,
            angle,
            period,
            expected
        );
    }
}

#[test]
fn wide_swing_is_slower() {
    let trajectory = swing(1.0, 30.0, 0.0, 10.0);
    let period = mean_period(&find_extremes(&trajectory)).unwrap();

    assert!(period > 1.01 * theoretical_period(1.0, STANDARD_GRAVITY), "period {}", period);
}

#[test]
fn extremes_alternate_sides() {
    let trajectory = swing(1.0, 5.0, 0.0, 5.0);
    let extremes = find_extremes(&trajectory);

    assert!(extremes.len() > 4);
    assert_eq!(extremes[0].time, 0.0);
    for pair in extremes.windows(2) {
        assert!(pair[0].angle * pair[1].angle < 0.0, "extremes on the same side at t = {}", pair[1].time);
    }
}

#[test]
fn period_needs_two_extremes() {
    let state = PendulumState::released(1.0, 1.0, 0.1, 0.0);

    assert_eq!(mean_period(&[]), None);
    assert_eq!(mean_period(&[state]), None);
}

// ==================================================================================
// Driver
// ==================================================================================

#[test]
fn time_limit_ends_the_run_just_past_the_end() {
    let trajectory = swing(1.0, 10.0, 0.0, 2.0);
    let last = trajectory.last().unwrap();

    assert!(last.time > 2.0 && last.time < 2.0 + 2e-3, "stopped at {}", last.time);
    assert!(trajectory[..trajectory.len() - 1].iter().all(|s| s.time <= 2.0));
}

#[test]
fn swing_starts_at_rest_and_keeps_parameters() {
    let mut calculator = PendulumCalculator::new(PendulumState::released(1.2, 0.8, 0.2, 0.05));
    let first = calculator.advance(0.0).unwrap();
    let later = calculator.advance(0.5).unwrap();

    assert_eq!(first.angular_velocity, 0.0);
    assert_eq!(first.angle, 0.2);
    assert!(later.angle < 0.2);
    assert_eq!((later.length, later.weight, later.friction), (1.2, 0.8, 0.05));
    assert!((later.moment_of_inertia() - 0.8 * 1.44 / 3.0).abs() < 1e-12);
}
