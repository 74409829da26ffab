use std::f64::consts::PI;

use labsim::simulation::trig;
use labsim::{Dopri5, IntegratorParams, OdeSystem, Polar, SimError, Vector2D};
use nalgebra::{SVector, Vector1, Vector2};

/// y' = -y
struct Decay;

impl OdeSystem<1> for Decay {
    fn derivatives(&self, _t: f64, y: &SVector<f64, 1>) -> SVector<f64, 1> {
        -y
    }
}

/// x'' = -x
struct Oscillator;

impl OdeSystem<2> for Oscillator {
    fn derivatives(&self, _t: f64, y: &SVector<f64, 2>) -> SVector<f64, 2> {
        Vector2::new(y[1], -y[0])
    }
}

// ==================================================================================
// Vector tests
// ==================================================================================

#[test]
fn polar_round_trip_keeps_norm_and_angle() {
    let v = Vector2D::from_polar(5.0, 0.3);
    let (norm, angle) = v.to_polar();

    assert!((norm - 5.0).abs() < 1e-12, "norm drifted: {}", norm);
    assert!((angle - 0.3).abs() < 1e-12, "angle drifted: {}", angle);
}

#[test]
fn rotation_by_quarter_turn() {
    let v = Vector2D::new(1.0, 0.0).rotated(PI / 2.0);

    assert!(v.x.abs() < 1e-12 && (v.y - 1.0).abs() < 1e-12, "unexpected rotation: {:?}", v);
    assert!((Vector2D::new(3.0, 4.0).rotated(1.234).norm() - 5.0).abs() < 1e-12);
}

#[test]
fn vector_arithmetic_and_dot() {
    let a = Vector2D::new(1.0, 2.0);
    let b = Vector2D::new(3.0, -1.0);

    assert_eq!(a + b, Vector2D::new(4.0, 1.0));
    assert_eq!(a - b, Vector2D::new(-2.0, 3.0));
    assert_eq!(a * 2.0, Vector2D::new(2.0, 4.0));
    assert_eq!(a.dot(&b), 1.0);
    assert_eq!(Vector2D::new(0.0, -2.0).polar_angle(), -PI / 2.0);
    assert_eq!(Vector2D::new(-1.0, 0.0).polar_angle(), PI);
    assert_eq!(Vector2D::from_polar(2.0, 0.7).to_polar().1, Vector2D::from_polar(2.0, 0.7).polar_angle());
}

// ==================================================================================
// Trig tests
// ==================================================================================

#[test]
fn rounded_trig_is_exact_at_right_angles() {
    assert_eq!(trig::sin(PI), 0.0);
    assert_eq!(trig::cos(PI / 2.0), 0.0);
    assert_eq!(trig::sin(0.0), 0.0);
    assert_eq!(trig::cos(0.0), 1.0);
    assert!((trig::tan(PI / 4.0) - 1.0).abs() < 1e-15);
}

#[test]
fn sign_is_zero_at_zero() {
    assert_eq!(trig::sign(0.0), 0.0);
    assert_eq!(trig::sign(-0.0), 0.0);
    assert_eq!(trig::sign(2.5), 1.0);
    assert_eq!(trig::sign(-1e-300), -1.0);
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn dopri_matches_exponential_decay() {
    let mut solver = Dopri5::new(0.0, Vector1::new(1.0), IntegratorParams::default());
    let mut t = 0.0_f64;
    for _ in 0..10 {
        let y = solver.advance_by(&Decay, 0.1).unwrap();
        t += 0.1;
        let exact = (-t).exp();
        assert!(
            (y[0] - exact).abs() / exact < 1e-5,
            "y({}) = {}, expected {}",
            t,
            y[0],
            exact
        );
    }
    assert!((solver.t() - 1.0).abs() < 1e-12, "time drifted: {}", solver.t());
}

#[test]
fn dopri_continues_from_previous_call() {
    // ten small calls and one large call end at the same point
    let mut stepped = Dopri5::new(0.0, Vector2::new(1.0, 0.0), IntegratorParams::default());
    for _ in 0..10 {
        stepped.advance_by(&Oscillator, 0.5).unwrap();
    }
    let mut single = Dopri5::new(0.0, Vector2::new(1.0, 0.0), IntegratorParams::default());
    single.advance_by(&Oscillator, 5.0).unwrap();

    assert!((stepped.t() - 5.0).abs() < 1e-12);
    let diff = (stepped.state() - single.state()).norm();
    assert!(diff < 1e-5, "incremental and single integration differ by {}", diff);
    assert!((stepped.state()[0] - 5.0f64.cos()).abs() < 1e-5);
}

#[test]
fn dopri_zero_delta_is_a_query() {
    let mut solver = Dopri5::new(2.0, Vector2::new(0.3, -0.7), IntegratorParams::default());
    let y = solver.advance_by(&Oscillator, 0.0).unwrap();

    assert_eq!(y, Vector2::new(0.3, -0.7));
    assert_eq!(solver.t(), 2.0);
}

#[test]
fn dopri_rejects_negative_delta() {
    let mut solver = Dopri5::new(0.0, Vector1::new(1.0), IntegratorParams::default());

    assert_eq!(solver.advance_by(&Decay, -1.0), Err(SimError::InvalidTimeDelta(-1.0)));
    assert!(matches!(solver.advance_by(&Decay, f64::NAN), Err(SimError::InvalidTimeDelta(_))));
}

#[test]
fn dopri_internal_step_cap() {
    let params = IntegratorParams {
        max_internal_steps: 1,
        ..IntegratorParams::default()
    };
    let mut solver = Dopri5::new(0.0, Vector1::new(1.0), params);

    let result = solver.advance_by(&Decay, 100.0);
    assert!(matches!(result, Err(SimError::TooManySteps { .. })), "got {:?}", result);
}

#[test]
fn dopri_is_deterministic() {
    let run = || {
        let mut solver = Dopri5::new(0.0, Vector2::new(1.0, 0.5), IntegratorParams::default());
        (0..20).map(|_| solver.advance_by(&Oscillator, 0.37).unwrap()).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
