use labsim::simulation::constants::STANDARD_GRAVITY;
use labsim::{
    flight_summary, Calculator, DragLaw, OdeSystem, Polar, Projectile, ProjectileCalculator,
    ProjectileFlight, Vector2D,
};
use labsim::simulation::forces::ProjectileEquation;
use nalgebra::Vector4;

const SAMPLING: f64 = 1.0 / 1024.0;

/// Projectile launched from the origin
pub fn launch(speed: f64, angle_deg: f64, mass: f64) -> Projectile {
    Projectile {
        time: 0.0,
        position: Vector2D::zeros(),
        velocity: Vector2D::from_polar(speed, angle_deg.to_radians()),
        mass,
    }
}

/// Run a full flight and return `(flight time, distance)`
pub fn fly(projectile: Projectile, law: DragLaw, rate: f64) -> (f64, f64) {
    let calculator = ProjectileCalculator::new(projectile, law, rate, STANDARD_GRAVITY);
    let trajectory = ProjectileFlight::new(calculator, SAMPLING)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    flight_summary(&trajectory).unwrap()
}

fn assert_close(actual: f64, expected: f64, rel: f64, what: &str) {
    assert!(
        ((actual - expected) / expected).abs() < rel,
        "{}: got {}, expected {}",
        what,
        actual,
        expected
    );
}

// ==================================================================================
// Reference flights
// ==================================================================================

#[test]
fn no_drag_flights_match_reference() {
    let cases = [
        (42.0, 42.0, 5.72956, 178.831),
        (69.0, 69.0, 13.1329, 324.743),
        (228.0, 28.0, 21.8225, 4393.14),
    ];
    for (speed, angle, time, distance) in cases {
        let (t, d) = fly(launch(speed, angle, 1.0), DragLaw::Linear, 0.0);
        assert_close(t, time, 1e-3, "flight time");
        assert_close(d, distance, 1e-3, "distance");
    }
}

#[test]
fn no_drag_matches_closed_form() {
    let (speed, angle) = (42.0_f64, 42.0_f64.to_radians());
    let (t, d) = fly(launch(speed, 42.0, 1.0), DragLaw::Quadratic, 0.0);

    let expected_t = 2.0 * speed * angle.sin() / STANDARD_GRAVITY;
    let expected_d = speed * speed * (2.0 * angle).sin() / STANDARD_GRAVITY;
    assert!((t - expected_t).abs() < 1e-5, "flight time {} vs {}", t, expected_t);
    assert!((d - expected_d).abs() < 1e-3, "distance {} vs {}", d, expected_d);
}

#[test]
fn linear_drag_flights_match_reference() {
    let cases = [
        (42.0, 42.0, 4.2, 0.42, 5.26898, 127.834),
        (69.0, 69.0, 6.9, 0.69, 11.12, 165.91),
        (228.0, 28.0, 2.28, 0.28, 16.5612, 1424.79),
    ];
    for (speed, angle, mass, rate, time, distance) in cases {
        let (t, d) = fly(launch(speed, angle, mass), DragLaw::Linear, rate);
        assert_close(t, time, 1e-3, "flight time");
        assert_close(d, distance, 1e-3, "distance");
    }
}

// ==================================================================================
// Drag laws
// ==================================================================================

#[test]
fn drag_shortens_every_flight() {
    let (_, free) = fly(launch(42.0, 42.0, 1.0), DragLaw::Linear, 0.0);
    for (law, rate) in [(DragLaw::Constant, 0.5), (DragLaw::Linear, 0.1), (DragLaw::Quadratic, 0.01)] {
        let (_, d) = fly(launch(42.0, 42.0, 1.0), law, rate);
        assert!(d < free, "{:?} drag did not shorten the flight: {} >= {}", law, d, free);
    }
}

#[test]
fn drag_opposes_motion_on_each_axis() {
    for law in [DragLaw::Constant, DragLaw::Linear, DragLaw::Quadratic] {
        assert!(law.deceleration(0.3, 2.0) > 0.0);
        assert!(law.deceleration(0.3, -2.0) < 0.0);
    }
    assert_eq!(DragLaw::Quadratic.deceleration(0.5, -3.0), -4.5);
}

#[test]
fn constant_drag_vanishes_at_rest() {
    let equation = ProjectileEquation {
        law: DragLaw::Constant,
        k: 2.0,
        g: STANDARD_GRAVITY,
    };
    let d = equation.derivatives(0.0, &Vector4::new(0.0, 10.0, 0.0, 0.0));

    assert_eq!(d, Vector4::new(0.0, 0.0, 0.0, -STANDARD_GRAVITY));
}

// ==================================================================================
// Driver behaviour
// ==================================================================================

#[test]
fn flight_starts_at_launch_and_ends_on_the_ground() {
    let calculator = ProjectileCalculator::new(launch(30.0, 60.0, 1.0), DragLaw::Linear, 0.05, STANDARD_GRAVITY);
    let trajectory = ProjectileFlight::new(calculator, 0.01)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let first = &trajectory[0];
    let last = trajectory.last().unwrap();
    assert_eq!(first.time, 0.0);
    assert_eq!(first.position, Vector2D::zeros());
    assert_eq!(last.position.y, 0.0);
    assert!(last.velocity.y < 0.0, "should be falling at impact: {:?}", last.velocity);

    // only the last sample touches the ground
    assert!(trajectory[1..trajectory.len() - 1].iter().all(|p| p.position.y > 0.0));
    assert!(trajectory.windows(2).all(|w| w[1].time > w[0].time));
}

#[test]
fn zero_delta_returns_current_state() {
    let mut calculator = ProjectileCalculator::new(launch(20.0, 45.0, 1.0), DragLaw::Linear, 0.1, STANDARD_GRAVITY);
    let moved = calculator.advance(0.25).unwrap();
    let queried = calculator.advance(0.0).unwrap();

    assert_eq!(moved, queried);
    assert_eq!(calculator.state(), &queried);
}

#[test]
fn max_steps_guard_stops_a_long_flight() {
    let calculator = ProjectileCalculator::new(launch(228.0, 28.0, 1.0), DragLaw::Linear, 0.0, STANDARD_GRAVITY);
    let items: Vec<_> = ProjectileFlight::new(calculator, SAMPLING).with_max_steps(10).collect();

    assert_eq!(items.len(), 12, "initial + 10 steps + error");
    assert!(items[..11].iter().all(|r| r.is_ok()));
    assert!(items[11].is_err());
}
