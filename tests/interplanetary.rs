use labsim::simulation::constants::{MARS_MASS, MARS_RADIUS, SUN_MASS, EARTH_ORBIT_RADIUS};
use labsim::{
    did_reach_target_x, did_turn_back, line_intersects_circle, Calculator, CriteriaSet, Criterion,
    HungerTimeout, InterplanetaryCalculator, Planet, PlanetReached, ReachTest, ReachedTargetX,
    Rocket, Simulation, TurnedBack, Vector2D,
};

const HOUR: f64 = 3600.0;

pub fn coasting(position: Vector2D, velocity: Vector2D) -> Rocket {
    Rocket::at(position, 1000.0, 0.0, 0.0).with_velocity(velocity)
}

pub fn mars_at(x: f64) -> Planet {
    Planet::new("Mars", Vector2D::new(x, 0.0), MARS_MASS, MARS_RADIUS)
}

/// Drain a coasting flight and return the trajectory with the stop reason
pub fn coast(rocket: Rocket, planets: Vec<Planet>, dt: f64, criteria: CriteriaSet<Rocket>) -> (Vec<Rocket>, Option<&'static str>) {
    let calculator = InterplanetaryCalculator::new(rocket, planets);
    let mut simulation = Simulation::new(calculator, dt, criteria).with_max_steps(10_000);
    let trajectory = simulation.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
    (trajectory, simulation.stopped_by())
}

// ==================================================================================
// Gravity
// ==================================================================================

#[test]
fn gravity_points_to_planet_and_vanishes_at_centre() {
    let mars = mars_at(1e9);
    let pull = mars.gravity_at(&Vector2D::new(0.0, 0.0));

    assert!(pull.x > 0.0 && pull.y == 0.0, "pull should point at the planet: {:?}", pull);
    assert_eq!(mars.gravity_at(&mars.position), Vector2D::zeros());

    let near = mars.gravity_at(&Vector2D::new(1e9 - 1e7, 0.0)).norm();
    let far = mars.gravity_at(&Vector2D::new(1e9 - 2e7, 0.0)).norm();
    assert!((near / far - 4.0).abs() < 1e-9, "inverse square ratio {}", near / far);
}

#[test]
fn zero_delta_returns_initial_rocket() {
    let rocket = coasting(Vector2D::new(5.0, 6.0), Vector2D::new(7.0, 8.0));
    let mut calculator = InterplanetaryCalculator::new(rocket.clone(), vec![mars_at(1e9)]);

    assert_eq!(calculator.advance(0.0).unwrap(), rocket);
}

#[test]
fn acceleration_is_finite_difference_of_velocity() {
    let sun = Planet::new("Sun", Vector2D::new(-EARTH_ORBIT_RADIUS, 0.0), SUN_MASS, 1.0);
    let mut calculator = InterplanetaryCalculator::new(coasting(Vector2D::zeros(), Vector2D::new(100.0, 0.0)), vec![sun]);

    let before = calculator.state().clone();
    let after = calculator.advance(HOUR).unwrap();
    let expected = (after.velocity - before.velocity) / HOUR;

    assert_eq!(after.acceleration, expected);
    assert!(after.acceleration.x < 0.0);
    assert_eq!(after.mass(), before.mass());
}

// ==================================================================================
// Arrival
// ==================================================================================

#[test]
fn rocket_aimed_at_planet_reaches_it() {
    let mars = mars_at(1e9);
    for test in [ReachTest::Proximity, ReachTest::Crossing] {
        let criteria = CriteriaSet::new().with(PlanetReached { planet: mars.clone(), test });
        let (trajectory, stopped_by) = coast(
            coasting(Vector2D::new(0.0, 1e7), Vector2D::new(1e4, 0.0)),
            vec![mars.clone()],
            HOUR,
            criteria,
        );
        let last = trajectory.last().unwrap();
        let distance = (last.position - mars.position).norm();

        assert_eq!(stopped_by, Some("planet reached"), "{:?}", test);
        assert!(distance < mars.capture_radius() + 1e4 * HOUR * 1.1, "{:?}: stopped {} m away", test, distance);
        assert!(trajectory.len() > 10);
    }
}

#[test]
fn crossing_test_catches_overshoot() {
    // one step jumps clean over the capture circle
    let mars = mars_at(1e9);
    let start = coasting(Vector2D::new(0.0, 1e8), Vector2D::new(1e5, 0.0));

    let proximity = CriteriaSet::new()
        .with(PlanetReached { planet: mars.clone(), test: ReachTest::Proximity })
        .with(ReachedTargetX { target_x: 3e9 });
    let (_, missed) = coast(start.clone(), vec![mars.clone()], 2e4, proximity);
    assert_eq!(missed, Some("target reached"));

    let crossing = CriteriaSet::new()
        .with(PlanetReached { planet: mars.clone(), test: ReachTest::Crossing })
        .with(ReachedTargetX { target_x: 3e9 });
    let (trajectory, hit) = coast(start, vec![mars], 2e4, crossing);
    assert_eq!(hit, Some("planet reached"));
    assert_eq!(trajectory.len(), 2);
}

#[test]
fn line_circle_intersection_cases() {
    let c = Vector2D::new(0.0, 0.0);
    let p = |x: f64, y: f64| Vector2D::new(x, y);

    assert!(line_intersects_circle(&p(-5.0, 0.5), &p(5.0, 0.5), &c, 1.0), "passes through");
    assert!(line_intersects_circle(&p(-5.0, 0.0), &p(0.0, 0.0), &c, 1.0), "ends inside");
    assert!(line_intersects_circle(&p(-0.1, 0.0), &p(0.1, 0.0), &c, 1.0), "fully inside");
    assert!(!line_intersects_circle(&p(-5.0, 2.0), &p(5.0, 2.0), &c, 1.0), "passes by");
    assert!(!line_intersects_circle(&p(2.0, 0.0), &p(5.0, 0.0), &c, 1.0), "points away");
    assert!(line_intersects_circle(&p(0.5, 0.0), &p(0.5, 0.0), &c, 1.0), "stationary inside");
}

// ==================================================================================
// Aborts
// ==================================================================================

#[test]
fn turning_back_aborts_the_flight() {
    let sun = Planet::new("Sun", Vector2D::new(-EARTH_ORBIT_RADIUS, 0.0), SUN_MASS, 1.0);
    let criteria = CriteriaSet::new().with(TurnedBack);
    let (trajectory, stopped_by) = coast(
        coasting(Vector2D::zeros(), Vector2D::new(100.0, 0.0)),
        vec![sun],
        HOUR,
        criteria,
    );

    assert_eq!(stopped_by, Some("turned back"));
    assert_eq!(trajectory.len(), 6);
    assert!(did_turn_back(trajectory.last().unwrap()));
    assert!(trajectory[..5].iter().all(|r| !did_turn_back(r)));
}

#[test]
fn hunger_ends_a_long_trip() {
    let criteria = CriteriaSet::new()
        .with(PlanetReached { planet: mars_at(1e12), test: ReachTest::Crossing })
        .with(HungerTimeout::new(10.0 * HOUR));
    let (trajectory, stopped_by) = coast(
        coasting(Vector2D::zeros(), Vector2D::new(1.0, 0.0)),
        vec![],
        HOUR,
        criteria,
    );

    assert_eq!(stopped_by, Some("crew starved"));
    assert_eq!(trajectory.len(), 12);
    assert_eq!(trajectory.last().unwrap().time, 11.0 * HOUR);
}

#[test]
fn hunger_timer_accumulates_elapsed_time() {
    let mut timer = HungerTimeout::new(2.5);
    let at = |t: f64| {
        let mut r = coasting(Vector2D::zeros(), Vector2D::zeros());
        r.time = t;
        r
    };

    assert!(!timer.is_met(&at(0.0), &at(1.0)));
    assert!(!timer.is_met(&at(1.0), &at(2.0)));
    assert!(timer.is_met(&at(2.0), &at(3.0)));
    assert_eq!(timer.elapsed(), 3.0);
}

#[test]
fn target_x_is_inclusive() {
    let rocket = coasting(Vector2D::new(10.0, 0.0), Vector2D::zeros());

    assert!(did_reach_target_x(10.0, &rocket));
    assert!(!did_reach_target_x(10.5, &rocket));
}
