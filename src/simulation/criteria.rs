//! Termination and phase-transition criteria
//!
//! Plain predicates live here as free functions. Drivers consume them through
//! the [`Criterion`] trait, collected into a [`CriteriaSet`] where the first
//! criterion that fires ends the run. Detectors that need memory of earlier
//! steps are small structs and must be built fresh for every run.

use super::constants::{G, MAX_HUMANLY_VIABLE_OVERLOAD, SLIPPAGE_EPSILON};
use super::states::{Ball, Environment, Planet, Rocket, Timed};
use super::trig;
use super::vector::Vector2D;

// =========================================================================================
// Predicates
// =========================================================================================

pub fn escape_velocity(height: f64, planet_mass: f64) -> f64 {
    (2.0 * G * planet_mass / height).sqrt()
}

/// Vertical speed at or above escape velocity for the current altitude
pub fn did_leave_the_planet(rocket: &Rocket, planet_mass: f64) -> bool {
    rocket.velocity.y >= escape_velocity(rocket.position.y, planet_mass)
}

pub fn is_slippage_finished(ball: &Ball) -> bool {
    ball.contact_speed().abs() < SLIPPAGE_EPSILON
}

/// Friction can stop the slipping only if `mu >= 2/7 * tan(angle)`
pub fn is_rolling_possible(env: &Environment) -> bool {
    env.friction_coefficient >= 2.0 / 7.0 * trig::tan(env.incline_angle)
}

/// Any sample above the overload limit makes the whole flight lethal
pub fn is_astronaut_dead(trajectory: &[Rocket]) -> bool {
    trajectory
        .iter()
        .any(|r| r.overload() > MAX_HUMANLY_VIABLE_OVERLOAD)
}

pub fn did_turn_back(rocket: &Rocket) -> bool {
    rocket.velocity.x < 0.0
}

pub fn did_reach_target_x(target_x: f64, rocket: &Rocket) -> bool {
    target_x <= rocket.position.x
}

/// Whether the segment `from -> to` touches the circle at `center`
pub fn line_intersects_circle(from: &Vector2D, to: &Vector2D, center: &Vector2D, radius: f64) -> bool {
    let d = to - from;
    let f = from - center;

    let a = d.dot(&d);
    let c = f.dot(&f) - radius * radius;
    if a == 0.0 {
        return c <= 0.0;
    }
    let b = 2.0 * f.dot(&d);

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return false;
    }

    let root = discriminant.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);

    let on_segment = |t: f64| (0.0..=1.0).contains(&t);
    // whole segment inside the circle counts too
    on_segment(t1) || on_segment(t2) || (t1 < 0.0 && t2 > 1.0)
}

// =========================================================================================
// Criterion trait and set
// =========================================================================================

/// A condition checked after every step, given the previous and new state
pub trait Criterion<S> {
    fn name(&self) -> &'static str;
    fn is_met(&mut self, previous: &S, current: &S) -> bool;
}

/// Criteria combined with "or" semantics
pub struct CriteriaSet<S> {
    criteria: Vec<Box<dyn Criterion<S> + Send + Sync>>,
}

impl<S> CriteriaSet<S> {
    pub fn new() -> Self {
        Self {
            criteria: Vec::new(),
        }
    }

    /// Add a criterion; earlier ones are checked first
    pub fn with<T>(mut self, criterion: T) -> Self
    where
        T: Criterion<S> + Send + Sync + 'static,
    {
        self.criteria.push(Box::new(criterion));
        self
    }

    /// Name of the first criterion met by this step, if any
    pub fn first_met(&mut self, previous: &S, current: &S) -> Option<&'static str> {
        self.criteria
            .iter_mut()
            .find_map(|c| if c.is_met(previous, current) { Some(c.name()) } else { None })
    }
}

impl<S> Default for CriteriaSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateless criterion built from a closure, see [`when`]
pub struct FnCriterion<F> {
    name: &'static str,
    predicate: F,
}

/// Wrap a closure over `(previous, current)` as a named criterion
pub fn when<S, F>(name: &'static str, predicate: F) -> FnCriterion<F>
where
    F: FnMut(&S, &S) -> bool,
{
    FnCriterion { name, predicate }
}

impl<S, F> Criterion<S> for FnCriterion<F>
where
    F: FnMut(&S, &S) -> bool,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_met(&mut self, previous: &S, current: &S) -> bool {
        (self.predicate)(previous, current)
    }
}

// =========================================================================================
// Rocket criteria
// =========================================================================================

pub struct EscapeVelocityReached {
    pub planet_mass: f64,
}

impl Criterion<Rocket> for EscapeVelocityReached {
    fn name(&self) -> &'static str {
        "escape velocity reached"
    }

    fn is_met(&mut self, _previous: &Rocket, current: &Rocket) -> bool {
        did_leave_the_planet(current, self.planet_mass)
    }
}

/// Fires once the gap to escape velocity starts widening again,
/// meaning the rocket can no longer catch up
pub struct VelocityGapIncrease {
    planet_mass: f64,
    previous_gap: Option<f64>,
}

impl VelocityGapIncrease {
    pub fn new(planet_mass: f64) -> Self {
        Self {
            planet_mass,
            previous_gap: None,
        }
    }
}

impl Criterion<Rocket> for VelocityGapIncrease {
    fn name(&self) -> &'static str {
        "velocity gap increasing"
    }

    fn is_met(&mut self, _previous: &Rocket, current: &Rocket) -> bool {
        let gap = escape_velocity(current.position.y, self.planet_mass) - current.velocity.y;
        let widening = self.previous_gap.is_some_and(|prev| gap > prev);
        self.previous_gap = Some(gap);
        widening
    }
}

/// How arrival at a planet is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachTest {
    /// Current position inside the capture radius
    Proximity,
    /// Segment between the last two positions touches the capture circle
    Crossing,
}

pub struct PlanetReached {
    pub planet: Planet,
    pub test: ReachTest,
}

impl Criterion<Rocket> for PlanetReached {
    fn name(&self) -> &'static str {
        "planet reached"
    }

    fn is_met(&mut self, previous: &Rocket, current: &Rocket) -> bool {
        let radius = self.planet.capture_radius();
        match self.test {
            ReachTest::Proximity => {
                (current.position - self.planet.position).norm_squared() < radius * radius
            }
            ReachTest::Crossing => line_intersects_circle(
                &previous.position,
                &current.position,
                &self.planet.position,
                radius,
            ),
        }
    }
}

pub struct TurnedBack;

impl Criterion<Rocket> for TurnedBack {
    fn name(&self) -> &'static str {
        "turned back"
    }

    fn is_met(&mut self, _previous: &Rocket, current: &Rocket) -> bool {
        did_turn_back(current)
    }
}

pub struct ReachedTargetX {
    pub target_x: f64,
}

impl Criterion<Rocket> for ReachedTargetX {
    fn name(&self) -> &'static str {
        "target reached"
    }

    fn is_met(&mut self, _previous: &Rocket, current: &Rocket) -> bool {
        did_reach_target_x(self.target_x, current)
    }
}

// =========================================================================================
// Time criteria
// =========================================================================================

/// Accumulates elapsed simulated time and fires once it exceeds `limit`
pub struct HungerTimeout {
    limit: f64,
    elapsed: f64,
}

impl HungerTimeout {
    pub fn new(limit: f64) -> Self {
        Self { limit, elapsed: 0.0 }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl<S: Timed> Criterion<S> for HungerTimeout {
    fn name(&self) -> &'static str {
        "crew starved"
    }

    fn is_met(&mut self, previous: &S, current: &S) -> bool {
        self.elapsed += current.time() - previous.time();
        self.elapsed > self.limit
    }
}

/// Fires on the first state past `end`
pub struct TimeLimit {
    pub end: f64,
}

impl<S: Timed> Criterion<S> for TimeLimit {
    fn name(&self) -> &'static str {
        "time limit"
    }

    fn is_met(&mut self, _previous: &S, current: &S) -> bool {
        current.time() > self.end
    }
}

// =========================================================================================
// Rolling criteria
// =========================================================================================

pub struct ReachedEndOfIncline {
    pub plane_length: f64,
}

impl Criterion<Ball> for ReachedEndOfIncline {
    fn name(&self) -> &'static str {
        "end of incline"
    }

    fn is_met(&mut self, _previous: &Ball, current: &Ball) -> bool {
        current.position >= self.plane_length
    }
}
