//! Simulation drivers and trajectory post-processing
//!
//! [`Simulation`] is a lazy, finite, forward-only iterator: it yields the
//! initial state, then advances its calculator by a fixed sampling delta and
//! yields each new state until a criterion fires. The state that fired is the
//! last one yielded. Errors are yielded once and end the run.

use std::iter::FusedIterator;

use tracing::{debug, warn};

use crate::error::SimError;
use super::calculator::{Calculator, PlanetFlightCalculator, ProjectileCalculator, ThrustMode};
use super::constants::LANDING_SEED_FUEL_MASS;
use super::criteria::{when, CriteriaSet, EscapeVelocityReached, VelocityGapIncrease};
use super::forces::Thrust;
use super::params::IntegratorParams;
use super::states::{PendulumState, Planet, Projectile, Rocket};
use super::vector::Vector2D;

pub struct Simulation<C: Calculator> {
    calculator: C,
    time_delta: f64,
    criteria: CriteriaSet<C::State>,
    previous: Option<C::State>, // last yielded state, None before the first
    max_steps: Option<usize>, // advances allowed before giving up
    steps: usize,
    stopped_by: Option<&'static str>,
    finished: bool,
}

impl<C: Calculator> Simulation<C> {
    pub fn new(calculator: C, time_delta: f64, criteria: CriteriaSet<C::State>) -> Self {
        Self {
            calculator,
            time_delta,
            criteria,
            previous: None,
            max_steps: None,
            steps: 0,
            stopped_by: None,
            finished: false,
        }
    }

    /// Guard against runs where no criterion ever fires
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Name of the criterion that ended the run
    pub fn stopped_by(&self) -> Option<&'static str> {
        self.stopped_by
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    fn fail(&mut self, error: SimError) -> Option<Result<C::State, SimError>> {
        self.finished = true;
        Some(Err(error))
    }
}

impl<C: Calculator> Iterator for Simulation<C> {
    type Item = Result<C::State, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let Some(previous) = self.previous.take() else {
            return match self.calculator.advance(0.0) {
                Ok(initial) => {
                    self.previous = Some(initial.clone());
                    Some(Ok(initial))
                }
                Err(e) => self.fail(e),
            };
        };

        if let Some(max_steps) = self.max_steps {
            if self.steps >= max_steps {
                warn!(max_steps, "simulation step budget exhausted");
                return self.fail(SimError::StepBudgetExhausted { max_steps });
            }
        }

        let current = match self.calculator.advance(self.time_delta) {
            Ok(state) => state,
            Err(e) => return self.fail(e),
        };
        self.steps += 1;

        match self.criteria.first_met(&previous, &current) {
            Some(name) => {
                debug!(criterion = name, steps = self.steps, "simulation finished");
                self.stopped_by = Some(name);
                self.finished = true;
            }
            None => self.previous = Some(current.clone()),
        }
        Some(Ok(current))
    }
}

impl<C: Calculator> FusedIterator for Simulation<C> {}

// =========================================================================================
// Projectile flight
// =========================================================================================

/// Flight until the projectile comes back to the ground
/// The last element is the ground contact point, interpolated between the
/// two states around it
pub struct ProjectileFlight {
    inner: Simulation<ProjectileCalculator>,
    previous: Option<Projectile>,
}

impl ProjectileFlight {
    pub fn new(calculator: ProjectileCalculator, time_delta: f64) -> Self {
        let criteria = CriteriaSet::new()
            .with(when("landed", |_: &Projectile, current: &Projectile| current.position.y <= 0.0));
        Self {
            inner: Simulation::new(calculator, time_delta, criteria),
            previous: None,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.inner = self.inner.with_max_steps(max_steps);
        self
    }
}

impl Iterator for ProjectileFlight {
    type Item = Result<Projectile, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = match self.inner.next()? {
            Ok(state) => state,
            Err(e) => return Some(Err(e)),
        };
        let item = match (&self.previous, self.inner.stopped_by()) {
            (Some(previous), Some(_)) => ground_contact(previous, &current),
            _ => current.clone(),
        };
        self.previous = Some(current);
        Some(Ok(item))
    }
}

impl FusedIterator for ProjectileFlight {}

/// Linear interpolation to `y = 0` between a state above and one at/below ground
pub fn ground_contact(above: &Projectile, below: &Projectile) -> Projectile {
    let drop = above.position.y - below.position.y;
    let fraction = if drop > 0.0 { above.position.y / drop } else { 1.0 };
    let lerp = |a: f64, b: f64| a + (b - a) * fraction;
    Projectile {
        time: lerp(above.time, below.time),
        position: Vector2D::new(lerp(above.position.x, below.position.x), 0.0),
        velocity: above.velocity + (below.velocity - above.velocity) * fraction,
        mass: below.mass,
    }
}

/// `(flight time, horizontal distance)` of a finished trajectory
pub fn flight_summary(trajectory: &[Projectile]) -> Option<(f64, f64)> {
    let first = trajectory.first()?;
    let last = trajectory.last()?;
    Some((last.time, last.position.x - first.position.x))
}

// =========================================================================================
// Rocket flights
// =========================================================================================

/// Powered ascent that stops at escape velocity, or once it cannot get there
pub fn planet_flight(calculator: PlanetFlightCalculator, time_delta: f64) -> Simulation<PlanetFlightCalculator> {
    let planet_mass = calculator.planet_mass();
    let criteria = CriteriaSet::new()
        .with(EscapeVelocityReached { planet_mass })
        .with(VelocityGapIncrease::new(planet_mass));
    Simulation::new(calculator, time_delta, criteria)
}

/// Highest overload seen along a trajectory, in g
pub fn max_overload(trajectory: &[Rocket]) -> f64 {
    trajectory.iter().map(Rocket::overload).fold(0.0, f64::max)
}

/// Landing burn worked out backwards from the surface
#[derive(Debug, Clone)]
pub struct LandingPlan {
    pub trajectory: Vec<Rocket>, // chronological, ignition first, touchdown last
    pub ignition_altitude: f64, // above the surface
    pub fuel_needed: f64, // burnt between ignition and touchdown
}

/// Plan a powered landing with either thrust recipe
///
/// The descent is simulated as an ascent in reversed time: starting on the
/// surface with a seed fuel mass and a negated stream velocity, the rocket
/// gains mass as it climbs. A fixed burn rate is negated too, so fuel flows
/// back into the tanks. States heavier than `initial_mass` are dropped and
/// the rest reversed, so the plan starts at ignition. Times and velocities
/// are flipped back to forward time.
///
/// The seed fuel is still on board at touchdown and is not counted in
/// `fuel_needed`.
pub fn plan_landing(
    planet: &Planet,
    netto_mass: f64,
    initial_mass: f64,
    stream_velocity: f64,
    thrust: Thrust,
    time_delta: f64,
    params: IntegratorParams,
    max_steps: Option<usize>,
) -> Result<LandingPlan, SimError> {
    let rocket = Rocket::at(
        Vector2D::new(0.0, planet.radius),
        netto_mass,
        LANDING_SEED_FUEL_MASS,
        -stream_velocity,
    );
    let (rocket, mode) = match thrust {
        Thrust::FixedAcceleration(deceleration) => {
            (rocket.with_fixed_acceleration(deceleration), ThrustMode::FixedAcceleration)
        }
        Thrust::FixedFuelConsumption(rate) => {
            (rocket.with_fuel_consumption(-rate), ThrustMode::FixedFuelConsumption)
        }
    };

    let calculator = PlanetFlightCalculator::with_params(rocket, mode, planet.mass, params)?;
    let mut simulation = planet_flight(calculator, time_delta);
    if let Some(max_steps) = max_steps {
        simulation = simulation.with_max_steps(max_steps);
    }

    let mut trajectory = simulation
        .filter(|r| r.as_ref().map_or(true, |r| r.mass() <= initial_mass))
        .collect::<Result<Vec<_>, _>>()?;
    trajectory.reverse();

    // back to forward time: clock starts at ignition, the rocket descends
    let t_ignition = trajectory.first().map_or(0.0, |r| r.time);
    for rocket in trajectory.iter_mut() {
        rocket.time = t_ignition - rocket.time;
        rocket.velocity = -rocket.velocity;
        rocket.stream_velocity = stream_velocity;
        rocket.fuel_consumption = rocket.fuel_consumption.map(f64::abs);
    }

    let (ignition, touchdown) = match (trajectory.first(), trajectory.last()) {
        (Some(ignition), Some(touchdown)) => (ignition, touchdown),
        _ => {
            return Err(SimError::InvalidScenario(format!(
                "initial mass {initial_mass} does not cover the dry mass {netto_mass}"
            )))
        }
    };

    Ok(LandingPlan {
        ignition_altitude: ignition.position.y - planet.radius,
        fuel_needed: ignition.fuel_mass - touchdown.fuel_mass,
        trajectory,
    })
}

// =========================================================================================
// Pendulum analysis
// =========================================================================================

/// Turning points of the swing
/// The first state counts as an extreme, since the pendulum starts at rest
pub fn find_extremes(trajectory: &[PendulumState]) -> Vec<PendulumState> {
    let mut extremes: Vec<PendulumState> = trajectory.first().cloned().into_iter().collect();
    extremes.extend(trajectory.windows(3).filter_map(|w| {
        let before = w[1].angle - w[0].angle;
        let after = w[2].angle - w[1].angle;
        (before * after < 0.0).then(|| w[1].clone())
    }));
    extremes
}

/// Mean period from consecutive turning points (two per period)
pub fn mean_period(extremes: &[PendulumState]) -> Option<f64> {
    let (first, last) = (extremes.first()?, extremes.last()?);
    if extremes.len() < 2 {
        return None;
    }
    Some(2.0 * (last.time - first.time) / (extremes.len() - 1) as f64)
}

/// Small-angle period of a rod pendulum
pub fn theoretical_period(length: f64, g: f64) -> f64 {
    2.0 * std::f64::consts::PI * (2.0 * length / (3.0 * g)).sqrt()
}

/// Largest absolute departure of the full energy from its initial value
pub fn energy_drift(trajectory: &[PendulumState]) -> f64 {
    let Some(first) = trajectory.first() else {
        return 0.0;
    };
    let e0 = first.full_energy();
    trajectory
        .iter()
        .map(|s| (s.full_energy() - e0).abs())
        .fold(0.0, f64::max)
}
