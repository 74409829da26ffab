//! Build runnable labs from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing), validates it, and produces a
//! `Scenario` holding the calculator and criteria for one lab. Running the
//! scenario drains its driver and condenses the trajectory into a `Report`.

use std::fmt;

use tracing::info;

use crate::configuration::config::{
    DragLawConfig, InterplanetaryConfig, LabConfig, MarsLandingConfig, PlanetConfig,
    PlanetFlightConfig, ReachTestConfig, RollingConfig, ScenarioConfig, ThrustConfig,
};
use crate::error::SimError;
use super::calculator::{
    Calculator, InterplanetaryCalculator, PendulumCalculator, PlanetFlightCalculator,
    ProjectileCalculator, RollingCalculator, ThrustMode,
};
use super::constants::{
    APPROXIMATE_TAKE_OFF_HEIGHT, EARTH_MASS, EARTH_ORBIT_RADIUS, EARTH_RADIUS,
    HUMAN_EXPIRATION_TIME, MARS_MASS, MARS_ORBIT_RADIUS, MARS_RADIUS, STANDARD_GRAVITY, SUN_MASS,
    SUN_RADIUS, DAY,
};
use super::criteria::{
    did_leave_the_planet, is_astronaut_dead, CriteriaSet, HungerTimeout, PlanetReached,
    ReachTest, ReachedEndOfIncline, TimeLimit, TurnedBack,
};
use super::engine::{
    energy_drift, find_extremes, flight_summary, max_overload, mean_period, plan_landing,
    planet_flight, theoretical_period, ProjectileFlight, Simulation,
};
use super::forces::{DragLaw, Thrust};
use super::params::IntegratorParams;
use super::states::{Ball, Environment, PendulumState, Planet, Projectile, Rocket};
use super::vector::{Polar, Vector2D};

/// A lab ready to run
pub enum Lab {
    Projectile(ProjectileFlight),
    PlanetFlight {
        simulation: Simulation<PlanetFlightCalculator>,
        planet: Planet,
    },
    Interplanetary {
        simulation: Simulation<InterplanetaryCalculator>,
    },
    MarsLanding {
        config: MarsLandingConfig,
        thrust: Thrust,
        params: IntegratorParams,
    },
    Rolling(Simulation<RollingCalculator>),
    Pendulum {
        simulation: Simulation<PendulumCalculator>,
        length: f64,
    },
}

pub struct Scenario {
    pub lab: Lab,
    pub max_steps: Option<usize>, // driver guard
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Projectile {
        samples: usize,
        flight_time: f64,
        distance: f64,
    },
    PlanetFlight {
        samples: usize,
        escaped: bool,
        time: f64,
        final_velocity: f64,
        fuel_left: f64,
        max_overload: f64,
        astronaut_survived: bool,
    },
    Interplanetary {
        samples: usize,
        outcome: &'static str,
        reached_target: bool,
        travel_days: f64,
        astronaut_survived: bool,
    },
    MarsLanding {
        samples: usize,
        ignition_altitude: f64,
        fuel_needed: f64,
        max_overload: f64,
        astronaut_survived: bool,
    },
    Rolling {
        samples: usize,
        rolling_possible: bool,
        slippage_end_time: Option<f64>,
        travel_time: f64,
        final_velocity: f64,
    },
    Pendulum {
        samples: usize,
        mean_period: Option<f64>,
        theoretical_period: f64,
        energy_drift: f64,
    },
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, SimError> {
        let params = cfg.integrator.params();
        let max_steps = cfg.integrator.max_steps;

        let lab = match cfg.lab {
            LabConfig::Projectile(p) => {
                require_positive("mass", p.mass)?;
                require_positive("time_delta", p.time_delta)?;
                let projectile = Projectile {
                    time: 0.0,
                    position: Vector2D::new(0.0, p.height),
                    velocity: Vector2D::from_polar(p.velocity, p.angle.to_radians()),
                    mass: p.mass,
                };
                let (law, rate) = match p.drag {
                    DragLawConfig::None => (DragLaw::Linear, 0.0),
                    DragLawConfig::Constant => (DragLaw::Constant, p.drag_rate),
                    DragLawConfig::Linear => (DragLaw::Linear, p.drag_rate),
                    DragLawConfig::Quadratic => (DragLaw::Quadratic, p.drag_rate),
                };
                let calculator = ProjectileCalculator::with_params(projectile, law, rate, p.g, params);
                Lab::Projectile(ProjectileFlight::new(calculator, p.time_delta))
            }
            LabConfig::PlanetFlight(p) => Self::build_planet_flight(p, params)?,
            LabConfig::Interplanetary(p) => Self::build_interplanetary(p, params)?,
            LabConfig::MarsLanding(p) => {
                require_positive("netto_mass", p.netto_mass)?;
                require_positive("time_delta", p.time_delta)?;
                if p.initial_mass <= p.netto_mass {
                    return Err(SimError::InvalidScenario(
                        "initial_mass must exceed netto_mass".into(),
                    ));
                }
                let thrust = match p.thrust {
                    ThrustConfig::FixedAcceleration => p
                        .deceleration_g
                        .map(|a| Thrust::FixedAcceleration(a * STANDARD_GRAVITY))
                        .ok_or(SimError::MissingAcceleration)?,
                    ThrustConfig::FixedFuelRate => p
                        .fuel_consumption
                        .map(Thrust::FixedFuelConsumption)
                        .ok_or(SimError::MissingFuelConsumption)?,
                };
                Lab::MarsLanding { config: p, thrust, params }
            }
            LabConfig::Rolling(p) => Self::build_rolling(p, params)?,
            LabConfig::Pendulum(p) => {
                require_positive("length", p.length)?;
                require_positive("weight", p.weight)?;
                require_positive("time_delta", p.time_delta)?;
                let state = PendulumState::released(p.length, p.weight, p.angle.to_radians(), p.friction);
                let criteria = CriteriaSet::new().with(TimeLimit { end: p.simulation_time });
                Lab::Pendulum {
                    simulation: Simulation::new(PendulumCalculator::with_params(state, params), p.time_delta, criteria),
                    length: p.length,
                }
            }
        };

        Ok(Self { lab, max_steps })
    }

    fn build_planet_flight(p: PlanetFlightConfig, params: IntegratorParams) -> Result<Lab, SimError> {
        require_positive("initial_mass", p.initial_mass)?;
        require_positive("time_delta", p.time_delta)?;
        if !(0.0..1.0).contains(&p.fuel_ratio) {
            return Err(SimError::InvalidScenario("fuel_ratio must be in [0, 1)".into()));
        }

        let planet = planet(p.planet);
        let fuel_mass = p.initial_mass * p.fuel_ratio;
        let mut rocket = Rocket::at(
            Vector2D::new(0.0, planet.radius),
            p.initial_mass - fuel_mass,
            fuel_mass,
            p.stream_velocity,
        );
        rocket.fixed_acceleration = p.acceleration_g.map(|a| a * STANDARD_GRAVITY);
        rocket.fuel_consumption = p.fuel_consumption;

        let mode = match p.thrust {
            ThrustConfig::FixedAcceleration => ThrustMode::FixedAcceleration,
            ThrustConfig::FixedFuelRate => ThrustMode::FixedFuelConsumption,
        };
        let calculator = PlanetFlightCalculator::with_params(rocket, mode, planet.mass, params)?;
        Ok(Lab::PlanetFlight {
            simulation: planet_flight(calculator, p.time_delta),
            planet,
        })
    }

    /// Earth at the origin, the Sun behind it and Mars ahead on the x axis
    fn build_interplanetary(p: InterplanetaryConfig, params: IntegratorParams) -> Result<Lab, SimError> {
        require_positive("time_delta", p.time_delta)?;

        let earth = Planet::new("Earth", Vector2D::zeros(), EARTH_MASS, EARTH_RADIUS);
        let mars = Planet::new(
            "Mars",
            Vector2D::new(MARS_ORBIT_RADIUS - EARTH_ORBIT_RADIUS, 0.0),
            MARS_MASS,
            MARS_RADIUS,
        );
        let sun = Planet::new("Sun", Vector2D::new(-EARTH_ORBIT_RADIUS, 0.0), SUN_MASS, SUN_RADIUS);

        let angle = p.angle.to_radians();
        let rocket = Rocket::at(
            Vector2D::from_polar(EARTH_RADIUS + APPROXIMATE_TAKE_OFF_HEIGHT, angle),
            0.0,
            0.0,
            0.0,
        )
        .with_velocity(Vector2D::from_polar(p.velocity, angle));

        let planets = if p.planet_gravity {
            vec![earth, mars.clone(), sun]
        } else {
            vec![sun]
        };

        let test = match p.reach {
            ReachTestConfig::Proximity => ReachTest::Proximity,
            ReachTestConfig::Crossing => ReachTest::Crossing,
        };
        let mut criteria = CriteriaSet::new()
            .with(PlanetReached { planet: mars, test })
            .with(HungerTimeout::new(HUMAN_EXPIRATION_TIME));
        if p.abort_on_turn_back {
            criteria = criteria.with(TurnedBack);
        }

        let calculator = InterplanetaryCalculator::with_params(rocket, planets, params);
        Ok(Lab::Interplanetary {
            simulation: Simulation::new(calculator, p.time_delta, criteria),
        })
    }

    fn build_rolling(p: RollingConfig, params: IntegratorParams) -> Result<Lab, SimError> {
        require_positive("mass", p.mass)?;
        require_positive("radius", p.radius)?;
        require_positive("plane_length", p.plane_length)?;
        require_positive("time_delta", p.time_delta)?;
        if p.incline_angle == 0.0 && p.velocity == 0.0 && p.angular_velocity == 0.0 {
            return Err(SimError::InvalidScenario(
                "a ball at rest on a flat plane never moves".into(),
            ));
        }

        let environment = Environment::new(p.g, p.incline_angle.to_radians(), p.friction, p.plane_length);
        let ball = Ball::new(p.mass, p.radius, p.velocity, p.angular_velocity);
        let criteria = CriteriaSet::new().with(ReachedEndOfIncline {
            plane_length: environment.plane_length,
        });
        let calculator = RollingCalculator::with_params(ball, environment, params);
        Ok(Lab::Rolling(Simulation::new(calculator, p.time_delta, criteria)))
    }

    /// Drain the driver and summarize the trajectory
    pub fn run(self) -> Result<Report, SimError> {
        let max_steps = self.max_steps;
        let report = match self.lab {
            Lab::Projectile(flight) => {
                let flight = match max_steps {
                    Some(n) => flight.with_max_steps(n),
                    None => flight,
                };
                let trajectory = flight.collect::<Result<Vec<_>, _>>()?;
                let (flight_time, distance) = flight_summary(&trajectory).unwrap_or_default();
                Report::Projectile {
                    samples: trajectory.len(),
                    flight_time,
                    distance,
                }
            }
            Lab::PlanetFlight { simulation, planet } => {
                let (trajectory, _) = drain(simulation, max_steps)?;
                let last = last_state(&trajectory)?;
                Report::PlanetFlight {
                    samples: trajectory.len(),
                    escaped: did_leave_the_planet(last, planet.mass),
                    time: last.time,
                    final_velocity: last.velocity.y,
                    fuel_left: last.fuel_mass,
                    max_overload: max_overload(&trajectory),
                    astronaut_survived: !is_astronaut_dead(&trajectory),
                }
            }
            Lab::Interplanetary { simulation } => {
                let (trajectory, stopped_by) = drain(simulation, max_steps)?;
                let last = last_state(&trajectory)?;
                let outcome = stopped_by.unwrap_or("unfinished");
                Report::Interplanetary {
                    samples: trajectory.len(),
                    outcome,
                    reached_target: outcome == "planet reached",
                    travel_days: last.time / DAY,
                    astronaut_survived: !is_astronaut_dead(&trajectory),
                }
            }
            Lab::MarsLanding { config, thrust, params } => {
                let mars = planet(PlanetConfig::Mars);
                let plan = plan_landing(
                    &mars,
                    config.netto_mass,
                    config.initial_mass,
                    config.stream_velocity,
                    thrust,
                    config.time_delta,
                    params,
                    max_steps,
                )?;
                Report::MarsLanding {
                    samples: plan.trajectory.len(),
                    ignition_altitude: plan.ignition_altitude,
                    fuel_needed: plan.fuel_needed,
                    max_overload: max_overload(&plan.trajectory),
                    astronaut_survived: !is_astronaut_dead(&plan.trajectory),
                }
            }
            Lab::Rolling(simulation) => {
                let (trajectory, simulation) = drain_keep(simulation, max_steps)?;
                let last = last_state(&trajectory)?;
                let calculator = simulation.calculator();
                Report::Rolling {
                    samples: trajectory.len(),
                    rolling_possible: calculator.environment().is_rolling_possible(),
                    slippage_end_time: calculator.slippage_end_time(),
                    travel_time: last.time,
                    final_velocity: last.velocity,
                }
            }
            Lab::Pendulum { simulation, length } => {
                let (trajectory, _) = drain(simulation, max_steps)?;
                let g = last_state(&trajectory)?.g;
                let extremes = find_extremes(&trajectory);
                Report::Pendulum {
                    samples: trajectory.len(),
                    mean_period: mean_period(&extremes),
                    theoretical_period: theoretical_period(length, g),
                    energy_drift: energy_drift(&trajectory),
                }
            }
        };

        info!(?report, "lab finished");
        Ok(report)
    }
}

fn planet(choice: PlanetConfig) -> Planet {
    match choice {
        PlanetConfig::Earth => Planet::new("Earth", Vector2D::zeros(), EARTH_MASS, EARTH_RADIUS),
        PlanetConfig::Mars => Planet::new("Mars", Vector2D::zeros(), MARS_MASS, MARS_RADIUS),
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), SimError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidScenario(format!("{name} must be positive, got {value}")))
    }
}

fn last_state<S>(trajectory: &[S]) -> Result<&S, SimError> {
    trajectory
        .last()
        .ok_or_else(|| SimError::InvalidScenario("simulation produced no states".into()))
}

fn drain_keep<C: Calculator>(
    simulation: Simulation<C>,
    max_steps: Option<usize>,
) -> Result<(Vec<C::State>, Simulation<C>), SimError> {
    let mut simulation = match max_steps {
        Some(n) => simulation.with_max_steps(n),
        None => simulation,
    };
    let trajectory = simulation.by_ref().collect::<Result<Vec<_>, _>>()?;
    Ok((trajectory, simulation))
}

fn drain<C: Calculator>(
    simulation: Simulation<C>,
    max_steps: Option<usize>,
) -> Result<(Vec<C::State>, Option<&'static str>), SimError> {
    let (trajectory, simulation) = drain_keep(simulation, max_steps)?;
    Ok((trajectory, simulation.stopped_by()))
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Projectile { samples, flight_time, distance } => write!(
                f,
                "projectile: flight time {flight_time:.3} s, distance {distance:.2} m ({samples} samples)"
            ),
            Report::PlanetFlight { samples, escaped, time, final_velocity, fuel_left, max_overload, astronaut_survived } => write!(
                f,
                "planet flight: escaped {escaped} at {time:.0} s, velocity {final_velocity:.1} m/s, \
                 fuel left {fuel_left:.0} kg, max overload {max_overload:.2} g, survived {astronaut_survived} ({samples} samples)"
            ),
            Report::Interplanetary { samples, outcome, reached_target, travel_days, astronaut_survived } => write!(
                f,
                "interplanetary: {outcome} after {travel_days:.1} days, reached {reached_target}, \
                 survived {astronaut_survived} ({samples} samples)"
            ),
            Report::MarsLanding { samples, ignition_altitude, fuel_needed, max_overload, astronaut_survived } => write!(
                f,
                "mars landing: ignite at {ignition_altitude:.0} m, fuel {fuel_needed:.0} kg, \
                 max overload {max_overload:.2} g, survived {astronaut_survived} ({samples} samples)"
            ),
            Report::Rolling { samples, rolling_possible, slippage_end_time, travel_time, final_velocity } => {
                let end = match slippage_end_time {
                    Some(_) if !rolling_possible => "never, slips throughout".to_string(),
                    Some(t) => format!("at {t:.3} s"),
                    None => "never".to_string(),
                };
                write!(
                    f,
                    "rolling: possible {rolling_possible}, slippage ended {end}, \
                     bottom after {travel_time:.3} s at {final_velocity:.3} m/s ({samples} samples)"
                )
            }
            Report::Pendulum { samples, mean_period, theoretical_period, energy_drift } => {
                let period = match mean_period {
                    Some(p) => format!("{p:.4} s"),
                    None => "n/a".to_string(),
                };
                write!(
                    f,
                    "pendulum: period {period} (theory {theoretical_period:.4} s), \
                     energy drift {energy_drift:.3e} J ({samples} samples)"
                )
            }
        }
    }
}
