pub mod error;
pub mod simulation;
pub mod configuration;

pub use error::SimError;

pub use simulation::vector::{Vector2D, Polar};
pub use simulation::params::IntegratorParams;
pub use simulation::states::{Projectile, Rocket, Planet, Environment, Ball, PendulumState, Timed};
pub use simulation::integrator::{Dopri5, OdeSystem};
pub use simulation::forces::{DragLaw, Thrust, RollingRegime, Acceleration, AccelSet, GravityField};
pub use simulation::calculator::{
    Calculator, ProjectileCalculator, ThrustMode, PlanetFlightCalculator, InterplanetaryCalculator,
    RollingCalculator, PendulumCalculator,
};
pub use simulation::criteria::{
    escape_velocity, did_leave_the_planet, is_slippage_finished, is_rolling_possible, is_astronaut_dead,
    did_turn_back, did_reach_target_x, line_intersects_circle, when, Criterion, CriteriaSet,
    EscapeVelocityReached, VelocityGapIncrease, ReachTest, PlanetReached, TurnedBack, ReachedTargetX,
    HungerTimeout, TimeLimit, ReachedEndOfIncline,
};
pub use simulation::engine::{
    Simulation, ProjectileFlight, LandingPlan, planet_flight, plan_landing, flight_summary, max_overload,
    find_extremes, mean_period, theoretical_period, energy_drift,
};
pub use simulation::scenario::{Scenario, Lab, Report};

pub use configuration::config::{IntegratorConfig, LabConfig, ScenarioConfig};
