//! Configuration types for loading labs from YAML.
//!
//! A scenario file selects one lab with its `kind` tag and gives the initial
//! conditions for it. Integrator tolerances are optional and shared by all labs.
//!
//! - [`IntegratorConfig`] – tolerances, initial step, step guards
//! - [`LabConfig`]        – one variant per lab
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//!
//! ```yaml
//! integrator:
//!   rtol: 1.0e-6            # relative error tolerance
//!   atol: 1.0e-12           # absolute error tolerance
//!   max_steps: 200000       # give up if nothing terminates the run
//!
//! lab:
//!   kind: planet_flight
//!   planet: earth
//!   initial_mass: 100000.0  # kg
//!   fuel_ratio: 0.9
//!   stream_velocity: 6500.0 # m/s
//!   thrust: fixed_acceleration
//!   acceleration_g: 3.0
//!   time_delta: 1.0
//! ```
//!
//! Angles are given in degrees and converted when the lab is built.

use serde::Deserialize;

use crate::simulation::constants::STANDARD_GRAVITY;
use crate::simulation::params::IntegratorParams;

/// Numerical settings; every field falls back to the integrator default
#[derive(Deserialize, Debug, Clone, Default)]
pub struct IntegratorConfig {
    pub h0: Option<f64>, // initial step size, picked automatically if absent
    pub atol: Option<f64>, // absolute error tolerance
    pub rtol: Option<f64>, // relative error tolerance
    pub max_internal_steps: Option<usize>, // per sampling step
    pub max_steps: Option<usize>, // sampling steps before the run is abandoned
}

impl IntegratorConfig {
    pub fn params(&self) -> IntegratorParams {
        let defaults = IntegratorParams::default();
        IntegratorParams {
            h0: self.h0.or(defaults.h0),
            atol: self.atol.unwrap_or(defaults.atol),
            rtol: self.rtol.unwrap_or(defaults.rtol),
            max_internal_steps: self.max_internal_steps.unwrap_or(defaults.max_internal_steps),
        }
    }
}

/// Air resistance law for the projectile lab
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragLawConfig {
    #[serde(rename = "none")] // no air resistance
    #[default]
    None,

    #[serde(rename = "constant")] // k * sign(v)
    Constant,

    #[serde(rename = "linear")] // k * v
    Linear,

    #[serde(rename = "quadratic")] // k * v * |v|
    Quadratic,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlanetConfig {
    #[serde(rename = "earth")]
    #[default]
    Earth,

    #[serde(rename = "mars")]
    Mars,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThrustConfig {
    #[serde(rename = "fixed_acceleration")] // needs `acceleration_g`
    #[default]
    FixedAcceleration,

    #[serde(rename = "fixed_fuel_rate")] // needs `fuel_consumption`
    FixedFuelRate,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReachTestConfig {
    #[serde(rename = "proximity")]
    Proximity,

    #[serde(rename = "crossing")]
    #[default]
    Crossing,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProjectileConfig {
    pub velocity: f64, // launch speed, m/s
    pub angle: f64, // launch angle, degrees
    #[serde(default = "one")]
    pub mass: f64, // kg
    #[serde(default)]
    pub drag: DragLawConfig,
    #[serde(default)]
    pub drag_rate: f64, // divided by mass to get the drag factor
    #[serde(default)]
    pub height: f64, // launch height, m
    #[serde(default = "standard_gravity")]
    pub g: f64,
    #[serde(default = "projectile_delta")]
    pub time_delta: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PlanetFlightConfig {
    #[serde(default)]
    pub planet: PlanetConfig,
    pub initial_mass: f64, // kg, fuel included
    pub fuel_ratio: f64, // share of the initial mass that is fuel
    pub stream_velocity: f64, // m/s
    pub thrust: ThrustConfig,
    pub acceleration_g: Option<f64>, // fixed acceleration in units of g
    pub fuel_consumption: Option<f64>, // fixed burn rate, kg/s
    #[serde(default = "one")]
    pub time_delta: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InterplanetaryConfig {
    pub velocity: f64, // speed after leaving Earth, m/s
    pub angle: f64, // direction of flight, degrees
    #[serde(default = "yes")]
    pub planet_gravity: bool, // false leaves only the Sun in the field
    #[serde(default)]
    pub reach: ReachTestConfig,
    #[serde(default = "yes")]
    pub abort_on_turn_back: bool,
    #[serde(default = "interplanetary_delta")]
    pub time_delta: f64, // s
}

#[derive(Deserialize, Debug, Clone)]
pub struct MarsLandingConfig {
    pub netto_mass: f64, // dry mass, kg
    pub initial_mass: f64, // mass available at ignition, kg
    pub stream_velocity: f64, // m/s
    #[serde(default)]
    pub thrust: ThrustConfig,
    pub deceleration_g: Option<f64>, // braking acceleration in units of g
    pub fuel_consumption: Option<f64>, // fixed burn rate, kg/s
    #[serde(default = "one")]
    pub time_delta: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RollingConfig {
    #[serde(default = "one")]
    pub mass: f64, // kg
    pub radius: f64, // m
    pub velocity: f64, // initial translational velocity, m/s
    #[serde(default)]
    pub angular_velocity: f64, // initial spin, rad/s
    pub incline_angle: f64, // degrees
    pub friction: f64, // kinetic friction coefficient
    pub plane_length: f64, // m
    #[serde(default = "standard_gravity")]
    pub g: f64,
    #[serde(default = "rolling_delta")]
    pub time_delta: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PendulumConfig {
    pub length: f64, // m
    #[serde(default = "one")]
    pub weight: f64, // kg
    pub angle: f64, // initial deflection, degrees
    #[serde(default)]
    pub friction: f64,
    #[serde(default = "pendulum_time")]
    pub simulation_time: f64, // s
    #[serde(default = "rolling_delta")]
    pub time_delta: f64,
}

/// The lab to run, selected by `kind`
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "kind")]
pub enum LabConfig {
    #[serde(rename = "projectile")]
    Projectile(ProjectileConfig),

    #[serde(rename = "planet_flight")]
    PlanetFlight(PlanetFlightConfig),

    #[serde(rename = "interplanetary")]
    Interplanetary(InterplanetaryConfig),

    #[serde(rename = "mars_landing")]
    MarsLanding(MarsLandingConfig),

    #[serde(rename = "rolling")]
    Rolling(RollingConfig),

    #[serde(rename = "pendulum")]
    Pendulum(PendulumConfig),
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub integrator: IntegratorConfig, // numerical settings shared by every lab
    pub lab: LabConfig, // lab and its initial conditions
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

fn standard_gravity() -> f64 {
    STANDARD_GRAVITY
}

fn projectile_delta() -> f64 {
    1.0 / 1024.0
}

fn interplanetary_delta() -> f64 {
    4.0 * 3600.0
}

fn rolling_delta() -> f64 {
    1e-3
}

fn pendulum_time() -> f64 {
    10.0
}
