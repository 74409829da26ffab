//! Physical state snapshots produced by the calculators
//!
//! Every lab has its own snapshot type:
//! - `Projectile`    point mass thrown through air
//! - `Rocket`        rocket during powered ascent or coasting in space
//! - `Planet`        static gravity source
//! - `Ball`          solid sphere on an incline, with `Environment`
//! - `PendulumState` rod pendulum swinging about its pivot
//!
//! Snapshots are plain values. Calculators build a fresh one per step.

use std::cell::OnceCell;

use super::constants::{CAPTURE_RADIUS_FACTOR, G, STANDARD_GRAVITY};
use super::criteria::is_rolling_possible;
use super::trig;
use super::vector::Vector2D;

/// Implemented by every snapshot so time-based criteria stay generic
pub trait Timed {
    fn time(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub time: f64, // elapsed time
    pub position: Vector2D, // x along ground, y height
    pub velocity: Vector2D,
    pub mass: f64,
}

impl Timed for Projectile {
    fn time(&self) -> f64 {
        self.time
    }
}

// =========================================================================================
// Rocket
// =========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Rocket {
    pub time: f64, // elapsed time
    pub position: Vector2D, // y is distance from planet centre during ascent
    pub velocity: Vector2D,
    pub acceleration: Vector2D, // last computed, informational
    pub netto_mass: f64, // dry mass
    pub fuel_mass: f64, // remaining fuel
    pub stream_velocity: f64, // exhaust velocity relative to rocket
    pub fixed_acceleration: Option<f64>, // used by the fixed-acceleration recipe
    pub fuel_consumption: Option<f64>, // used by the fixed-fuel-rate recipe, kg/s
}

impl Rocket {
    /// Rocket at rest at `position` with no thrust parameters set
    pub fn at(position: Vector2D, netto_mass: f64, fuel_mass: f64, stream_velocity: f64) -> Self {
        Self {
            time: 0.0,
            position,
            velocity: Vector2D::zeros(),
            acceleration: Vector2D::zeros(),
            netto_mass,
            fuel_mass,
            stream_velocity,
            fixed_acceleration: None,
            fuel_consumption: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vector2D) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_fixed_acceleration(mut self, acceleration: f64) -> Self {
        self.fixed_acceleration = Some(acceleration);
        self
    }

    pub fn with_fuel_consumption(mut self, rate: f64) -> Self {
        self.fuel_consumption = Some(rate);
        self
    }

    pub fn mass(&self) -> f64 {
        self.netto_mass + self.fuel_mass
    }

    /// Acceleration magnitude in units of g
    pub fn overload(&self) -> f64 {
        self.acceleration.norm() / STANDARD_GRAVITY
    }
}

impl Timed for Rocket {
    fn time(&self) -> f64 {
        self.time
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Planet {
    pub name: String,
    pub position: Vector2D, // centre
    pub mass: f64,
    pub radius: f64,
}

impl Planet {
    pub fn new(name: impl Into<String>, position: Vector2D, mass: f64, radius: f64) -> Self {
        Self {
            name: name.into(),
            position,
            mass,
            radius,
        }
    }

    /// Gravitational acceleration this planet causes at `point`
    /// Zero at the planet centre
    pub fn gravity_at(&self, point: &Vector2D) -> Vector2D {
        let r = self.position - point;
        let distance = r.norm();
        if distance == 0.0 {
            return Vector2D::zeros();
        }
        (G * self.mass / (distance * distance * distance)) * r
    }

    /// Distance from the centre that counts as having reached the planet
    pub fn capture_radius(&self) -> f64 {
        self.radius * CAPTURE_RADIUS_FACTOR
    }
}

// =========================================================================================
// Rolling
// =========================================================================================

/// Incline the ball rolls down, plus the memoized rolling feasibility
#[derive(Debug, Clone)]
pub struct Environment {
    pub g: f64,
    pub incline_angle: f64, // radians
    pub friction_coefficient: f64, // kinetic friction coefficient
    pub plane_length: f64,
    rolling_possible: OnceCell<bool>,
}

impl Environment {
    pub fn new(g: f64, incline_angle: f64, friction_coefficient: f64, plane_length: f64) -> Self {
        Self {
            g,
            incline_angle,
            friction_coefficient,
            plane_length,
            rolling_possible: OnceCell::new(),
        }
    }

    pub fn plane_height(&self) -> f64 {
        self.plane_length * trig::sin(self.incline_angle)
    }

    /// Whether friction can ever stop the ball slipping on this incline
    pub fn is_rolling_possible(&self) -> bool {
        *self.rolling_possible.get_or_init(|| is_rolling_possible(self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub time: f64,
    pub mass: f64,
    pub radius: f64,
    pub velocity: f64, // translational, along the incline downwards
    pub angular_velocity: f64,
    pub position: f64, // distance travelled from the top of the incline
    pub rotation: f64, // angle turned
    pub acceleration: f64, // last computed, informational
    pub angular_acceleration: f64, // last computed, informational
}

impl Ball {
    /// Ball at the top of the incline
    pub fn new(mass: f64, radius: f64, velocity: f64, angular_velocity: f64) -> Self {
        Self {
            time: 0.0,
            mass,
            radius,
            velocity,
            angular_velocity,
            position: 0.0,
            rotation: 0.0,
            acceleration: 0.0,
            angular_acceleration: 0.0,
        }
    }

    /// Solid sphere about its centre
    pub fn rotational_inertia(&self) -> f64 {
        0.4 * self.mass * self.radius * self.radius
    }

    /// Speed of the contact point relative to the incline, `v - omega * r`
    pub fn contact_speed(&self) -> f64 {
        self.velocity - self.angular_velocity * self.radius
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity * self.velocity
    }

    pub fn rotational_energy(&self) -> f64 {
        0.5 * self.rotational_inertia() * self.angular_velocity * self.angular_velocity
    }

    pub fn potential_energy(&self, env: &Environment) -> f64 {
        self.mass * env.g * self.position_y(env)
    }

    pub fn full_energy(&self, env: &Environment) -> f64 {
        self.kinetic_energy() + self.rotational_energy() + self.potential_energy(env)
    }

    /// Horizontal coordinate of the centre, incline foot at the origin
    pub fn position_x(&self, env: &Environment) -> f64 {
        (env.plane_length - self.position) * trig::cos(env.incline_angle)
            - self.radius * trig::sin(env.incline_angle)
    }

    /// Height of the centre above the incline foot
    pub fn position_y(&self, env: &Environment) -> f64 {
        (env.plane_length - self.position) * trig::sin(env.incline_angle)
            + self.radius * trig::cos(env.incline_angle)
    }
}

impl Timed for Ball {
    fn time(&self) -> f64 {
        self.time
    }
}

// =========================================================================================
// Pendulum
// =========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PendulumState {
    pub time: f64,
    pub length: f64, // rod length
    pub weight: f64, // rod mass
    pub angle: f64, // from the vertical, radians
    pub angular_velocity: f64,
    pub friction: f64, // viscous friction coefficient
    pub g: f64,
}

impl PendulumState {
    /// Pendulum released from rest at `angle`
    pub fn released(length: f64, weight: f64, angle: f64, friction: f64) -> Self {
        Self {
            time: 0.0,
            length,
            weight,
            angle,
            angular_velocity: 0.0,
            friction,
            g: STANDARD_GRAVITY,
        }
    }

    /// Uniform rod about one end
    pub fn moment_of_inertia(&self) -> f64 {
        self.weight * self.length * self.length / 3.0
    }

    pub fn potential_energy(&self) -> f64 {
        self.weight * self.g * (self.length / 2.0) * (1.0 - trig::cos(self.angle))
    }

    pub fn rotational_energy(&self) -> f64 {
        0.5 * self.moment_of_inertia() * self.angular_velocity * self.angular_velocity
    }

    pub fn full_energy(&self) -> f64 {
        self.potential_energy() + self.rotational_energy()
    }
}

impl Timed for PendulumState {
    fn time(&self) -> f64 {
        self.time
    }
}
