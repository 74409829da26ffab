//! Equations of motion for every lab
//!
//! Each provider implements [`OdeSystem`] over a fixed-size state vector and
//! is chosen once, when its calculator is built:
//! - `ProjectileEquation`  `[x, y, vx, vy]`, gravity plus a `DragLaw`
//! - `PoweredAscent`       `[y, v, m]`, vertical flight under a `Thrust` recipe
//! - `GravityField`        `[x, y, vx, vy]`, engine-off flight in an `AccelSet`
//! - `RollingEquation`     `[s, v, phi, omega]`, ball on an incline
//! - `PendulumEquation`    `[theta, omega]`, damped rod pendulum

use nalgebra::{SVector, Vector2, Vector3, Vector4};

use super::constants::G;
use super::integrator::OdeSystem;
use super::states::{Ball, Environment, PendulumState, Planet};
use super::trig;
use super::vector::Vector2D;

// =========================================================================================
// Projectile
// =========================================================================================

/// How air resistance depends on speed, per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragLaw {
    Constant, // k * sign(v)
    Linear, // k * v
    Quadratic, // k * v * |v|
}

impl DragLaw {
    /// Deceleration along one axis; `k` is the drag rate divided by mass
    pub fn deceleration(&self, k: f64, v: f64) -> f64 {
        match self {
            DragLaw::Constant => k * trig::sign(v),
            DragLaw::Linear => k * v,
            DragLaw::Quadratic => k * v * v.abs(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectileEquation {
    pub law: DragLaw,
    pub k: f64, // drag rate / mass
    pub g: f64,
}

impl OdeSystem<4> for ProjectileEquation {
    fn derivatives(&self, _t: f64, y: &SVector<f64, 4>) -> SVector<f64, 4> {
        let (vx, vy) = (y[2], y[3]);
        Vector4::new(
            vx,
            vy,
            -self.law.deceleration(self.k, vx),
            -self.law.deceleration(self.k, vy) - self.g,
        )
    }
}

// =========================================================================================
// Powered ascent
// =========================================================================================

/// Validated thrust recipe for the powered ascent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Thrust {
    /// Constant vertical acceleration; fuel burn follows from the rocket equation
    FixedAcceleration(f64),
    /// Constant fuel burn rate in kg/s; acceleration follows from thrust
    FixedFuelConsumption(f64),
}

#[derive(Debug, Clone)]
pub struct PoweredAscent {
    pub thrust: Thrust,
    pub netto_mass: f64,
    pub stream_velocity: f64,
    pub planet_mass: f64,
}

impl PoweredAscent {
    /// Gravity at distance `y` from the planet centre
    pub fn local_gravity(&self, y: f64) -> f64 {
        G * self.planet_mass / (y * y)
    }
}

impl OdeSystem<3> for PoweredAscent {
    fn derivatives(&self, _t: f64, state: &SVector<f64, 3>) -> SVector<f64, 3> {
        let (y, v, m) = (state[0], state[1], state[2]);
        let g = self.local_gravity(y);

        // out of fuel: free fall
        if m - self.netto_mass <= 0.0 {
            return Vector3::new(v, -g, 0.0);
        }

        match self.thrust {
            Thrust::FixedAcceleration(a) => {
                Vector3::new(v, a, -(m / self.stream_velocity) * (a + g))
            }
            Thrust::FixedFuelConsumption(rate) => {
                Vector3::new(v, rate * self.stream_velocity / m - g, -rate)
            }
        }
    }
}

// =========================================================================================
// Interplanetary
// =========================================================================================

/// Trait for 2D acceleration sources acting on a point
pub trait Acceleration {
    fn acceleration(&self, t: f64, point: &Vector2D) -> Vector2D;
}

impl Acceleration for Planet {
    fn acceleration(&self, _t: f64, point: &Vector2D) -> Vector2D {
        self.gravity_at(point)
    }
}

/// Collection of acceleration terms, summed into one vector
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
        }
    }

    /// Add an acceleration term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Total acceleration at `point` and time `t`
    pub fn total(&self, t: f64, point: &Vector2D) -> Vector2D {
        self.terms
            .iter()
            .fold(Vector2D::zeros(), |acc, term| acc + term.acceleration(t, point))
    }
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine-off flight through the gravity of every term in `forces`
pub struct GravityField {
    pub forces: AccelSet,
}

impl GravityField {
    pub fn of_planets(planets: impl IntoIterator<Item = Planet>) -> Self {
        let forces = planets.into_iter().fold(AccelSet::new(), |set, p| set.with(p));
        Self { forces }
    }
}

impl OdeSystem<4> for GravityField {
    fn derivatives(&self, t: f64, y: &SVector<f64, 4>) -> SVector<f64, 4> {
        let a = self.forces.total(t, &Vector2::new(y[0], y[1]));
        Vector4::new(y[2], y[3], a.x, a.y)
    }
}

// =========================================================================================
// Rolling
// =========================================================================================

/// Which pair of equations drives the ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RollingRegime {
    /// Kinetic friction acts against the contact-point motion
    /// `direction` is the sign of `v - omega * r` when slipping started
    WithSlippage { direction: f64 },
    /// Pure rolling, `omega * r` tracks `v`
    WithoutSlippage,
}

#[derive(Debug, Clone)]
pub struct RollingEquation {
    pub regime: RollingRegime,
    pub mass: f64,
    pub radius: f64,
    pub inertia: f64,
    pub g: f64,
    pub mu: f64,
    sin: f64, // incline sine
    cos: f64, // incline cosine
}

impl RollingEquation {
    pub fn new(ball: &Ball, env: &Environment, regime: RollingRegime) -> Self {
        Self {
            regime,
            mass: ball.mass,
            radius: ball.radius,
            inertia: ball.rotational_inertia(),
            g: env.g,
            mu: env.friction_coefficient,
            sin: trig::sin(env.incline_angle),
            cos: trig::cos(env.incline_angle),
        }
    }

    /// `(a, alpha)` for the current regime; both are constant within a regime
    pub fn accelerations(&self) -> (f64, f64) {
        match self.regime {
            RollingRegime::WithSlippage { direction } => {
                let friction = direction * self.mu * self.g * self.cos;
                let a = self.g * self.sin - friction;
                let alpha = self.mass * friction * self.radius / self.inertia;
                (a, alpha)
            }
            RollingRegime::WithoutSlippage => {
                let a = self.mass * self.g * self.sin
                    / (self.mass + self.inertia / (self.radius * self.radius));
                (a, a / self.radius)
            }
        }
    }
}

impl OdeSystem<4> for RollingEquation {
    fn derivatives(&self, _t: f64, y: &SVector<f64, 4>) -> SVector<f64, 4> {
        let (a, alpha) = self.accelerations();
        Vector4::new(y[1], a, y[3], alpha)
    }
}

// =========================================================================================
// Pendulum
// =========================================================================================

#[derive(Debug, Clone)]
pub struct PendulumEquation {
    pub weight: f64,
    pub length: f64,
    pub friction: f64,
    pub g: f64,
    pub inertia: f64,
}

impl PendulumEquation {
    pub fn from_state(state: &PendulumState) -> Self {
        Self {
            weight: state.weight,
            length: state.length,
            friction: state.friction,
            g: state.g,
            inertia: state.moment_of_inertia(),
        }
    }
}

impl OdeSystem<2> for PendulumEquation {
    fn derivatives(&self, _t: f64, y: &SVector<f64, 2>) -> SVector<f64, 2> {
        let (theta, omega) = (y[0], y[1]);
        let gravity = self.weight * self.g * self.length / 2.0 / self.inertia;
        let damping = self.friction * self.length.powi(3) / (3.0 * self.inertia);
        Vector2::new(omega, -gravity * trig::sin(theta) - damping * omega)
    }
}
