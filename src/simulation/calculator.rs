//! Calculators: one integrator per lab, advanced in sampling steps
//!
//! A calculator owns its integrator exclusively. Every `advance(dt)` call
//! continues integrating from where the previous call stopped and rebuilds
//! a full state snapshot from the raw numbers. `advance(0.0)` returns the
//! current state without touching the integrator.

use nalgebra::{Vector2, Vector3, Vector4};
use tracing::debug;

use crate::error::SimError;
use super::criteria::is_slippage_finished;
use super::forces::{
    DragLaw, GravityField, PendulumEquation, PoweredAscent, ProjectileEquation, RollingEquation,
    RollingRegime, Thrust,
};
use super::integrator::{Dopri5, OdeSystem};
use super::params::IntegratorParams;
use super::states::{Ball, Environment, PendulumState, Planet, Projectile, Rocket};
use super::trig;
use super::vector::Vector2D;

pub trait Calculator {
    type State: Clone;

    /// Most recent snapshot
    fn state(&self) -> &Self::State;

    /// Integrate `time_delta` further and return the new snapshot
    fn advance(&mut self, time_delta: f64) -> Result<Self::State, SimError>;
}

// =========================================================================================
// Projectile
// =========================================================================================

pub struct ProjectileCalculator {
    equation: ProjectileEquation,
    integrator: Dopri5<4>,
    current: Projectile,
}

impl ProjectileCalculator {
    /// `drag_rate` is divided by the projectile mass to get the drag factor
    pub fn new(projectile: Projectile, law: DragLaw, drag_rate: f64, g: f64) -> Self {
        Self::with_params(projectile, law, drag_rate, g, IntegratorParams::default())
    }

    pub fn with_params(
        projectile: Projectile,
        law: DragLaw,
        drag_rate: f64,
        g: f64,
        params: IntegratorParams,
    ) -> Self {
        let equation = ProjectileEquation {
            law,
            k: drag_rate / projectile.mass,
            g,
        };
        let y0 = Vector4::new(
            projectile.position.x,
            projectile.position.y,
            projectile.velocity.x,
            projectile.velocity.y,
        );
        Self {
            equation,
            integrator: Dopri5::new(projectile.time, y0, params),
            current: projectile,
        }
    }
}

impl Calculator for ProjectileCalculator {
    type State = Projectile;

    fn state(&self) -> &Projectile {
        &self.current
    }

    fn advance(&mut self, time_delta: f64) -> Result<Projectile, SimError> {
        let y = self.integrator.advance_by(&self.equation, time_delta)?;
        self.current = Projectile {
            time: self.integrator.t(),
            position: Vector2D::new(y[0], y[1]),
            velocity: Vector2D::new(y[2], y[3]),
            mass: self.current.mass,
        };
        Ok(self.current.clone())
    }
}

// =========================================================================================
// Powered ascent from a planet surface
// =========================================================================================

/// Thrust recipe selector; the numbers come from the rocket itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrustMode {
    FixedAcceleration,
    FixedFuelConsumption,
}

pub struct PlanetFlightCalculator {
    equation: PoweredAscent,
    integrator: Dopri5<3>,
    current: Rocket,
    fuel_exhausted: bool,
}

impl PlanetFlightCalculator {
    /// Fails if the rocket lacks the parameter `mode` needs
    pub fn new(rocket: Rocket, mode: ThrustMode, planet_mass: f64) -> Result<Self, SimError> {
        Self::with_params(rocket, mode, planet_mass, IntegratorParams::default())
    }

    pub fn with_params(
        rocket: Rocket,
        mode: ThrustMode,
        planet_mass: f64,
        params: IntegratorParams,
    ) -> Result<Self, SimError> {
        let thrust = match mode {
            ThrustMode::FixedAcceleration => rocket
                .fixed_acceleration
                .map(Thrust::FixedAcceleration)
                .ok_or(SimError::MissingAcceleration)?,
            ThrustMode::FixedFuelConsumption => rocket
                .fuel_consumption
                .map(Thrust::FixedFuelConsumption)
                .ok_or(SimError::MissingFuelConsumption)?,
        };
        let equation = PoweredAscent {
            thrust,
            netto_mass: rocket.netto_mass,
            stream_velocity: rocket.stream_velocity,
            planet_mass,
        };

        let y0 = Vector3::new(rocket.position.y, rocket.velocity.y, rocket.mass());
        let derivatives = equation.derivatives(rocket.time, &y0);

        let mut current = rocket;
        current.acceleration = Vector2D::new(0.0, derivatives[1]);
        let fuel_exhausted = current.fuel_mass <= 0.0;

        Ok(Self {
            integrator: Dopri5::new(current.time, y0, params),
            equation,
            current,
            fuel_exhausted,
        })
    }

    pub fn planet_mass(&self) -> f64 {
        self.equation.planet_mass
    }
}

impl Calculator for PlanetFlightCalculator {
    type State = Rocket;

    fn state(&self) -> &Rocket {
        &self.current
    }

    fn advance(&mut self, time_delta: f64) -> Result<Rocket, SimError> {
        let y = self.integrator.advance_by(&self.equation, time_delta)?;
        let t = self.integrator.t();
        let derivatives = self.equation.derivatives(t, &y);

        let fuel_mass = (y[2] - self.equation.netto_mass).max(0.0);
        if fuel_mass == 0.0 && !self.fuel_exhausted {
            self.fuel_exhausted = true;
            debug!(t, altitude = y[0], velocity = y[1], "fuel exhausted");
        }

        self.current = Rocket {
            time: t,
            position: Vector2D::new(self.current.position.x, y[0]),
            velocity: Vector2D::new(self.current.velocity.x, y[1]),
            acceleration: Vector2D::new(0.0, derivatives[1]),
            fuel_mass,
            ..self.current.clone()
        };
        Ok(self.current.clone())
    }
}

// =========================================================================================
// Interplanetary, engine off
// =========================================================================================

pub struct InterplanetaryCalculator {
    equation: GravityField,
    integrator: Dopri5<4>,
    current: Rocket,
}

impl InterplanetaryCalculator {
    pub fn new(rocket: Rocket, planets: Vec<Planet>) -> Self {
        Self::with_params(rocket, planets, IntegratorParams::default())
    }

    pub fn with_params(rocket: Rocket, planets: Vec<Planet>, params: IntegratorParams) -> Self {
        let y0 = Vector4::new(
            rocket.position.x,
            rocket.position.y,
            rocket.velocity.x,
            rocket.velocity.y,
        );
        Self {
            equation: GravityField::of_planets(planets),
            integrator: Dopri5::new(rocket.time, y0, params),
            current: rocket,
        }
    }
}

impl Calculator for InterplanetaryCalculator {
    type State = Rocket;

    fn state(&self) -> &Rocket {
        &self.current
    }

    /// Acceleration is the finite difference of velocity over `time_delta`
    fn advance(&mut self, time_delta: f64) -> Result<Rocket, SimError> {
        if time_delta == 0.0 {
            return Ok(self.current.clone());
        }
        let y = self.integrator.advance_by(&self.equation, time_delta)?;
        let velocity = Vector2D::new(y[2], y[3]);

        self.current = Rocket {
            time: self.integrator.t(),
            position: Vector2D::new(y[0], y[1]),
            acceleration: (velocity - self.current.velocity) / time_delta,
            velocity,
            ..self.current.clone()
        };
        Ok(self.current.clone())
    }
}

// =========================================================================================
// Rolling down an incline
// =========================================================================================

/// Ball on an incline; switches once from slipping to rolling
pub struct RollingCalculator {
    environment: Environment,
    equation: RollingEquation,
    integrator: Dopri5<4>,
    current: Ball,
    slippage_end_time: Option<f64>,
}

impl RollingCalculator {
    pub fn new(ball: Ball, environment: Environment) -> Self {
        Self::with_params(ball, environment, IntegratorParams::default())
    }

    pub fn with_params(ball: Ball, environment: Environment, params: IntegratorParams) -> Self {
        let direction = slip_direction(ball.contact_speed());
        let equation = RollingEquation::new(&ball, &environment, RollingRegime::WithSlippage { direction });
        let y0 = Vector4::new(ball.position, ball.velocity, ball.rotation, ball.angular_velocity);

        // nothing to wait for when friction can never stop the slipping
        let slippage_end_time = (!environment.is_rolling_possible()).then_some(ball.time);
        let mut calculator = Self {
            integrator: Dopri5::new(ball.time, y0, params),
            environment,
            equation,
            current: ball,
            slippage_end_time,
        };
        calculator.check_slippage_finished();
        calculator.record_accelerations();
        calculator
    }

    /// When slipping ended, `None` while the ball still slips
    ///
    /// `Some(start time)` if the ball grips from the start, and also when
    /// rolling is impossible on this incline: the ball then slips for the
    /// whole run and there is no transition to wait for. Check
    /// `environment().is_rolling_possible()` to tell the two apart.
    pub fn slippage_end_time(&self) -> Option<f64> {
        self.slippage_end_time
    }

    pub fn regime(&self) -> RollingRegime {
        self.equation.regime
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    fn is_slipping(&self) -> bool {
        matches!(self.equation.regime, RollingRegime::WithSlippage { .. })
    }

    fn start_rolling(&mut self, t: f64) {
        self.equation.regime = RollingRegime::WithoutSlippage;
        self.slippage_end_time = Some(t);
        debug!(t, velocity = self.current.velocity, "slippage finished");
    }

    /// Switch to rolling if the current state no longer slips
    fn check_slippage_finished(&mut self) {
        if self.is_slipping()
            && self.environment.is_rolling_possible()
            && is_slippage_finished(&self.current)
        {
            self.start_rolling(self.current.time);
        }
    }

    fn record_accelerations(&mut self) {
        let (a, alpha) = self.equation.accelerations();
        self.current.acceleration = a;
        self.current.angular_acceleration = alpha;
    }

    fn ball_from(&self, y: &Vector4<f64>) -> Ball {
        Ball {
            time: self.integrator.t(),
            position: y[0],
            velocity: y[1],
            rotation: y[2],
            angular_velocity: y[3],
            ..self.current.clone()
        }
    }

    /// Redo the end of a slipping step that crossed `v = omega * r` after `tau`
    ///
    /// Slipping accelerations are constant, so the state at the crossing is
    /// exact. From there the ball rolls with `omega = v / r` up to the end of
    /// the step.
    fn grip_inside_step(&mut self, start: &Ball, tau: f64) -> Result<(), SimError> {
        let t_end = self.integrator.t();
        let (a, alpha) = self.equation.accelerations();
        let velocity = start.velocity + a * tau;
        let gripped = Vector4::new(
            start.position + start.velocity * tau + 0.5 * a * tau * tau,
            velocity,
            start.rotation + start.angular_velocity * tau + 0.5 * alpha * tau * tau,
            velocity / start.radius,
        );
        let t_cross = (start.time + tau).min(t_end);

        self.integrator.restart(t_cross, gripped);
        self.current = self.ball_from(&gripped);
        self.start_rolling(t_cross);
        let y = self.integrator.advance_to(&self.equation, t_end)?;
        self.current = self.ball_from(&y);
        Ok(())
    }
}

fn slip_direction(contact_speed: f64) -> f64 {
    if contact_speed < 0.0 { -1.0 } else { 1.0 }
}

impl Calculator for RollingCalculator {
    type State = Ball;

    fn state(&self) -> &Ball {
        &self.current
    }

    fn advance(&mut self, time_delta: f64) -> Result<Ball, SimError> {
        self.check_slippage_finished();

        let start = self.current.clone();
        let y = self.integrator.advance_by(&self.equation, time_delta)?;
        self.current = self.ball_from(&y);

        // contact speed changed sign inside the step
        let (d_prev, d_new) = (start.contact_speed(), self.current.contact_speed());
        if self.is_slipping() && trig::sign(d_prev) * trig::sign(d_new) < 0.0 {
            if self.environment.is_rolling_possible() {
                let tau = (self.current.time - start.time) * d_prev / (d_prev - d_new);
                self.grip_inside_step(&start, tau)?;
            } else {
                self.equation.regime = RollingRegime::WithSlippage {
                    direction: slip_direction(d_new),
                };
                debug!(t = self.current.time, "slip direction reversed");
            }
        }

        self.record_accelerations();
        Ok(self.current.clone())
    }
}

// =========================================================================================
// Pendulum
// =========================================================================================

pub struct PendulumCalculator {
    equation: PendulumEquation,
    integrator: Dopri5<2>,
    current: PendulumState,
}

impl PendulumCalculator {
    pub fn new(state: PendulumState) -> Self {
        Self::with_params(state, IntegratorParams::default())
    }

    pub fn with_params(state: PendulumState, params: IntegratorParams) -> Self {
        let y0 = Vector2::new(state.angle, state.angular_velocity);
        Self {
            equation: PendulumEquation::from_state(&state),
            integrator: Dopri5::new(state.time, y0, params),
            current: state,
        }
    }
}

impl Calculator for PendulumCalculator {
    type State = PendulumState;

    fn state(&self) -> &PendulumState {
        &self.current
    }

    fn advance(&mut self, time_delta: f64) -> Result<PendulumState, SimError> {
        let y = self.integrator.advance_by(&self.equation, time_delta)?;
        self.current = PendulumState {
            time: self.integrator.t(),
            angle: y[0],
            angular_velocity: y[1],
            ..self.current.clone()
        };
        Ok(self.current.clone())
    }
}
