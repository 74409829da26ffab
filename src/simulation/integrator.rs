//! Adaptive explicit Runge–Kutta integrator
//!
//! Dormand–Prince 5(4) with an embedded error estimate and step-size control.
//! The integrator keeps its own time, state and step size between calls, so
//! every `advance_by` continues from where the previous one stopped

use nalgebra::SVector;
use tracing::trace;

use crate::error::SimError;
use super::params::IntegratorParams;

/// Right-hand side of `dy/dt = f(t, y)` for an `N`-dimensional state
pub trait OdeSystem<const N: usize> {
    fn derivatives(&self, t: f64, y: &SVector<f64, N>) -> SVector<f64, N>;
}

// =========================================================================================
// Butcher tableau
// =========================================================================================

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th order weights (row 7 of the tableau, FSAL)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// difference between 5th and 4th order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Dormand–Prince 5(4) stepper over a fixed-size state vector
#[derive(Debug, Clone)]
pub struct Dopri5<const N: usize> {
    t: f64, // current time
    y: SVector<f64, N>, // current state
    h: Option<f64>, // step size to try next, chosen on first use
    params: IntegratorParams,
}

impl<const N: usize> Dopri5<N> {
    pub fn new(t0: f64, y0: SVector<f64, N>, params: IntegratorParams) -> Self {
        Self {
            t: t0,
            y: y0,
            h: params.h0.filter(|h| *h > 0.0),
            params,
        }
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn state(&self) -> &SVector<f64, N> {
        &self.y
    }

    /// Integrate from the current time to `t + dt` and return the new state
    /// `dt == 0` is a query and returns the current state untouched
    pub fn advance_by<S>(&mut self, system: &S, dt: f64) -> Result<SVector<f64, N>, SimError>
    where
        S: OdeSystem<N> + ?Sized,
    {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimError::InvalidTimeDelta(dt));
        }
        if dt == 0.0 {
            return Ok(self.y);
        }
        let t_end = self.t + dt;
        self.advance_to(system, t_end)
    }

    /// Restart from `y` at time `t`, keeping the current step size
    /// Used when the equation changes in the middle of a sampling step
    pub fn restart(&mut self, t: f64, y: SVector<f64, N>) {
        self.t = t;
        self.y = y;
    }

    /// Integrate up to the absolute time `t_end`, which must not lie behind `t`
    pub fn advance_to<S>(&mut self, system: &S, t_end: f64) -> Result<SVector<f64, N>, SimError>
    where
        S: OdeSystem<N> + ?Sized,
    {
        let dt = t_end - self.t;
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimError::InvalidTimeDelta(dt));
        }
        if dt == 0.0 {
            return Ok(self.y);
        }

        let mut h = match self.h {
            Some(h) => h,
            None => self.initial_step(system, dt),
        };

        let mut steps = 0;
        while self.t < t_end {
            steps += 1;
            if steps > self.params.max_internal_steps {
                return Err(SimError::TooManySteps { t: self.t, steps: steps - 1 });
            }

            // last step lands exactly on t_end
            let remaining = t_end - self.t;
            let last = h >= remaining;
            let step = if last { remaining } else { h };

            let (y_new, err) = self.try_step(system, step);
            let en = self.error_norm(&err, &y_new);

            if en <= 1.0 {
                self.t = if last { t_end } else { self.t + step };
                self.y = y_new;
                let factor = if en > 0.0 {
                    (SAFETY * en.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                } else {
                    MAX_FACTOR
                };
                // a clamped final step says nothing about the natural step size
                if !last {
                    h = step * factor;
                }
            } else {
                h = step * (SAFETY * en.powf(-0.2)).max(MIN_FACTOR);
                trace!(t = self.t, step, error = en, "step rejected");
                let min_step = 16.0 * f64::EPSILON * self.t.abs().max(1.0);
                if h < min_step {
                    return Err(SimError::StepSizeUnderflow { t: self.t });
                }
            }
        }

        self.h = Some(h);
        Ok(self.y)
    }

    /// One Dormand–Prince step of size `h` from the current state
    /// Returns the 5th order solution and the local error estimate
    fn try_step<S>(&self, system: &S, h: f64) -> (SVector<f64, N>, SVector<f64, N>)
    where
        S: OdeSystem<N> + ?Sized,
    {
        let t = self.t;
        let y = &self.y;

        let k1 = system.derivatives(t, y);
        let k2 = system.derivatives(t + C2 * h, &(y + h * (A21 * k1)));
        let k3 = system.derivatives(t + C3 * h, &(y + h * (A31 * k1 + A32 * k2)));
        let k4 = system.derivatives(t + C4 * h, &(y + h * (A41 * k1 + A42 * k2 + A43 * k3)));
        let k5 = system.derivatives(
            t + C5 * h,
            &(y + h * (A51 * k1 + A52 * k2 + A53 * k3 + A54 * k4)),
        );
        let k6 = system.derivatives(
            t + h,
            &(y + h * (A61 * k1 + A62 * k2 + A63 * k3 + A64 * k4 + A65 * k5)),
        );

        let y_new = y + h * (B1 * k1 + B3 * k3 + B4 * k4 + B5 * k5 + B6 * k6);
        let k7 = system.derivatives(t + h, &y_new);

        let err = h * (E1 * k1 + E3 * k3 + E4 * k4 + E5 * k5 + E6 * k6 + E7 * k7);
        (y_new, err)
    }

    /// RMS of the error scaled by `atol + rtol * max(|y|, |y_new|)`
    fn error_norm(&self, err: &SVector<f64, N>, y_new: &SVector<f64, N>) -> f64 {
        let sum: f64 = err
            .iter()
            .zip(self.y.iter().zip(y_new.iter()))
            .map(|(e, (a, b))| {
                let scale = self.params.atol + self.params.rtol * a.abs().max(b.abs());
                (e / scale).powi(2)
            })
            .sum();
        (sum / N as f64).sqrt()
    }

    /// Starting step size estimate (Hairer, Nørsett & Wanner, II.4)
    fn initial_step<S>(&self, system: &S, span: f64) -> f64
    where
        S: OdeSystem<N> + ?Sized,
    {
        let scale = self.y.map(|v| self.params.atol + self.params.rtol * v.abs());
        let rms = |v: &SVector<f64, N>| (v.component_div(&scale).norm_squared() / N as f64).sqrt();

        let f0 = system.derivatives(self.t, &self.y);
        let d0 = rms(&self.y);
        let d1 = rms(&f0);

        let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
        let h0 = h0.min(span);

        let f1 = system.derivatives(self.t + h0, &(self.y + h0 * f0));
        let d2 = rms(&(f1 - f0)) / h0;

        let h1 = if d1.max(d2) <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(0.2)
        };

        (100.0 * h0).min(h1).min(span)
    }
}
