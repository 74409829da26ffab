//! Numerical parameters for the adaptive integrator
//!
//! `IntegratorParams` holds:
//! - optional initial step size (`None` picks one automatically),
//! - error tolerances for the embedded error estimate,
//! - a cap on internal steps per `advance` call

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorParams {
    pub h0: Option<f64>, // initial step size
    pub atol: f64, // absolute error tolerance
    pub rtol: f64, // relative error tolerance
    pub max_internal_steps: usize, // attempted steps allowed per call
}

impl Default for IntegratorParams {
    fn default() -> Self {
        Self {
            h0: None,
            atol: 1e-12,
            rtol: 1e-6,
            max_internal_steps: 100_000,
        }
    }
}
