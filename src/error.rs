//! Error type shared by calculators, drivers and scenario building

use thiserror::Error;

/// Everything that can go wrong while building or running a lab
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Fixed-acceleration thrust recipe selected without an acceleration
    #[error("fixed-acceleration recipe requires an acceleration value")]
    MissingAcceleration,

    /// Fixed-fuel-rate thrust recipe selected without a consumption rate
    #[error("fixed-fuel-rate recipe requires a fuel consumption rate")]
    MissingFuelConsumption,

    /// Adaptive step collapsed below what `t` can resolve
    #[error("integrator step size underflow at t = {t}")]
    StepSizeUnderflow {
        /// Integrator time when the step collapsed
        t: f64,
    },

    /// One `advance` call needed more internal steps than allowed
    #[error("integrator exceeded {steps} internal steps at t = {t}")]
    TooManySteps {
        /// Integrator time when the cap was hit
        t: f64,
        /// Number of attempted internal steps
        steps: usize,
    },

    /// Driver guard: no termination criterion fired within the budget
    #[error("simulation did not terminate within {max_steps} steps")]
    StepBudgetExhausted {
        /// Configured guard
        max_steps: usize,
    },

    /// Sampling delta is negative or not finite
    #[error("invalid time delta {0}")]
    InvalidTimeDelta(f64),

    /// Configuration rejected while building a lab
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}
