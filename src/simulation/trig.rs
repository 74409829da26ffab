//! Rounded trigonometry
//!
//! Values are rounded to 15 decimal places so that exact multiples of pi/2
//! give exact zeros. Threshold tests against zero (slippage, rolling
//! feasibility, extremum detection) depend on this.

const DECIMALS: f64 = 1e15;

fn round15(x: f64) -> f64 {
    (x * DECIMALS).round() / DECIMALS
}

pub fn sin(angle: f64) -> f64 {
    round15(angle.sin())
}

pub fn cos(angle: f64) -> f64 {
    round15(angle.cos())
}

pub fn tan(angle: f64) -> f64 {
    round15(angle.tan())
}

/// Sign with `sign(0) == 0`
///
/// Unlike `f64::signum` this does not pick a direction at rest, so a body
/// with zero velocity under constant drag feels no drag at all.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
