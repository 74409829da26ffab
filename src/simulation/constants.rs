//! Physical constants used by the labs (SI units)

pub const G: f64 = 6.674e-11; // gravitational constant
pub const STANDARD_GRAVITY: f64 = 9.81; // g at Earth surface

pub const EARTH_MASS: f64 = 5.972e24;
pub const EARTH_RADIUS: f64 = 6_371_000.0;
pub const MARS_MASS: f64 = 6.417e23;
pub const MARS_RADIUS: f64 = 3_389_500.0;
pub const SUN_MASS: f64 = 1.989e30;
pub const SUN_RADIUS: f64 = 696_340_000.0;

pub const EARTH_ORBIT_RADIUS: f64 = 1.496e11;
pub const MARS_ORBIT_RADIUS: f64 = 2.279e11;

pub const DAY: f64 = 86_400.0;

/// Longest trip a crew survives on board, seconds
pub const HUMAN_EXPIRATION_TIME: f64 = 500.0 * DAY;

/// Overload limit in units of g
pub const MAX_HUMANLY_VIABLE_OVERLOAD: f64 = 10.0;

/// Altitude above Earth surface where the interplanetary stage starts
pub const APPROXIMATE_TAKE_OFF_HEIGHT: f64 = 2_336_000.0;

/// Planet radius multiplier that counts as "arrived"
pub const CAPTURE_RADIUS_FACTOR: f64 = 50.0;

/// Placeholder fuel mass for the reversed landing run; the real budget is
/// read off the end of the reversed trajectory
pub const LANDING_SEED_FUEL_MASS: f64 = 1.0;

/// Contact speed below which slipping counts as finished, m/s
pub const SLIPPAGE_EPSILON: f64 = 1e-2;
