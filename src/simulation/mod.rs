pub mod vector;
pub mod trig;
pub mod constants;
pub mod params;
pub mod states;
pub mod integrator;
pub mod forces;
pub mod calculator;
pub mod criteria;
pub mod engine;
pub mod scenario;
