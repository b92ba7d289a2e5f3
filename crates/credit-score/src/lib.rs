pub mod config;
pub mod error;
pub mod score;
pub mod telemetry;
