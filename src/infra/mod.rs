//! Infrastructure adapters: Postgres repositories and telemetry wiring.

pub mod db;
pub mod error;
pub mod telemetry;

pub use error::InfraError;
