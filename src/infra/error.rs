use thiserror::Error;

/// Failures raised while wiring process-level infrastructure, before any
/// service is available to report through.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
