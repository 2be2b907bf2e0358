use thiserror::Error;

use crate::validation::ValidationFailure;

/// Failure taxonomy for the ingestion path. Nothing here is fatal to the
/// process; only exhausting the reconnect budget stops the connection
/// manager, and even that leaves the process running.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Payload could not be decoded as a telemetry reading at all.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Payload decoded but one or more fields violate the telemetry
    /// contract; carries every violation, not just the first.
    #[error("invalid sensor reading: {0}")]
    Validation(#[from] ValidationFailure),

    /// Publish attempted while the broker session is not in `Connected`.
    #[error("mqtt client not connected")]
    NotConnected,

    /// Broker-level connection failure; drives the Reconnecting state.
    #[error("mqtt transport failure: {0}")]
    Transport(#[from] rumqttc::ClientError),

    /// Persistence gateway rejected a write or read; logged, never aborts
    /// the in-flight recommendation.
    #[error("persistence gateway failure: {0}")]
    Downstream(String),
}

impl PipelineError {
    pub fn is_not_connected(&self) -> bool {
        matches!(self, PipelineError::NotConnected)
    }
}
