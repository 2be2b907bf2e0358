use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::broker::{ActionDispatcher, ConnectionManager, TelemetryMessage};
use crate::catalog::PlantCatalog;
use crate::error::PipelineError;
use crate::gateway::PersistenceGateway;
use crate::recommendation::{self, RecommendationConfig};
use crate::validation::validate_payload;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_error, log_info, log_warn};

/// Consume inbound telemetry until cancelled or the channel closes.
///
/// One message runs the whole validate → score → store → dispatch chain to
/// completion before the next is taken, so in-flight work is bounded by the
/// broker's own cadence and per-section ordering is preserved.
pub async fn run<G: PersistenceGateway>(
    mut inbound: mpsc::Receiver<TelemetryMessage>,
    manager: Arc<ConnectionManager>,
    catalog: Arc<PlantCatalog>,
    config: RecommendationConfig,
    gateway: G,
    cancel_token: CancellationToken,
) {
    let dispatcher = ActionDispatcher::new(Arc::clone(&manager));

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("telemetry pipeline shutting down");
                break;
            }
            message = inbound.recv() => {
                let Some(message) = message else {
                    log_warn!("inbound telemetry channel closed");
                    break;
                };
                match handle_message(&message, &catalog, &config, &gateway, &dispatcher).await {
                    Ok(()) => {}
                    Err(PipelineError::MalformedPayload(detail)) => {
                        log_error!("dropping malformed payload on {}: {detail}", message.topic);
                    }
                    Err(PipelineError::Validation(failure)) => {
                        log_error!("dropping invalid sensor reading: {failure}");
                    }
                    Err(err) => {
                        log_error!("telemetry processing failed: {err}");
                    }
                }
            }
        }
    }
}

/// Process one telemetry message end to end. Validation failures bubble up
/// to be dropped by the loop; store and dispatch failures are handled here
/// because neither may abort the in-flight recommendation.
async fn handle_message<G: PersistenceGateway>(
    message: &TelemetryMessage,
    catalog: &PlantCatalog,
    config: &RecommendationConfig,
    gateway: &G,
    dispatcher: &ActionDispatcher,
) -> Result<(), PipelineError> {
    let reading = validate_payload(&message.payload)?;

    log_info!("processing sensor data for section {}", reading.section_id);

    if let Err(err) = gateway.store_reading(&reading).await {
        log_warn!(
            "failed to store reading for section {}: {err}",
            reading.section_id
        );
    }

    let recommendation = recommendation::evaluate(&reading, catalog, config);

    if let Err(err) = gateway
        .store_recommendation(&recommendation.section_id, &recommendation)
        .await
    {
        log_warn!(
            "failed to store recommendation for section {}: {err}",
            recommendation.section_id
        );
    }

    if recommendation.requires_action {
        match dispatcher
            .dispatch(&recommendation.section_id, &recommendation.actions)
            .await
        {
            Ok(delivered) => {
                log_info!(
                    "dispatched {delivered}/{} action(s) for section {}",
                    recommendation.actions.len(),
                    recommendation.section_id
                );
            }
            Err(err) if err.is_not_connected() => {
                // No queue for unsent actuation; stale commands must not
                // replay later.
                log_warn!(
                    "dropping {} action(s) for section {}: broker not connected",
                    recommendation.actions.len(),
                    recommendation.section_id
                );
            }
            Err(err) => {
                log_error!(
                    "action dispatch failed for section {}: {err}",
                    recommendation.section_id
                );
            }
        }
    }

    Ok(())
}
