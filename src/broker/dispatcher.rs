use std::sync::Arc;

use chrono::Utc;
use log::{error, info};
use serde::Serialize;

use crate::error::PipelineError;
use crate::models::recommendation::ActionCommand;

use super::manager::ConnectionManager;

const COMMAND_SOURCE: &str = "vegetation_algorithm";

/// Outbound wire format for one actuation command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandEnvelope<'a> {
    command: &'a str,
    parameters: &'a serde_json::Value,
    timestamp: i64,
    source: &'static str,
}

/// Publishes recommended actions on the command topic, one message per
/// command, at-least-once, not retained.
///
/// There is no queue for unsent commands: actuation that could not be
/// delivered now is not safe to replay later, so the caller logs and drops.
pub struct ActionDispatcher {
    manager: Arc<ConnectionManager>,
}

impl ActionDispatcher {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// Dispatch a batch of commands. Fails fast with `NotConnected` before
    /// any network call when the session is down; otherwise each publish is
    /// awaited individually and one failure does not block the rest of the
    /// batch. Returns how many commands were accepted for delivery.
    pub async fn dispatch(
        &self,
        section_id: &str,
        actions: &[ActionCommand],
    ) -> Result<usize, PipelineError> {
        if !self.manager.is_connected().await {
            return Err(PipelineError::NotConnected);
        }

        let topic = self.manager.topics().commands.clone();
        let mut delivered = 0;

        for action in actions {
            let envelope = CommandEnvelope {
                command: &action.command,
                parameters: &action.parameters,
                timestamp: Utc::now().timestamp_millis(),
                source: COMMAND_SOURCE,
            };

            match self.manager.publish_json(&topic, &envelope, false).await {
                Ok(()) => {
                    delivered += 1;
                    info!(
                        "dispatched {} command for section {section_id}",
                        action.command
                    );
                }
                Err(err) => {
                    error!(
                        "failed to dispatch {} command for section {section_id}: {err}",
                        action.command
                    );
                }
            }
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::state::ConnectionState;
    use crate::models::recommendation::ActionPriority;
    use serde_json::json;

    fn irrigate_action() -> ActionCommand {
        ActionCommand {
            command: "irrigate_now".into(),
            parameters: json!({"sectionId": "s1", "duration": 300, "priority": "high"}),
            priority: ActionPriority::High,
        }
    }

    #[tokio::test]
    async fn dispatch_fails_fast_when_not_connected() {
        let (manager, _el) = ConnectionManager::for_tests(ConnectionState::Disconnected);
        let dispatcher = ActionDispatcher::new(manager);

        let result = dispatcher.dispatch("s1", &[irrigate_action()]).await;
        assert!(matches!(result, Err(PipelineError::NotConnected)));
    }

    #[tokio::test]
    async fn dispatch_fails_fast_while_reconnecting() {
        let (manager, _el) = ConnectionManager::for_tests(ConnectionState::Reconnecting);
        let dispatcher = ActionDispatcher::new(manager);

        let result = dispatcher.dispatch("s1", &[irrigate_action()]).await;
        assert!(matches!(result, Err(PipelineError::NotConnected)));
    }

    #[tokio::test]
    async fn dispatch_publishes_each_command_in_a_batch() {
        let (manager, _el) = ConnectionManager::for_tests(ConnectionState::Connected);
        let dispatcher = ActionDispatcher::new(manager);

        let actions = vec![
            irrigate_action(),
            ActionCommand {
                command: "ventilation_required".into(),
                parameters: json!({"sectionId": "s1", "gasLevel": 0.6, "priority": "high"}),
                priority: ActionPriority::High,
            },
        ];

        let delivered = dispatcher.dispatch("s1", &actions).await.unwrap();
        assert_eq!(delivered, 2);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let (manager, _el) = ConnectionManager::for_tests(ConnectionState::Connected);
        let dispatcher = ActionDispatcher::new(manager);

        let delivered = dispatcher.dispatch("s1", &[]).await.unwrap();
        assert_eq!(delivered, 0);
    }

    #[test]
    fn envelope_serializes_with_source_tag() {
        let action = irrigate_action();
        let envelope = CommandEnvelope {
            command: &action.command,
            parameters: &action.parameters,
            timestamp: 1_700_000_000_000,
            source: COMMAND_SOURCE,
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["command"], "irrigate_now");
        assert_eq!(value["source"], "vegetation_algorithm");
        assert_eq!(value["parameters"]["duration"], 300);
    }
}
