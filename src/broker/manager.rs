use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};
use serde::Serialize;
use serde_json::json;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, Topics};
use crate::error::PipelineError;

use super::state::{ConnectionState, ConnectionStatus};

const KEEP_ALIVE_SECS: u64 = 30;
const REQUEST_CHANNEL_CAPACITY: usize = 64;
const INBOUND_CHANNEL_CAPACITY: usize = 32;
const SHUTDOWN_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// A raw telemetry message lifted off the broker, before validation.
#[derive(Debug, Clone)]
pub struct TelemetryMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusMessage<'a> {
    status: &'a str,
    reason: &'a str,
    timestamp: i64,
    /// Seconds since the manager came up.
    uptime: u64,
}

/// Owns the broker session: connect, subscribe, publish, reconnect with a
/// fixed delay and a hard attempt ceiling, last-will registration, and the
/// periodic status heartbeat.
///
/// Constructed once at startup and shared by handle; no hidden globals.
pub struct ConnectionManager {
    client: AsyncClient,
    status: Arc<RwLock<ConnectionStatus>>,
    topics: Topics,
    started_at: Instant,
    cancel: CancellationToken,
    driver: Mutex<Option<JoinHandle<()>>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Connect to the broker and spawn the event-loop driver and heartbeat
    /// tasks. Returns the shared manager handle plus the channel inbound
    /// telemetry arrives on.
    pub async fn start(
        config: &Config,
        cancel: CancellationToken,
    ) -> Result<(Arc<Self>, mpsc::Receiver<TelemetryMessage>)> {
        let options = build_mqtt_options(config).context("invalid broker configuration")?;

        info!(
            "connecting to MQTT broker at {}:{} as '{}'",
            config.broker_host, config.broker_port, config.client_id
        );

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);

        let manager = Arc::new(Self {
            client,
            status: Arc::new(RwLock::new(ConnectionStatus::new())),
            topics: config.topics.clone(),
            started_at: Instant::now(),
            cancel: cancel.clone(),
            driver: Mutex::new(None),
            heartbeat: Mutex::new(None),
        });

        let driver = tokio::spawn(drive_event_loop(
            eventloop,
            Arc::clone(&manager),
            inbound_tx,
            config.max_reconnect_attempts,
            config.reconnect_delay,
        ));
        let heartbeat = tokio::spawn(heartbeat_loop(
            Arc::clone(&manager),
            config.status_heartbeat,
        ));

        // Stash the handles so shutdown() can join them.
        *manager.driver.lock().await = Some(driver);
        *manager.heartbeat.lock().await = Some(heartbeat);

        Ok((manager, inbound_rx))
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub async fn is_connected(&self) -> bool {
        self.status.read().await.is_connected()
    }

    /// Snapshot of the current session state and reconnect counter.
    pub async fn status(&self) -> ConnectionStatus {
        self.status.read().await.clone()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Publish a JSON payload at QoS 1. Fails with `NotConnected` before
    /// touching the network when the session is not `Connected`.
    pub async fn publish_json<T: Serialize>(
        &self,
        topic: &str,
        payload: &T,
        retain: bool,
    ) -> Result<(), PipelineError> {
        if !self.is_connected().await {
            return Err(PipelineError::NotConnected);
        }

        let bytes = serde_json::to_vec(payload)
            .map_err(|err| PipelineError::MalformedPayload(err.to_string()))?;
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, bytes)
            .await?;
        Ok(())
    }

    /// Publish a retained status message on the status topic.
    pub async fn publish_status(&self, status: &str, reason: &str) -> Result<(), PipelineError> {
        let message = StatusMessage {
            status,
            reason,
            timestamp: Utc::now().timestamp_millis(),
            uptime: self.uptime_secs(),
        };
        let topic = self.topics.status.clone();
        self.publish_json(&topic, &message, true).await
    }

    /// Cooperative shutdown: cancels the driver (which publishes the
    /// offline status and closes the session) and joins both tasks.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        if let Some(handle) = self.heartbeat.lock().await.take() {
            if let Err(err) = handle.await {
                error!("heartbeat task failed to join: {err}");
            }
        }
        if let Some(handle) = self.driver.lock().await.take() {
            if let Err(err) = handle.await {
                error!("event loop task failed to join: {err}");
            }
        }
    }
}

fn build_mqtt_options(config: &Config) -> Result<MqttOptions> {
    let mut options = MqttOptions::new(
        config.client_id.clone(),
        config.broker_host.clone(),
        config.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(KEEP_ALIVE_SECS));
    options.set_clean_session(true);

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username.clone(), password.clone());
    }

    // Registered with the broker at connect time so offline status is
    // announced even when the process dies without a graceful close.
    let will_payload = serde_json::to_vec(&json!({
        "status": "offline",
        "reason": "unexpected_disconnect",
        "timestamp": Utc::now().timestamp_millis(),
    }))?;
    options.set_last_will(LastWill::new(
        config.topics.status.clone(),
        will_payload,
        QoS::AtLeastOnce,
        true,
    ));

    Ok(options)
}

/// Drive the rumqttc event loop: forward inbound telemetry, track the
/// connection state machine, and retry with a fixed delay until the attempt
/// ceiling is reached.
async fn drive_event_loop(
    mut eventloop: EventLoop,
    manager: Arc<ConnectionManager>,
    inbound_tx: mpsc::Sender<TelemetryMessage>,
    max_reconnect_attempts: u32,
    reconnect_delay: Duration,
) {
    manager.status.write().await.begin_connecting();

    loop {
        let event = tokio::select! {
            _ = manager.cancel.cancelled() => {
                graceful_close(&mut eventloop, &manager).await;
                return;
            }
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                manager.status.write().await.connected();
                info!("connected to MQTT broker");

                if let Err(err) = manager
                    .client
                    .subscribe(manager.topics.telemetry.as_str(), QoS::AtLeastOnce)
                    .await
                {
                    error!(
                        "failed to subscribe to {}: {err}",
                        manager.topics.telemetry
                    );
                } else {
                    info!("subscribed to {}", manager.topics.telemetry);
                }

                if let Err(err) = manager.publish_status("online", "connected_successfully").await
                {
                    warn!("failed to publish online status: {err}");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if publish.topic != manager.topics.telemetry {
                    debug!("ignoring message on unexpected topic {}", publish.topic);
                    continue;
                }
                let message = TelemetryMessage {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                };
                // Backpressure on a full channel intentionally stalls the
                // poll loop: one message is processed to completion before
                // the broker feeds us far ahead.
                if inbound_tx.send(message).await.is_err() {
                    warn!("telemetry consumer dropped, closing event loop");
                    manager.status.write().await.disconnected();
                    return;
                }
            }
            Ok(_) => {}
            Err(err) => {
                let (state, attempts) = {
                    let mut status = manager.status.write().await;
                    let state = status.transport_error(max_reconnect_attempts);
                    (state, status.reconnect_attempts)
                };

                match state {
                    ConnectionState::Failed => {
                        error!(
                            "mqtt transport error: {err}; max reconnection attempts \
                             ({max_reconnect_attempts}) reached, giving up"
                        );
                        return;
                    }
                    _ => {
                        warn!(
                            "mqtt transport error: {err}; reconnecting \
                             (attempt {attempts}/{max_reconnect_attempts})"
                        );
                        tokio::select! {
                            _ = manager.cancel.cancelled() => {
                                manager.status.write().await.disconnected();
                                return;
                            }
                            // Fixed delay, deliberately not exponential.
                            _ = tokio::time::sleep(reconnect_delay) => {}
                        }
                    }
                }
            }
        }
    }
}

/// Publish the offline status and close the session. Publishes still in
/// flight when the flush window closes are logged and abandoned.
async fn graceful_close(eventloop: &mut EventLoop, manager: &Arc<ConnectionManager>) {
    if manager.is_connected().await {
        if let Err(err) = manager.publish_status("offline", "graceful_shutdown").await {
            warn!("failed to publish offline status during shutdown: {err}");
        }
        if let Err(err) = manager.client.disconnect().await {
            warn!("failed to request disconnect: {err}");
        }

        // Keep polling briefly so the offline publish and DISCONNECT
        // actually reach the wire.
        let flush = async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        if tokio::time::timeout(SHUTDOWN_FLUSH_TIMEOUT, flush).await.is_err() {
            warn!("shutdown flush timed out; offline status may not have been delivered");
        }
    }

    manager.status.write().await.disconnected();
    info!("mqtt client disconnected");
}

/// Publish a periodic status heartbeat, independent of message processing.
async fn heartbeat_loop(manager: Arc<ConnectionManager>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The connect handler already announced "online"; skip the immediate
    // first tick.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = manager.cancel.cancelled() => return,
            _ = ticker.tick() => {
                match manager.publish_status("online", "heartbeat").await {
                    Ok(()) => debug!("status heartbeat published"),
                    Err(err) if err.is_not_connected() => {
                        debug!("skipping heartbeat: not connected")
                    }
                    Err(err) => warn!("failed to publish heartbeat: {err}"),
                }
            }
        }
    }
}

#[cfg(test)]
impl ConnectionManager {
    /// Manager around an unpolled client, for exercising the publish path
    /// without a broker.
    pub(crate) fn for_tests(state: ConnectionState) -> (Arc<Self>, EventLoop) {
        let options = MqttOptions::new("verdant-test", "127.0.0.1", 1883);
        let (client, eventloop) = AsyncClient::new(options, 10);
        let status = ConnectionStatus {
            state,
            reconnect_attempts: 0,
        };
        let manager = Arc::new(Self {
            client,
            status: Arc::new(RwLock::new(status)),
            topics: Topics::default(),
            started_at: Instant::now(),
            cancel: CancellationToken::new(),
            driver: Mutex::new(None),
            heartbeat: Mutex::new(None),
        });
        (manager, eventloop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_while_disconnected_fails_fast() {
        let (manager, _el) = ConnectionManager::for_tests(ConnectionState::Disconnected);
        let result = manager.publish_status("online", "test").await;
        assert!(matches!(result, Err(PipelineError::NotConnected)));
    }

    #[tokio::test]
    async fn publish_while_reconnecting_fails_fast() {
        let (manager, _el) = ConnectionManager::for_tests(ConnectionState::Reconnecting);
        let result = manager
            .publish_json("some/topic", &json!({"x": 1}), false)
            .await;
        assert!(matches!(result, Err(PipelineError::NotConnected)));
    }

    #[tokio::test]
    async fn publish_while_connected_is_accepted() {
        // The unpolled event loop buffers the request; acceptance into the
        // request queue is all the client-side contract promises.
        let (manager, _el) = ConnectionManager::for_tests(ConnectionState::Connected);
        let result = manager
            .publish_json("some/topic", &json!({"x": 1}), false)
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn mqtt_options_carry_last_will() {
        let config = Config::default();
        let options = build_mqtt_options(&config).unwrap();
        let will = options.last_will().expect("last will must be registered");
        assert_eq!(will.topic, config.topics.status);
        assert_eq!(will.qos, QoS::AtLeastOnce);
        assert!(will.retain);

        let payload: serde_json::Value = serde_json::from_slice(&will.message).unwrap();
        assert_eq!(payload["status"], "offline");
        assert_eq!(payload["reason"], "unexpected_disconnect");
    }
}
