use std::time::Duration;

use anyhow::{bail, Context, Result};
use rand::Rng;

/// Topic names for the three broker channels the pipeline touches.
#[derive(Debug, Clone)]
pub struct Topics {
    /// Inbound telemetry, subscribed at QoS 1.
    pub telemetry: String,
    /// Outbound actuation commands, QoS 1, not retained.
    pub commands: String,
    /// Outbound status messages, QoS 1, retained.
    pub status: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            telemetry: "agri/irrigation/data".into(),
            commands: "agri/car/control".into(),
            status: "agri/system/status".into(),
        }
    }
}

/// Environment-sourced runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topics: Topics,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub status_heartbeat: Duration,
    /// How long the external cleanup routine keeps readings around. Carried
    /// here for the store; the core never deletes.
    pub reading_retention_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_host: "localhost".into(),
            broker_port: 1883,
            client_id: default_client_id(),
            username: None,
            password: None,
            topics: Topics::default(),
            max_reconnect_attempts: 10,
            reconnect_delay: Duration::from_millis(5000),
            status_heartbeat: Duration::from_secs(60),
            reading_retention_days: 30,
        }
    }
}

impl Config {
    /// Build a configuration from the process environment, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let (broker_host, broker_port) = match std::env::var("MQTT_BROKER_URL") {
            Ok(url) => parse_broker_url(&url)
                .with_context(|| format!("invalid MQTT_BROKER_URL '{url}'"))?,
            Err(_) => (defaults.broker_host, defaults.broker_port),
        };

        let topics = Topics {
            telemetry: env_or("MQTT_TOPIC_SENSOR_DATA", defaults.topics.telemetry),
            commands: env_or("MQTT_TOPIC_CAR_CONTROL", defaults.topics.commands),
            status: env_or("MQTT_TOPIC_SYSTEM_STATUS", defaults.topics.status),
        };

        Ok(Self {
            broker_host,
            broker_port,
            client_id: env_or("MQTT_CLIENT_ID", defaults.client_id),
            username: std::env::var("MQTT_USERNAME").ok(),
            password: std::env::var("MQTT_PASSWORD").ok(),
            topics,
            max_reconnect_attempts: env_parse(
                "MQTT_MAX_RECONNECT_ATTEMPTS",
                defaults.max_reconnect_attempts,
            )?,
            reconnect_delay: Duration::from_millis(env_parse(
                "MQTT_RECONNECT_DELAY_MS",
                defaults.reconnect_delay.as_millis() as u64,
            )?),
            status_heartbeat: Duration::from_secs(env_parse(
                "STATUS_HEARTBEAT_SECS",
                defaults.status_heartbeat.as_secs(),
            )?),
            reading_retention_days: env_parse(
                "READING_RETENTION_DAYS",
                defaults.reading_retention_days,
            )?,
        })
    }
}

fn default_client_id() -> String {
    let mut rng = rand::thread_rng();
    format!("verdant-{:04x}", rng.gen_range(0..0x10000))
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {key}: '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Accepts `mqtt://host:port`, `tcp://host:port`, `host:port`, or a bare
/// host (port defaults to 1883).
fn parse_broker_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    if stripped.is_empty() {
        bail!("empty broker address");
    }

    match stripped.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                bail!("missing host");
            }
            let port = port
                .parse::<u16>()
                .with_context(|| format!("invalid port '{port}'"))?;
            Ok((host.to_string(), port))
        }
        None => Ok((stripped.to_string(), 1883)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_mqtt_url() {
        let (host, port) = parse_broker_url("mqtt://broker.example.com:8883").unwrap();
        assert_eq!(host, "broker.example.com");
        assert_eq!(port, 8883);
    }

    #[test]
    fn parses_bare_host_with_default_port() {
        let (host, port) = parse_broker_url("localhost").unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parses_host_port_without_scheme() {
        let (host, port) = parse_broker_url("10.0.0.5:1884").unwrap();
        assert_eq!(host, "10.0.0.5");
        assert_eq!(port, 1884);
    }

    #[test]
    fn rejects_bad_port() {
        assert!(parse_broker_url("mqtt://broker:notaport").is_err());
        assert!(parse_broker_url("mqtt://").is_err());
    }

    #[test]
    fn defaults_match_contract() {
        let cfg = Config::default();
        assert_eq!(cfg.max_reconnect_attempts, 10);
        assert_eq!(cfg.reconnect_delay, Duration::from_millis(5000));
        assert_eq!(cfg.topics.telemetry, "agri/irrigation/data");
        assert_eq!(cfg.reading_retention_days, 30);
        assert!(cfg.client_id.starts_with("verdant-"));
    }
}
