use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Terminal: the reconnect budget is exhausted and no further retries
    /// are scheduled. Requires an external restart.
    Failed,
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

/// Broker session state plus the reconnect counter that drives it.
///
/// Transitions are only ever made by the event-loop driver and the graceful
/// shutdown path; everything else reads snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub reconnect_attempts: u32,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
        }
    }
}

impl ConnectionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn is_failed(&self) -> bool {
        self.state == ConnectionState::Failed
    }

    /// Start (or restart) the initial connection attempt.
    pub fn begin_connecting(&mut self) {
        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Connecting;
        }
    }

    /// Broker acknowledged the session: counter resets to zero.
    pub fn connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.reconnect_attempts = 0;
    }

    /// A transport error occurred. Bumps the attempt counter and moves to
    /// `Reconnecting`, or to the terminal `Failed` once the budget is
    /// exhausted. Returns the state to act on.
    pub fn transport_error(&mut self, max_attempts: u32) -> ConnectionState {
        if self.state == ConnectionState::Failed {
            return ConnectionState::Failed;
        }
        self.reconnect_attempts += 1;
        self.state = if self.reconnect_attempts >= max_attempts {
            ConnectionState::Failed
        } else {
            ConnectionState::Reconnecting
        };
        self.state
    }

    /// Graceful close requested by the process itself.
    pub fn disconnected(&mut self) {
        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Disconnected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connack_resets_the_attempt_counter() {
        let mut status = ConnectionStatus::new();
        status.begin_connecting();
        status.transport_error(10);
        status.transport_error(10);
        assert_eq!(status.reconnect_attempts, 2);

        status.connected();
        assert!(status.is_connected());
        assert_eq!(status.reconnect_attempts, 0);
    }

    #[test]
    fn ten_consecutive_errors_reach_failed() {
        let mut status = ConnectionStatus::new();
        status.begin_connecting();

        for attempt in 1..=9 {
            assert_eq!(status.transport_error(10), ConnectionState::Reconnecting);
            assert_eq!(status.reconnect_attempts, attempt);
        }
        assert_eq!(status.transport_error(10), ConnectionState::Failed);
        assert!(status.is_failed());
    }

    #[test]
    fn failed_is_terminal() {
        let mut status = ConnectionStatus::new();
        for _ in 0..10 {
            status.transport_error(10);
        }
        assert!(status.is_failed());

        // No transition leaves Failed without an external restart.
        status.begin_connecting();
        assert!(status.is_failed());
        status.disconnected();
        assert!(status.is_failed());
        assert_eq!(status.transport_error(10), ConnectionState::Failed);
    }

    #[test]
    fn interleaved_success_keeps_retrying_indefinitely() {
        // The ceiling only applies to consecutive failures.
        let mut status = ConnectionStatus::new();
        for _ in 0..50 {
            status.transport_error(10);
            status.connected();
        }
        assert!(status.is_connected());
    }

    #[test]
    fn graceful_close_returns_to_disconnected() {
        let mut status = ConnectionStatus::new();
        status.begin_connecting();
        status.connected();
        status.disconnected();
        assert_eq!(status.state, ConnectionState::Disconnected);
    }
}
