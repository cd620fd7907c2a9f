use serde::{Deserialize, Serialize};

pub use crate::serial::Connection;

/// Device connection state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Error(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// What the panel shows in its status bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkStatus {
    pub state: ConnectionState,
    pub connection: Option<Connection>,
}

impl LinkStatus {
    pub fn summary(&self) -> String {
        match (&self.state, &self.connection) {
            (ConnectionState::Connected, Some(c)) => format!("Connected to {} at {}", c.port_name, c.baud_rate),
            (ConnectionState::Error(msg), _) => format!("Error: {}", msg),
            _ => "Disconnected".to_string(),
        }
    }
}
