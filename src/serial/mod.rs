pub mod interface;
pub mod protocol;
pub mod types;
pub mod reader;
pub mod auto_reply;

pub use interface::{SerialInterface, SerialPortIO};
pub use protocol::{Mode, OutboundCommand, ValidationError};
pub use types::{EventChannel, LinkEvent, Observer, ObserverSet};
pub use reader::{spawn_reader, ReaderConfig, ReaderExit, ReaderHandle, ReaderMetrics};
pub use auto_reply::{AutoReply, AutoReplyOutcome, Prompt, ScheduledReply};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialDeviceInfo {
    pub port_name: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// An open link to the device. At most one exists per `SerialInterface`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub port_name: String,
    pub baud_rate: u32,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Port already open")]
    AlreadyConnected,

    #[error("Not connected")]
    NotConnected,

    #[error("Task aborted: {0}")]
    TaskAborted(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialport error: {0}")]
    SerialportError(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, SerialError>;
