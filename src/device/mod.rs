pub mod manager;
pub mod models;

pub use manager::DeviceManager;
pub use models::*;

use crate::serial::{SerialError, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device already connected")]
    AlreadyConnected,

    #[error("Connection error: {0}")]
    Connection(#[source] SerialError),

    #[error("Send error: {0}")]
    Send(#[source] SerialError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
