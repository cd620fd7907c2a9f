pub mod serial;
pub mod device;
pub mod config;

pub use config::{LinkOptions, SettingsConfig};
pub use device::{DeviceError, DeviceManager};
pub use serial::{LinkEvent, Observer, OutboundCommand};

/// Install the process-wide logger. `RUST_LOG` overrides the default level.
/// Calling it twice is harmless.
pub fn init_logging() {
    let default_level = if cfg!(debug_assertions) { "info" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}
