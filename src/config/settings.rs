use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// Panel defaults for the calculator's setting mode
pub const DEFAULT_MAX_DIMENSION: u32 = 5;
pub const DEFAULT_MAX_VALUE: u32 = 9;
pub const DEFAULT_MATRICES_PER_SIZE: u32 = 2;

/// Values the board asks for while in its own setting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsConfig {
    pub max_dimension: u32,
    pub max_value: u32,
    pub matrices_per_size: u32,
    /// Answer the board's prompts without operator input
    pub auto_reply_enabled: bool,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_value: DEFAULT_MAX_VALUE,
            matrices_per_size: DEFAULT_MATRICES_PER_SIZE,
            auto_reply_enabled: false,
        }
    }
}

impl SettingsConfig {
    pub fn shared(self) -> SharedSettings {
        Arc::new(RwLock::new(self))
    }
}

/// Edited from the foreground, read by the reader task at each prompt.
pub type SharedSettings = Arc<RwLock<SettingsConfig>>;
