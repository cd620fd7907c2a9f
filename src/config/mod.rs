pub mod settings;
pub mod options;

pub use settings::{SettingsConfig, SharedSettings};
pub use options::LinkOptions;
