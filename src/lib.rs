// Recorder Settings
// Permission-gated preferences for the voice recorder

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use config::{open_store, AppConfig};
pub use error::{SettingsError, SettingsResult};
pub use models::*;
pub use services::*;
