// Settings Errors
// Failure taxonomy shared by the store backends and the controller

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors that can occur while reading, writing, or editing preferences
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Period text that is not a number of minutes, or rounds down to zero seconds
    #[error("Invalid recording period: {0}")]
    InvalidPeriod(String),

    /// Clip count text that is not a positive integer
    #[error("Invalid clip count: {0}")]
    InvalidClipCount(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
