// Error types for pitwall

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PitwallError {
    // Errors for the session data provider
    #[snafu(display("Session data provider unavailable: {reason}"))]
    ProviderUnavailable { reason: String },
    #[snafu(display("Session not loaded, no snapshot has been published yet"))]
    SessionNotLoaded,
    #[snafu(display("Error reading session file"))]
    SessionFileError { source: io::Error },
    #[snafu(display("Error parsing session snapshot"))]
    SessionParseError { source: serde_json::Error },

    // Errors while deriving and drawing panels
    #[snafu(display("Could not derive {view} view: {reason}"))]
    ViewDerivationFailed { view: String, reason: String },
    #[snafu(display("Could not render panel: {reason}"))]
    RenderFailed { reason: String },

    // Layout errors
    #[snafu(display("Invalid panel layout: {reason}"))]
    InvalidLayout { reason: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
    #[snafu(display("Invalid configuration: {field} - {reason}"))]
    InvalidConfig { field: String, reason: String },

    // Refresh task errors
    #[snafu(display("Could not start refresh task"))]
    TaskSpawnError { source: io::Error },
}

impl PitwallError {
    /// Short, single-line reason used for panel placeholders and logs.
    pub fn reason(&self) -> String {
        match self {
            PitwallError::ProviderUnavailable { reason }
            | PitwallError::ViewDerivationFailed { reason, .. }
            | PitwallError::RenderFailed { reason }
            | PitwallError::InvalidLayout { reason } => reason.clone(),
            other => other.to_string(),
        }
    }
}
