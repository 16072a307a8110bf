//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>m, <number>s, <number>ms or a combination (e.g., 30s, 1m, 2m30s, 1s500ms)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Terminal outcome of a failed recorder operation.
///
/// The display text of each variant is the guidance shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Audio recording is not supported in this environment.")]
    UnsupportedPlatform,

    #[error("Microphone access requires a secure connection. Open this page over HTTPS and try again.")]
    InsecureContext,

    #[error("Microphone access was denied. Allow microphone permission and try again.")]
    PermissionDenied,

    #[error("No microphone was found. Connect or enable a microphone and try again.")]
    DeviceNotFound,

    #[error("The microphone is in use by another application. Close it and try again.")]
    DeviceBusy,

    #[error("{0}")]
    Unknown(String),

    #[error("No recording is in progress")]
    NotRecording,

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("Audio encoder failed: {0}")]
    EncoderFault(String),
}

impl CaptureError {
    /// Stable machine-readable identifier for the error kind
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform => "unsupported_platform",
            Self::InsecureContext => "insecure_context",
            Self::PermissionDenied => "permission_denied",
            Self::DeviceNotFound => "device_not_found",
            Self::DeviceBusy => "device_busy",
            Self::Unknown(_) => "unknown",
            Self::NotRecording => "not_recording",
            Self::AlreadyRecording => "already_recording",
            Self::EncoderFault(_) => "encoder_fault",
        }
    }

    /// Whether the caller misused the recorder rather than the host failing
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::NotRecording | Self::AlreadyRecording)
    }
}
