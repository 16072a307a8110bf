//! Capture device port interfaces

use async_trait::async_trait;
use thiserror::Error;

/// Constraints passed to the host when requesting an input device.
///
/// Every field left as `None` lets the host pick; [`AudioConstraints::permissive`]
/// is what the recorder always asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioConstraints {
    pub device_id: Option<String>,
    pub echo_cancellation: Option<bool>,
    pub noise_suppression: Option<bool>,
    pub auto_gain_control: Option<bool>,
}

impl AudioConstraints {
    /// Any audio input, no processing flags
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Check that nothing narrows the host's choice
    pub fn is_permissive(&self) -> bool {
        *self == Self::permissive()
    }
}

/// Whether the host can capture audio at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSupport {
    Available,
    Unsupported,
    InsecureContext,
}

/// Category the host attached to a failed device request.
///
/// `Other` and `Abort` carry no reliable meaning; classification
/// falls back to the message text for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    NotAllowed,
    NotFound,
    NotReadable,
    Overconstrained,
    Security,
    Abort,
    Other,
}

/// Raw failure reported by the capture host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({kind:?})")]
pub struct PlatformError {
    pub kind: PlatformErrorKind,
    pub message: String,
}

impl PlatformError {
    /// Create a platform error
    pub fn new(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an uncategorized platform error
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(PlatformErrorKind::Other, message)
    }
}

/// A live connection to an input device.
pub trait AudioStream: Send {
    /// Stop every track of the stream. Calling it again is a no-op.
    fn stop_tracks(&mut self);

    /// Check whether any track is still live
    fn is_live(&self) -> bool;
}

/// Port for acquiring input devices from the host
#[async_trait]
pub trait MediaDevices: Send + Sync {
    type Stream: AudioStream + 'static;

    /// Report whether capture is possible in this environment.
    fn support(&self) -> CaptureSupport;

    /// Request a live input stream.
    ///
    /// # Arguments
    /// * `constraints` - What the stream must satisfy
    ///
    /// # Returns
    /// An exclusively owned stream, or the host's raw error
    async fn get_user_media(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<Self::Stream, PlatformError>;
}
