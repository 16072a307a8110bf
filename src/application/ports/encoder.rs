//! Native incremental encoder port used by the lossy pipeline

use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::mpsc;

use super::capture::AudioStream;

/// Events emitted by a running encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A chunk of container bytes, possibly empty
    Data(Vec<u8>),
    /// The encoder hit an error mid-session
    Error(String),
    /// Finalize acknowledgement; no events follow
    Stopped,
}

/// Receiving end of an encoder's event channel
pub type EncoderEvents = mpsc::UnboundedReceiver<EncoderEvent>;

/// Encoder run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Inactive,
    Recording,
}

/// Encoder errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderError {
    #[error("Encoder unavailable: {0}")]
    Unavailable(String),

    #[error("Encoder is not recording")]
    InvalidState,

    #[error("Encoder failed: {0}")]
    Failed(String),
}

/// A host-provided encoder fed directly from a stream
pub trait NativeEncoder: Send {
    /// Media type actually negotiated, if the host reports one
    fn mime_type(&self) -> Option<String>;

    /// Current run state
    fn state(&self) -> EncoderState;

    /// Begin encoding, emitting a chunk every `timeslice`
    fn start(&mut self, timeslice: StdDuration) -> Result<EncoderEvents, EncoderError>;

    /// Ask the encoder to finalize. Remaining data is emitted,
    /// followed by [`EncoderEvent::Stopped`].
    /// Fails with [`EncoderError::InvalidState`] unless recording.
    fn stop(&mut self) -> Result<(), EncoderError>;
}

/// Port for probing and creating native encoders
pub trait EncoderFactory<S: AudioStream>: Send + Sync {
    type Encoder: NativeEncoder + 'static;

    /// Check whether a container/codec identifier can be produced
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Create an encoder over `stream`, with an optional media type hint
    fn create(&self, stream: &S, mime_type: Option<&str>) -> Result<Self::Encoder, EncoderError>;
}
