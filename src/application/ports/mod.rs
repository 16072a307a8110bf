//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod sink;

// Re-export common types
pub use capture::{
    AudioConstraints, AudioStream, CaptureSupport, MediaDevices, PlatformError,
    PlatformErrorKind,
};
pub use config::ConfigStore;
pub use encoder::{
    EncoderError, EncoderEvent, EncoderEvents, EncoderFactory, EncoderState, NativeEncoder,
};
pub use engine::{AudioEngine, AudioEngineFactory, BlockReceiver, EngineError, EngineState};
pub use sink::{ArtifactSink, SinkError};
