//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces:
//! cpal capture, Ogg Opus encoding, XDG config and file delivery.

pub mod capture;
pub mod config;
pub mod encoder;
pub mod sink;
mod worker;

// Re-export adapters
pub use capture::{CpalEngineFactory, CpalMediaDevices};
pub use config::XdgConfigStore;
pub use encoder::OggOpusEncoderFactory;
pub use sink::FileArtifactSink;

use crate::application::VoiceRecorder;

/// Recorder wired to the native host adapters
pub type NativeRecorder = VoiceRecorder<CpalMediaDevices, CpalEngineFactory, OggOpusEncoderFactory>;

/// Create the native recorder, optionally preferring a named input device
pub fn create_recorder(device: Option<String>) -> NativeRecorder {
    VoiceRecorder::new(
        CpalMediaDevices::with_device(device),
        CpalEngineFactory::new(),
        OggOpusEncoderFactory::new(),
    )
}
