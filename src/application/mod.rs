//! Application layer - Use cases and port interfaces
//!
//! Contains the recorder controller, its capture pipelines, and the
//! trait definitions for host and storage interactions.

pub mod acquirer;
pub mod pipeline;
pub mod ports;
pub mod recorder;

// Re-export use cases
pub use acquirer::{classify, AcquiredStream, DeviceAcquirer};
pub use pipeline::{ActivePipeline, LosslessPipeline, LossyPipeline};
pub use recorder::{RecorderCallbacks, RecorderOptions, VoiceRecorder};
