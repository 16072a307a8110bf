//! Recording domain module

mod artifact;
mod duration;
mod frame;
mod state;
pub mod wav;

pub use artifact::{EncodedArtifact, PipelineKind, FALLBACK_LOSSY_MEDIA_TYPE, WAV_MEDIA_TYPE};
pub use duration::{Duration, DEFAULT_DURATION_SECS, DEFAULT_MAX_DURATION_SECS};
pub use frame::SampleFrame;
pub use state::{InvalidStateTransition, RecorderLifecycle, RecorderState};
