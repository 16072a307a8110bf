//! Capture pipelines
//!
//! A session runs exactly one of these, chosen once at start.

mod lossless;
mod lossy;

pub use lossless::{LosslessPipeline, BLOCK_SIZE};
pub use lossy::{negotiate_media_type, LossyPipeline, CHUNK_INTERVAL, PREFERRED_MEDIA_TYPES};

use crate::domain::recording::PipelineKind;

use super::ports::{AudioEngine, NativeEncoder};

/// The pipeline driving the current session
pub enum ActivePipeline<G: AudioEngine, N: NativeEncoder> {
    Lossless(LosslessPipeline<G>),
    Lossy(LossyPipeline<N>),
}

impl<G: AudioEngine, N: NativeEncoder> ActivePipeline<G, N> {
    /// Which path this session took
    pub fn kind(&self) -> PipelineKind {
        match self {
            Self::Lossless(_) => PipelineKind::Lossless,
            Self::Lossy(_) => PipelineKind::Lossy,
        }
    }
}
