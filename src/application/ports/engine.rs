//! Live audio engine port used by the lossless pipeline

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::capture::AudioStream;

/// Blocks of normalized mono samples, delivered in capture order
pub type BlockReceiver = mpsc::UnboundedReceiver<Vec<f32>>;

/// Engine run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Suspended,
    Running,
    Closed,
}

/// Audio engine errors.
/// Raised while building or resuming, they mean the lossless path is
/// unavailable on this host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Audio engine unavailable: {0}")]
    Unavailable(String),

    #[error("Fixed-block audio processing is not supported")]
    ProcessorUnsupported,

    #[error("Failed to resume audio engine: {0}")]
    ResumeFailed(String),

    #[error("Audio engine is already closed")]
    Closed,

    #[error("Failed to close audio engine: {0}")]
    CloseFailed(String),
}

/// A processing graph: source bound to a stream, a fixed-block processor,
/// and a sink keeping the graph pulled.
#[async_trait]
pub trait AudioEngine: Send {
    /// Current run state
    fn state(&self) -> EngineState;

    /// Leave the suspended state so the processor receives audio
    async fn resume(&mut self) -> Result<(), EngineError>;

    /// Disconnect processor and source. Calling it again is a no-op.
    fn disconnect(&mut self);

    /// Close the engine. Fails with [`EngineError::Closed`] if already closed.
    async fn close(&mut self) -> Result<(), EngineError>;
}

/// Port for building processing graphs on a host
pub trait AudioEngineFactory<S: AudioStream>: Send + Sync {
    type Engine: AudioEngine + 'static;

    /// Build a graph over `stream` whose processor emits `block_size` samples
    /// per callback. The engine may start suspended.
    ///
    /// # Returns
    /// The engine and the receiving end of its block channel
    fn build_graph(
        &self,
        stream: &S,
        block_size: usize,
    ) -> Result<(Self::Engine, BlockReceiver), EngineError>;
}
