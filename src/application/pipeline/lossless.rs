//! Lossless capture pipeline
//!
//! Pulls fixed-size blocks from a live engine graph, converts each block to
//! 16-bit samples as it arrives, and encodes the accumulated frames as WAV.

use crate::domain::recording::{wav, EncodedArtifact, SampleFrame};

use crate::application::ports::{
    AudioEngine, AudioEngineFactory, AudioStream, BlockReceiver, EngineError, EngineState,
};

/// Samples per processing callback
pub const BLOCK_SIZE: usize = 4096;

/// A running lossless capture
pub struct LosslessPipeline<G: AudioEngine> {
    engine: G,
    blocks: BlockReceiver,
    frames: Vec<SampleFrame>,
    torn_down: bool,
}

impl<G: AudioEngine> LosslessPipeline<G> {
    /// Build and start the processing graph over `stream`.
    ///
    /// Any error here means the host cannot do lossless capture; partial
    /// graph state is torn down before returning.
    pub async fn start<S, F>(factory: &F, stream: &S) -> Result<Self, EngineError>
    where
        S: AudioStream,
        F: AudioEngineFactory<S, Engine = G>,
    {
        let (engine, blocks) = factory.build_graph(stream, BLOCK_SIZE)?;
        let mut pipeline = Self {
            engine,
            blocks,
            frames: Vec::new(),
            torn_down: false,
        };

        if pipeline.engine.state() == EngineState::Suspended {
            if let Err(e) = pipeline.engine.resume().await {
                return Err(pipeline.abandon(e).await);
            }
        }

        // A graph that never runs records nothing, so it counts as unsupported
        if pipeline.engine.state() != EngineState::Running {
            let stalled =
                EngineError::ResumeFailed("engine did not reach the running state".to_string());
            return Err(pipeline.abandon(stalled).await);
        }

        Ok(pipeline)
    }

    /// Move every delivered block into the frame sequence, in delivery order
    fn collect_blocks(&mut self) {
        while let Ok(block) = self.blocks.try_recv() {
            self.frames.push(SampleFrame::from_normalized(&block));
        }
    }

    /// Number of frames captured so far
    pub fn frames_recorded(&mut self) -> usize {
        self.collect_blocks();
        self.frames.len()
    }

    /// Tear the graph down after a failed start, keeping the original cause
    async fn abandon(mut self, cause: EngineError) -> EngineError {
        match self.teardown().await {
            Ok(()) => cause,
            Err(close) => EngineError::Unavailable(format!("{}; {}", cause, close)),
        }
    }

    /// Disconnect processor and source, then close the engine.
    /// Safe to call more than once; only the first call can fail.
    pub async fn teardown(&mut self) -> Result<(), EngineError> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        self.engine.disconnect();
        if self.engine.state() == EngineState::Closed {
            return Ok(());
        }
        self.engine.close().await
    }

    /// Stop capture and encode everything received.
    /// Zero frames yields a header-only WAV.
    ///
    /// The artifact is complete even if closing the engine fails, so the
    /// close outcome is returned beside it.
    pub async fn stop(mut self) -> (EncodedArtifact, Result<(), EngineError>) {
        let closed = self.teardown().await;
        self.collect_blocks();
        (EncodedArtifact::lossless(wav::encode_frames(&self.frames)), closed)
    }
}
