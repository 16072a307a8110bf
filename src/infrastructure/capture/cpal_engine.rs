//! Lossless processing graph over a cpal stream
//!
//! The engine is built suspended. Resuming attaches a processing thread to
//! the stream tap, which resamples to 16 kHz and re-blocks the audio into
//! fixed-size blocks on the engine's block channel.

use std::thread::JoinHandle;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::cpal_devices::{CpalStream, StreamTap, TapReceiver};
use super::resample::StreamResampler;
use crate::application::ports::{
    AudioEngine, AudioEngineFactory, AudioStream, BlockReceiver, EngineError, EngineState,
};
use crate::domain::recording::wav::SAMPLE_RATE;
use crate::infrastructure::worker;

const WORKER_NAME: &str = "audio engine";

/// Builds [`CpalEngine`] graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalEngineFactory;

impl CpalEngineFactory {
    pub fn new() -> Self {
        Self
    }
}

impl AudioEngineFactory<CpalStream> for CpalEngineFactory {
    type Engine = CpalEngine;

    fn build_graph(
        &self,
        stream: &CpalStream,
        block_size: usize,
    ) -> Result<(CpalEngine, BlockReceiver), EngineError> {
        if block_size == 0 {
            return Err(EngineError::ProcessorUnsupported);
        }
        if !stream.is_live() {
            return Err(EngineError::Unavailable("input stream is not live".into()));
        }

        let tap = stream.tap();
        debug!(
            source_rate = tap.sample_rate(),
            block_size, "Building lossless processing graph"
        );
        CpalEngine::suspended(tap, block_size)
    }
}

/// A suspended-or-running processing graph on one stream
pub struct CpalEngine {
    state: EngineState,
    tap: StreamTap,
    block_size: usize,
    processor: Option<BlockProcessor>,
    worker: Option<JoinHandle<()>>,
    attached: bool,
}

impl CpalEngine {
    fn suspended(tap: StreamTap, block_size: usize) -> Result<(Self, BlockReceiver), EngineError> {
        let resampler = StreamResampler::new(tap.sample_rate(), SAMPLE_RATE)
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;
        let (block_tx, block_rx) = mpsc::unbounded_channel();

        let engine = Self {
            state: EngineState::Suspended,
            tap,
            block_size,
            processor: Some(BlockProcessor::new(resampler, block_size, block_tx)),
            worker: None,
            attached: false,
        };
        Ok((engine, block_rx))
    }
}

#[async_trait]
impl AudioEngine for CpalEngine {
    fn state(&self) -> EngineState {
        self.state
    }

    async fn resume(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Running => return Ok(()),
            EngineState::Closed => return Err(EngineError::Closed),
            EngineState::Suspended => {}
        }

        let processor = self
            .processor
            .take()
            .ok_or_else(|| EngineError::ResumeFailed("processor was disconnected".into()))?;

        let samples = self.tap.attach();
        self.attached = true;
        let worker = std::thread::Builder::new()
            .name("voice-note-engine".into())
            .spawn(move || processor.run(samples))
            .map_err(|e| EngineError::ResumeFailed(e.to_string()))?;

        self.worker = Some(worker);
        self.state = EngineState::Running;
        debug!(block_size = self.block_size, "Audio engine running");
        Ok(())
    }

    /// Detach from the stream. The worker sees its input close, flushes
    /// the tail and exits on its own.
    fn disconnect(&mut self) {
        if self.attached {
            self.attached = false;
            self.tap.detach();
        }
        self.processor = None;
    }

    /// Disconnect and wait for the worker, so every block is on the channel
    /// once this returns
    async fn close(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Closed {
            return Err(EngineError::Closed);
        }
        self.disconnect();
        self.state = EngineState::Closed;
        if let Some(handle) = self.worker.take() {
            worker::join(handle, WORKER_NAME)
                .await
                .map_err(EngineError::CloseFailed)?;
        }
        debug!("Audio engine closed");
        Ok(())
    }
}

impl Drop for CpalEngine {
    fn drop(&mut self) {
        self.disconnect();
        if let Some(handle) = self.worker.take() {
            worker::reap(handle, WORKER_NAME);
        }
    }
}

/// Resampling and re-blocking stage run on the engine thread
struct BlockProcessor {
    resampler: StreamResampler,
    block_size: usize,
    pending: Vec<f32>,
    out: mpsc::UnboundedSender<Vec<f32>>,
}

impl BlockProcessor {
    fn new(
        resampler: StreamResampler,
        block_size: usize,
        out: mpsc::UnboundedSender<Vec<f32>>,
    ) -> Self {
        Self {
            resampler,
            block_size,
            pending: Vec::with_capacity(block_size),
            out,
        }
    }

    /// Process until the tap closes, then flush the tail as a short block
    fn run(mut self, samples: TapReceiver) {
        for buffer in samples.iter() {
            match self.resampler.push(&buffer) {
                Ok(resampled) => {
                    if !self.emit(resampled) {
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Audio engine stopped processing");
                    return;
                }
            }
        }

        match self.resampler.flush() {
            Ok(tail) => {
                if !self.emit(tail) {
                    return;
                }
            }
            Err(e) => warn!(error = %e, "Failed to flush resampler"),
        }
        if !self.pending.is_empty() {
            let _ = self.out.send(std::mem::take(&mut self.pending));
        }
    }

    /// Queue samples and send every full block; false once nobody listens
    fn emit(&mut self, samples: Vec<f32>) -> bool {
        self.pending.extend(samples);
        while self.pending.len() >= self.block_size {
            let block: Vec<f32> = self.pending.drain(..self.block_size).collect();
            if self.out.send(block).is_err() {
                return false;
            }
        }
        true
    }
}
