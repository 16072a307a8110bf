//! Incremental mono resampler on top of rubato

use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

/// Input frames per resampler chunk
const CHUNK_SIZE: usize = 1024;

/// Resampling errors
#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("Resampler init failed: {0}")]
    Init(String),

    #[error("Resampling failed: {0}")]
    Process(String),
}

/// Converts a live mono stream from the device rate to a target rate.
///
/// Input may arrive in pieces of any size; output is produced whenever a
/// full resampler chunk is buffered. Equal rates pass samples through.
pub struct StreamResampler {
    inner: Option<FftFixedIn<f32>>,
    pending: Vec<f32>,
    ratio: f64,
    consumed: u64,
    produced: u64,
}

impl StreamResampler {
    pub fn new(from_rate: u32, to_rate: u32) -> Result<Self, ResampleError> {
        let inner = if from_rate == to_rate {
            None
        } else {
            let resampler = FftFixedIn::<f32>::new(
                from_rate as usize,
                to_rate as usize,
                CHUNK_SIZE,
                2, // Sub-chunks
                1, // Mono
            )
            .map_err(|e| ResampleError::Init(e.to_string()))?;
            Some(resampler)
        };

        Ok(Self {
            inner,
            pending: Vec::new(),
            ratio: to_rate as f64 / from_rate as f64,
            consumed: 0,
            produced: 0,
        })
    }

    /// Feed samples, returning whatever output is ready
    pub fn push(&mut self, samples: &[f32]) -> Result<Vec<f32>, ResampleError> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(samples.to_vec());
        };

        self.pending.extend_from_slice(samples);
        let mut output = Vec::new();

        loop {
            let needed = resampler.input_frames_next();
            if self.pending.len() < needed {
                break;
            }
            let chunk: Vec<Vec<f32>> = vec![self.pending.drain(..needed).collect()];
            let resampled = resampler
                .process(&chunk, None)
                .map_err(|e| ResampleError::Process(e.to_string()))?;
            self.consumed += needed as u64;
            output.extend_from_slice(&resampled[0]);
        }

        self.produced += output.len() as u64;
        Ok(output)
    }

    /// Drain the buffered tail, zero-padded, trimmed to the expected length
    pub fn flush(&mut self) -> Result<Vec<f32>, ResampleError> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(Vec::new());
        };
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let tail = vec![std::mem::take(&mut self.pending)];
        self.consumed += tail[0].len() as u64;
        let resampled = resampler
            .process_partial(Some(tail.as_slice()), None)
            .map_err(|e| ResampleError::Process(e.to_string()))?;

        let expected = (self.consumed as f64 * self.ratio).ceil() as u64;
        let room = expected.saturating_sub(self.produced) as usize;
        let mut output = resampled.into_iter().next().unwrap_or_default();
        output.truncate(room);

        self.produced += output.len() as u64;
        Ok(output)
    }
}
