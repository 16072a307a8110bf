//! Sample frame value object

use super::wav;

/// One processing block of mono 16-bit samples.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFrame {
    samples: Box<[i16]>,
}

impl SampleFrame {
    /// Convert a block of normalized float samples with the WAV conversion rule
    pub fn from_normalized(block: &[f32]) -> Self {
        Self {
            samples: wav::convert_block(block).into_boxed_slice(),
        }
    }

    /// Wrap already-converted PCM samples
    pub fn from_pcm(samples: Vec<i16>) -> Self {
        Self {
            samples: samples.into_boxed_slice(),
        }
    }

    /// Get the samples
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of samples in the frame
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the frame holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
