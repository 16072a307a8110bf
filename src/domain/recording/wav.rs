//! Lossless WAV encoder for captured voice notes
//!
//! Output layout (44-byte little-endian header followed by samples):
//! - `RIFF` chunk: file size minus 8, `WAVE`
//! - `fmt ` chunk: uncompressed PCM, mono, 16-bit, 16kHz
//! - `data` chunk: raw i16 samples
//!
//! Everything here is pure. Encoding never fails.

use thiserror::Error;

use super::frame::SampleFrame;

/// Declared sample rate of every lossless artifact
pub const SAMPLE_RATE: u32 = 16_000;

/// Number of channels (mono)
pub const CHANNELS: u16 = 1;

/// Bits per sample (16-bit audio)
pub const BITS_PER_SAMPLE: u16 = 16;

/// Size of the canonical WAV header
pub const HEADER_LEN: usize = 44;

/// Format tag for uncompressed PCM
const PCM_FORMAT_TAG: u16 = 1;

/// Length of the `fmt ` chunk body for PCM
const FMT_CHUNK_LEN: u32 = 16;

const BYTES_PER_SAMPLE: u32 = (BITS_PER_SAMPLE / 8) as u32;

/// Convert one normalized float sample to a signed 16-bit sample.
///
/// Input is clamped to [-1, 1]. Negative values scale by 32768 and positive
/// values by 32767, so full-scale positive input never wraps.
pub fn sample_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Convert a block of normalized float samples
pub fn convert_block(block: &[f32]) -> Vec<i16> {
    block.iter().map(|&s| sample_to_i16(s)).collect()
}

/// Build the 44-byte header for `sample_count` mono 16-bit samples.
///
/// Size fields saturate at `u32::MAX` for inputs too long to describe.
pub fn encode_header(sample_count: usize) -> [u8; HEADER_LEN] {
    let data_len = u32::try_from(sample_count)
        .unwrap_or(u32::MAX)
        .saturating_mul(BYTES_PER_SAMPLE);
    let riff_len = data_len.saturating_add(36);
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = SAMPLE_RATE * u32::from(block_align);

    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_len.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&SAMPLE_RATE.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());
    header
}

/// Encode PCM samples to a complete WAV file
///
/// Input: mono i16 samples at 16kHz
/// Output: WAV bytes (header + samples)
pub fn encode_wav(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + samples.len() * 2);
    out.extend_from_slice(&encode_header(samples.len()));
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Encode an ordered sequence of frames as one WAV file.
///
/// Frames are concatenated in slice order.
pub fn encode_frames(frames: &[SampleFrame]) -> Vec<u8> {
    let total: usize = frames.iter().map(SampleFrame::len).sum();
    let mut out = Vec::with_capacity(HEADER_LEN + total * 2);
    out.extend_from_slice(&encode_header(total));
    for frame in frames {
        for sample in frame.samples() {
            out.extend_from_slice(&sample.to_le_bytes());
        }
    }
    out
}

/// Format fields recovered from a WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_len: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_len: u32,
}

impl WavHeader {
    /// Number of samples declared by the data chunk
    pub fn sample_count(&self) -> usize {
        self.data_len as usize / usize::from(self.block_align.max(1))
    }
}

/// Errors when reading back a WAV header
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WavHeaderError {
    #[error("WAV header too short: {0} bytes")]
    TooShort(usize),

    #[error("Missing {0} marker")]
    BadMagic(&'static str),
}

/// Parse the canonical 44-byte header produced by [`encode_header`]
pub fn parse_header(bytes: &[u8]) -> Result<WavHeader, WavHeaderError> {
    if bytes.len() < HEADER_LEN {
        return Err(WavHeaderError::TooShort(bytes.len()));
    }

    for (range, magic) in [(0..4, "RIFF"), (8..12, "WAVE"), (12..16, "fmt "), (36..40, "data")] {
        if &bytes[range] != magic.as_bytes() {
            return Err(WavHeaderError::BadMagic(magic));
        }
    }

    let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
    let u32_at =
        |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

    Ok(WavHeader {
        riff_len: u32_at(4),
        format_tag: u16_at(20),
        channels: u16_at(22),
        sample_rate: u32_at(24),
        byte_rate: u32_at(28),
        block_align: u16_at(32),
        bits_per_sample: u16_at(34),
        data_len: u32_at(40),
    })
}
