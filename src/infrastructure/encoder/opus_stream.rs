//! Incremental Ogg Opus stream writer
//!
//! Speech-oriented settings:
//! - 16 kHz mono input
//! - VOIP application, 16 kbps VBR with in-band FEC
//! - 20 ms frames
//!
//! Pages are closed on demand so a caller can emit container bytes at a
//! fixed cadence while recording is still going.

use ogg::writing::{PacketWriteEndInfo, PacketWriter};
use thiserror::Error;

use crate::domain::recording::wav::SAMPLE_RATE;

/// Opus frame size in samples (20ms at 16kHz)
pub const FRAME_SIZE: usize = 320;

/// Target bitrate in bits per second
const TARGET_BITRATE: i32 = 16_000;

/// Ogg Opus granule positions always count 48 kHz samples
const GRANULE_PER_FRAME: u64 = FRAME_SIZE as u64 * (48_000 / SAMPLE_RATE as u64);

/// Largest packet libopus can return
const MAX_PACKET: usize = 4000;

/// Encoding errors
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Opus init failed: {0}")]
    Init(String),

    #[error("Opus encoding failed: {0}")]
    OpusEncode(String),

    #[error("Failed to write OGG packet: {0}")]
    OggWrite(String),
}

/// Ogg Opus stream being written into memory
pub struct OpusOggStream {
    encoder: opus::Encoder,
    pages: PacketWriter<'static, Vec<u8>>,
    serial: u32,
    granule_pos: u64,
    /// Samples waiting for a full frame
    frame: Vec<i16>,
    /// Last encoded packet, held back so its page can be closed on demand
    held: Option<(Vec<u8>, u64)>,
}

impl OpusOggStream {
    /// Create the encoder and write the identification and comment headers
    pub fn new(vendor: &str) -> Result<Self, EncodingError> {
        let mut encoder =
            opus::Encoder::new(SAMPLE_RATE, opus::Channels::Mono, opus::Application::Voip)
                .map_err(|e| EncodingError::Init(e.to_string()))?;
        encoder
            .set_bitrate(opus::Bitrate::Bits(TARGET_BITRATE))
            .and_then(|_| encoder.set_vbr(true))
            .and_then(|_| encoder.set_inband_fec(true))
            .map_err(|e| EncodingError::Init(e.to_string()))?;

        let mut stream = Self {
            encoder,
            pages: PacketWriter::new(Vec::new()),
            serial: rand_serial(),
            granule_pos: 0,
            frame: Vec::with_capacity(FRAME_SIZE),
            held: None,
        };
        stream.write_headers(vendor)?;
        Ok(stream)
    }

    fn write_headers(&mut self, vendor: &str) -> Result<(), EncodingError> {
        let mut id_header = Vec::with_capacity(19);
        id_header.extend_from_slice(b"OpusHead");
        id_header.push(1); // Version
        id_header.push(1); // Channel count
        id_header.extend_from_slice(&0u16.to_le_bytes()); // Pre-skip
        id_header.extend_from_slice(&SAMPLE_RATE.to_le_bytes()); // Input sample rate
        id_header.extend_from_slice(&0i16.to_le_bytes()); // Output gain
        id_header.push(0); // Channel mapping family
        self.write(id_header, PacketWriteEndInfo::EndPage, 0)?;

        let mut comment_header = Vec::new();
        comment_header.extend_from_slice(b"OpusTags");
        comment_header.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        comment_header.extend_from_slice(vendor.as_bytes());
        comment_header.extend_from_slice(&0u32.to_le_bytes()); // No user comments
        self.write(comment_header, PacketWriteEndInfo::EndPage, 0)
    }

    fn write(
        &mut self,
        packet: Vec<u8>,
        end_info: PacketWriteEndInfo,
        granule_pos: u64,
    ) -> Result<(), EncodingError> {
        self.pages
            .write_packet(packet, self.serial, end_info, granule_pos)
            .map_err(|e| EncodingError::OggWrite(e.to_string()))
    }

    /// Encode 16 kHz mono samples; partial frames wait for more input
    pub fn push(&mut self, samples: &[i16]) -> Result<(), EncodingError> {
        for &sample in samples {
            self.frame.push(sample);
            if self.frame.len() == FRAME_SIZE {
                self.encode_frame()?;
            }
        }
        Ok(())
    }

    fn encode_frame(&mut self) -> Result<(), EncodingError> {
        self.frame.resize(FRAME_SIZE, 0);
        let mut packet = vec![0u8; MAX_PACKET];
        let len = self
            .encoder
            .encode(&self.frame, &mut packet)
            .map_err(|e| EncodingError::OpusEncode(e.to_string()))?;
        packet.truncate(len);
        self.frame.clear();

        self.granule_pos += GRANULE_PER_FRAME;
        if let Some((previous, granule_pos)) = self.held.replace((packet, self.granule_pos)) {
            self.write(previous, PacketWriteEndInfo::NormalPacket, granule_pos)?;
        }
        Ok(())
    }

    /// Close the current page and take every completed byte
    pub fn take_bytes(&mut self) -> Result<Vec<u8>, EncodingError> {
        if let Some((packet, granule_pos)) = self.held.take() {
            self.write(packet, PacketWriteEndInfo::EndPage, granule_pos)?;
        }
        Ok(std::mem::take(self.pages.inner_mut()))
    }

    /// Pad and encode the tail, end the logical stream, return the rest
    pub fn finish(mut self) -> Result<Vec<u8>, EncodingError> {
        if !self.frame.is_empty() || self.held.is_none() {
            self.encode_frame()?;
        }
        if let Some((packet, granule_pos)) = self.held.take() {
            self.write(packet, PacketWriteEndInfo::EndStream, granule_pos)?;
        }
        Ok(self.pages.into_inner())
    }
}

/// Generate a pseudo-random serial number for the Ogg stream
fn rand_serial() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (duration.as_secs() as u32) ^ duration.subsec_nanos()
}
