//! Native lossy encoder producing Ogg Opus
//!
//! The encoder attaches to the stream tap on start. A worker thread
//! resamples to 16 kHz, encodes 20 ms Opus frames and emits the completed
//! Ogg pages once per timeslice. Stopping detaches the tap; the worker then
//! flushes the tail, ends the logical stream and acknowledges.

use std::sync::mpsc::RecvTimeoutError;
use std::thread::JoinHandle;
use std::time::{Duration as StdDuration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::opus_stream::{EncodingError, OpusOggStream};
use crate::application::ports::{
    EncoderError, EncoderEvent, EncoderEvents, EncoderFactory, EncoderState, NativeEncoder,
};
use crate::domain::recording::wav::{self, SAMPLE_RATE};
use crate::infrastructure::capture::{CpalStream, StreamResampler, StreamTap, TapReceiver};
use crate::infrastructure::worker;

/// Media type written by this encoder
pub const OGG_OPUS_MEDIA_TYPE: &str = "audio/ogg;codecs=opus";

const OGG_MEDIA_TYPE: &str = "audio/ogg";

/// Vendor string in the OpusTags header
const VENDOR: &str = concat!("voice-note ", env!("CARGO_PKG_VERSION"));

/// Lower-case and drop whitespace so `audio/ogg; codecs=opus` matches
fn normalize(mime_type: &str) -> String {
    mime_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Creates [`OggOpusEncoder`]s over cpal streams
#[derive(Debug, Clone, Copy, Default)]
pub struct OggOpusEncoderFactory;

impl OggOpusEncoderFactory {
    pub fn new() -> Self {
        Self
    }
}

impl EncoderFactory<CpalStream> for OggOpusEncoderFactory {
    type Encoder = OggOpusEncoder;

    fn is_type_supported(&self, mime_type: &str) -> bool {
        let normalized = normalize(mime_type);
        normalized == OGG_OPUS_MEDIA_TYPE || normalized == OGG_MEDIA_TYPE
    }

    fn create(
        &self,
        stream: &CpalStream,
        mime_type: Option<&str>,
    ) -> Result<OggOpusEncoder, EncoderError> {
        let mime_type = match mime_type {
            None => OGG_OPUS_MEDIA_TYPE.to_string(),
            Some(requested) if self.is_type_supported(requested) => normalize(requested),
            Some(requested) => {
                return Err(EncoderError::Unavailable(format!(
                    "unsupported media type '{}'",
                    requested
                )))
            }
        };

        Ok(OggOpusEncoder {
            tap: stream.tap(),
            mime_type,
            state: EncoderState::Inactive,
            worker: None,
        })
    }
}

/// An Ogg Opus encoder bound to one stream
pub struct OggOpusEncoder {
    tap: StreamTap,
    mime_type: String,
    state: EncoderState,
    worker: Option<JoinHandle<()>>,
}

impl NativeEncoder for OggOpusEncoder {
    fn mime_type(&self) -> Option<String> {
        Some(self.mime_type.clone())
    }

    fn state(&self) -> EncoderState {
        self.state
    }

    fn start(&mut self, timeslice: StdDuration) -> Result<EncoderEvents, EncoderError> {
        if self.state == EncoderState::Recording || self.worker.is_some() {
            return Err(EncoderError::InvalidState);
        }

        let resampler = StreamResampler::new(self.tap.sample_rate(), SAMPLE_RATE)
            .map_err(|e| EncoderError::Unavailable(e.to_string()))?;
        let stream =
            OpusOggStream::new(VENDOR).map_err(|e| EncoderError::Unavailable(e.to_string()))?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = EncodeSession {
            resampler,
            stream,
            events: events_tx,
            timeslice,
        };

        let samples = self.tap.attach();
        let worker = std::thread::Builder::new()
            .name("voice-note-encoder".into())
            .spawn(move || session.run(samples))
            .map_err(|e| {
                self.tap.detach();
                EncoderError::Failed(e.to_string())
            })?;

        self.worker = Some(worker);
        self.state = EncoderState::Recording;
        debug!(mime_type = %self.mime_type, ?timeslice, "Encoder started");
        Ok(events_rx)
    }

    fn stop(&mut self) -> Result<(), EncoderError> {
        if self.state != EncoderState::Recording {
            return Err(EncoderError::InvalidState);
        }
        self.state = EncoderState::Inactive;
        // The worker sees its input close and finalizes
        self.tap.detach();
        debug!("Encoder finalizing");
        Ok(())
    }
}

impl Drop for OggOpusEncoder {
    fn drop(&mut self) {
        if self.state == EncoderState::Recording {
            self.tap.detach();
        }
        if let Some(handle) = self.worker.take() {
            worker::reap(handle, "encoder");
        }
    }
}

/// State owned by the encoder thread
struct EncodeSession {
    resampler: StreamResampler,
    stream: OpusOggStream,
    events: mpsc::UnboundedSender<EncoderEvent>,
    timeslice: StdDuration,
}

impl EncodeSession {
    fn run(mut self, samples: TapReceiver) {
        let events = self.events.clone();
        let outcome = self
            .encode_until_closed(&samples)
            .and_then(|()| self.finish());

        match outcome {
            Ok(tail) => {
                let _ = events.send(EncoderEvent::Data(tail));
            }
            Err(e) => {
                warn!(error = %e, "Encoder failed");
                let _ = events.send(EncoderEvent::Error(e.to_string()));
            }
        }
        let _ = events.send(EncoderEvent::Stopped);
    }

    /// Encode input and emit a chunk per timeslice until the tap closes
    fn encode_until_closed(&mut self, samples: &TapReceiver) -> Result<(), EncodingError> {
        let mut deadline = Instant::now() + self.timeslice;

        loop {
            let wait = deadline.saturating_duration_since(Instant::now());
            match samples.recv_timeout(wait) {
                Ok(buffer) => self.encode(&buffer)?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }

            if Instant::now() >= deadline {
                let chunk = self.stream.take_bytes()?;
                if self.events.send(EncoderEvent::Data(chunk)).is_err() {
                    // Nobody is listening anymore
                    return Ok(());
                }
                deadline += self.timeslice;
            }
        }
    }

    fn encode(&mut self, buffer: &[f32]) -> Result<(), EncodingError> {
        let resampled = self
            .resampler
            .push(buffer)
            .map_err(|e| EncodingError::OpusEncode(e.to_string()))?;
        self.stream.push(&wav::convert_block(&resampled))
    }

    fn finish(mut self) -> Result<Vec<u8>, EncodingError> {
        let tail = self
            .resampler
            .flush()
            .map_err(|e| EncodingError::OpusEncode(e.to_string()))?;
        self.stream.push(&wav::convert_block(&tail))?;
        self.stream.finish()
    }
}
