//! Lossy capture pipeline
//!
//! Fallback path driving a host encoder. Container/codec is picked from a
//! preference list, chunks are collected in emission order, and stop waits
//! for the encoder's finalize acknowledgement.

use std::time::Duration as StdDuration;

use crate::domain::error::CaptureError;
use crate::domain::recording::EncodedArtifact;

use crate::application::ports::{
    AudioStream, EncoderError, EncoderEvent, EncoderEvents, EncoderFactory, NativeEncoder,
};

/// Container/codec identifiers, most preferred first
pub const PREFERRED_MEDIA_TYPES: [&str; 4] = [
    "audio/webm;codecs=opus",
    "audio/webm",
    "audio/ogg;codecs=opus",
    "audio/mp4",
];

/// Interval between emitted chunks
pub const CHUNK_INTERVAL: StdDuration = StdDuration::from_millis(100);

/// First preferred media type the host supports, if any
pub fn negotiate_media_type<S, F>(factory: &F) -> Option<&'static str>
where
    S: AudioStream,
    F: EncoderFactory<S>,
{
    PREFERRED_MEDIA_TYPES
        .into_iter()
        .find(|t| factory.is_type_supported(t))
}

/// A running lossy capture
pub struct LossyPipeline<N: NativeEncoder> {
    encoder: N,
    events: EncoderEvents,
    chunks: Vec<Vec<u8>>,
    fault: Option<String>,
}

impl<N: NativeEncoder> LossyPipeline<N> {
    /// Create an encoder over `stream` and start chunked encoding.
    /// With no supported preference the host default is used.
    pub fn start<S, F>(factory: &F, stream: &S) -> Result<Self, EncoderError>
    where
        S: AudioStream,
        F: EncoderFactory<S, Encoder = N>,
    {
        let mime_type = negotiate_media_type(factory);
        let mut encoder = factory.create(stream, mime_type)?;
        let events = encoder.start(CHUNK_INTERVAL)?;

        Ok(Self {
            encoder,
            events,
            chunks: Vec::new(),
            fault: None,
        })
    }

    /// Handle one event; returns true once the encoder has acknowledged stop
    fn apply(&mut self, event: EncoderEvent) -> bool {
        match event {
            EncoderEvent::Data(chunk) => {
                if !chunk.is_empty() {
                    self.chunks.push(chunk);
                }
                false
            }
            EncoderEvent::Error(message) => {
                self.fault.get_or_insert(message);
                false
            }
            EncoderEvent::Stopped => true,
        }
    }

    /// Collect chunks emitted so far without blocking
    pub fn chunks_received(&mut self) -> usize {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
        self.chunks.len()
    }

    /// Finalize the encoder and assemble the artifact.
    ///
    /// Fails with `EncoderFault` if the encoder was not recording, reported an
    /// error, closed without acknowledging, or produced no data at all.
    pub async fn stop(mut self) -> Result<EncodedArtifact, CaptureError> {
        self.encoder
            .stop()
            .map_err(|e| CaptureError::EncoderFault(e.to_string()))?;

        let mut acknowledged = false;
        while let Some(event) = self.events.recv().await {
            if self.apply(event) {
                acknowledged = true;
                break;
            }
        }

        if let Some(message) = self.fault.take() {
            return Err(CaptureError::EncoderFault(message));
        }
        if !acknowledged {
            return Err(CaptureError::EncoderFault(
                "encoder closed before finalizing".to_string(),
            ));
        }
        if self.chunks.is_empty() {
            return Err(CaptureError::EncoderFault(
                "encoder produced no audio data".to_string(),
            ));
        }

        Ok(EncodedArtifact::lossy(
            self.chunks.concat(),
            self.encoder.mime_type(),
        ))
    }

    /// Stop the encoder and discard everything
    pub fn abort(mut self) {
        let _ = self.encoder.stop();
        self.events.close();
    }
}
