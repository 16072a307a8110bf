//! Voice recorder use case
//!
//! Owns one recording session at a time: acquires the device, prefers the
//! lossless pipeline and falls back to the lossy one on the same stream,
//! and releases everything on every exit path. Reports only through return
//! values and callbacks.

use crate::domain::error::CaptureError;
use crate::domain::recording::{EncodedArtifact, PipelineKind, RecorderLifecycle, RecorderState};

use super::acquirer::{AcquiredStream, DeviceAcquirer};
use super::pipeline::{ActivePipeline, LosslessPipeline, LossyPipeline};
use super::ports::{AudioEngineFactory, EncoderFactory, EngineError, MediaDevices};

/// Recorder behaviour switches
#[derive(Debug, Clone, Copy)]
pub struct RecorderOptions {
    /// Try the lossless pipeline before falling back to lossy
    pub allow_lossless: bool,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            allow_lossless: true,
        }
    }
}

/// Callbacks fired at session transitions.
///
/// Usage errors (`NotRecording`, `AlreadyRecording`) do not fire `on_error`.
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct RecorderCallbacks {
    /// Called once recording has begun
    pub on_start: Option<Box<dyn Fn(PipelineKind) + Send + Sync>>,
    /// Called with the finished artifact
    pub on_stop: Option<Box<dyn Fn(&EncodedArtifact) + Send + Sync>>,
    /// Called when start or stop fails, or when the lossless engine fails
    /// to close after its frames were collected
    pub on_error: Option<Box<dyn Fn(&CaptureError) + Send + Sync>>,
}

type Pipeline<D, E, N> = ActivePipeline<
    <E as AudioEngineFactory<<D as MediaDevices>::Stream>>::Engine,
    <N as EncoderFactory<<D as MediaDevices>::Stream>>::Encoder,
>;

/// Resources owned by one active session
struct RecordingSession<D, E, N>
where
    D: MediaDevices,
    E: AudioEngineFactory<D::Stream>,
    N: EncoderFactory<D::Stream>,
{
    stream: AcquiredStream<D::Stream>,
    pipeline: Pipeline<D, E, N>,
}

/// Recorder controller
pub struct VoiceRecorder<D, E, N>
where
    D: MediaDevices,
    E: AudioEngineFactory<D::Stream>,
    N: EncoderFactory<D::Stream>,
{
    acquirer: DeviceAcquirer<D>,
    engines: E,
    encoders: N,
    options: RecorderOptions,
    callbacks: RecorderCallbacks,
    lifecycle: RecorderLifecycle,
    session: Option<RecordingSession<D, E, N>>,
}

impl<D, E, N> VoiceRecorder<D, E, N>
where
    D: MediaDevices,
    E: AudioEngineFactory<D::Stream>,
    N: EncoderFactory<D::Stream>,
{
    /// Create a new recorder
    pub fn new(devices: D, engines: E, encoders: N) -> Self {
        Self {
            acquirer: DeviceAcquirer::new(devices),
            engines,
            encoders,
            options: RecorderOptions::default(),
            callbacks: RecorderCallbacks::default(),
            lifecycle: RecorderLifecycle::new(),
            session: None,
        }
    }

    /// Set recorder options
    pub fn with_options(mut self, options: RecorderOptions) -> Self {
        self.options = options;
        self
    }

    /// Set transition callbacks
    pub fn with_callbacks(mut self, callbacks: RecorderCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> RecorderState {
        self.lifecycle.state()
    }

    /// True iff a device stream is currently held
    pub fn is_recording(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.stream.is_held())
    }

    /// Pipeline driving the active session, if any
    pub fn active_pipeline(&self) -> Option<PipelineKind> {
        self.session.as_ref().map(|session| session.pipeline.kind())
    }

    /// Frames (lossless) or chunks (lossy) captured so far
    pub fn captured_units(&mut self) -> usize {
        match self.session.as_mut().map(|session| &mut session.pipeline) {
            Some(ActivePipeline::Lossless(p)) => p.frames_recorded(),
            Some(ActivePipeline::Lossy(p)) => p.chunks_received(),
            None => 0,
        }
    }

    /// Begin recording.
    ///
    /// Returns which pipeline was selected.
    pub async fn start(&mut self) -> Result<PipelineKind, CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        self.recover_interrupted();
        self.lifecycle.begin_start()?;

        match self.open_session().await {
            Ok(session) => {
                let kind = session.pipeline.kind();
                self.session = Some(session);
                self.lifecycle.start_succeeded()?;
                if let Some(cb) = &self.callbacks.on_start {
                    cb(kind);
                }
                Ok(kind)
            }
            Err(e) => {
                self.lifecycle.start_failed()?;
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Stop recording and return the finished artifact.
    ///
    /// The device stream is released whatever the drain outcome.
    pub async fn stop(&mut self) -> Result<EncodedArtifact, CaptureError> {
        self.recover_interrupted();
        let session = self.session.take().ok_or(CaptureError::NotRecording)?;
        self.lifecycle.begin_stop()?;

        let RecordingSession {
            mut stream,
            pipeline,
        } = session;
        let result = match pipeline {
            ActivePipeline::Lossless(p) => {
                let (artifact, closed) = p.stop().await;
                self.report_close(closed);
                Ok(artifact)
            }
            ActivePipeline::Lossy(p) => p.stop().await,
        };
        stream.release();
        self.lifecycle.stop_finished()?;

        match &result {
            Ok(artifact) => {
                if let Some(cb) = &self.callbacks.on_stop {
                    cb(artifact);
                }
            }
            Err(e) => self.report(e),
        }
        result
    }

    /// Stop recording and discard the artifact
    pub async fn cancel(&mut self) -> Result<(), CaptureError> {
        self.recover_interrupted();
        let session = self.session.take().ok_or(CaptureError::NotRecording)?;
        self.lifecycle.begin_stop()?;

        let RecordingSession {
            mut stream,
            pipeline,
        } = session;
        match pipeline {
            ActivePipeline::Lossless(mut p) => {
                let closed = p.teardown().await;
                self.report_close(closed);
            }
            ActivePipeline::Lossy(p) => p.abort(),
        }
        stream.release();
        self.lifecycle.stop_finished()?;
        Ok(())
    }

    /// Reset a lifecycle left mid-transition by a dropped start or stop.
    ///
    /// The dropped future already released the session's resources.
    pub fn recover_interrupted(&mut self) -> bool {
        self.session.is_none() && self.lifecycle.interrupt()
    }

    async fn open_session(&self) -> Result<RecordingSession<D, E, N>, CaptureError> {
        let stream = self.acquirer.acquire().await?;
        // On failure the guard drops here and releases the stream
        let pipeline = self.open_pipeline(stream.stream()).await?;
        Ok(RecordingSession { stream, pipeline })
    }

    /// Lossless first, lossy on the same stream if that is unsupported
    async fn open_pipeline(&self, stream: &D::Stream) -> Result<Pipeline<D, E, N>, CaptureError> {
        let lossless_failure = if self.options.allow_lossless {
            match LosslessPipeline::start(&self.engines, stream).await {
                Ok(p) => return Ok(ActivePipeline::Lossless(p)),
                Err(e) => Some(e),
            }
        } else {
            None
        };

        match LossyPipeline::start(&self.encoders, stream) {
            Ok(p) => Ok(ActivePipeline::Lossy(p)),
            // Capability failures bypass device-error classification
            Err(e) => {
                let message = match lossless_failure {
                    Some(lossless) => format!("{}; {}", lossless, e),
                    None => e.to_string(),
                };
                Err(CaptureError::Unknown(message))
            }
        }
    }

    fn report(&self, error: &CaptureError) {
        if let Some(cb) = &self.callbacks.on_error {
            cb(error);
        }
    }

    /// The session still ends normally when the engine fails to close
    fn report_close(&self, closed: Result<(), EngineError>) {
        if let Err(e) = closed {
            self.report(&CaptureError::Unknown(e.to_string()));
        }
    }
}
