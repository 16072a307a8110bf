//! Recorder integration tests against in-memory hosts

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use voice_note::application::ports::{
    AudioConstraints, AudioEngine, AudioEngineFactory, AudioStream, BlockReceiver,
    CaptureSupport, EncoderError, EncoderEvent, EncoderEvents, EncoderFactory, EncoderState,
    EngineError, EngineState, MediaDevices, NativeEncoder, PlatformError, PlatformErrorKind,
};
use voice_note::application::{RecorderCallbacks, RecorderOptions, VoiceRecorder};
use voice_note::domain::error::CaptureError;
use voice_note::domain::recording::{EncodedArtifact, PipelineKind, RecorderState};

const OGG: &str = "audio/ogg;codecs=opus";

// --- host fakes ---

#[derive(Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

struct FakeStream {
    counters: Arc<Counters>,
    live: bool,
}

impl AudioStream for FakeStream {
    fn stop_tracks(&mut self) {
        if self.live {
            self.live = false;
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

struct FakeDevices {
    counters: Arc<Counters>,
    failure: Option<PlatformError>,
}

#[async_trait]
impl MediaDevices for FakeDevices {
    type Stream = FakeStream;

    fn support(&self) -> CaptureSupport {
        CaptureSupport::Available
    }

    async fn get_user_media(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<FakeStream, PlatformError> {
        assert!(constraints.is_permissive());
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(FakeStream {
            counters: Arc::clone(&self.counters),
            live: true,
        })
    }
}

type EventLog = Arc<Mutex<Vec<&'static str>>>;

/// How the fake host's audio engine behaves
#[derive(Clone, Copy)]
enum EngineMode {
    Ready,
    Refused,
    Unavailable(&'static str),
    ResumeFails,
    StaysSuspended,
    CloseFails,
}

struct FakeEngine {
    state: EngineState,
    mode: EngineMode,
    log: EventLog,
}

#[async_trait]
impl AudioEngine for FakeEngine {
    fn state(&self) -> EngineState {
        self.state
    }

    async fn resume(&mut self) -> Result<(), EngineError> {
        match self.mode {
            EngineMode::ResumeFails => Err(EngineError::ResumeFailed("autoplay blocked".into())),
            EngineMode::StaysSuspended => Ok(()),
            _ => {
                self.state = EngineState::Running;
                Ok(())
            }
        }
    }

    fn disconnect(&mut self) {
        self.log.lock().unwrap().push("disconnect");
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Closed {
            return Err(EngineError::Closed);
        }
        self.log.lock().unwrap().push("close");
        self.state = EngineState::Closed;
        match self.mode {
            EngineMode::CloseFails => Err(EngineError::CloseFailed("device unplugged".into())),
            _ => Ok(()),
        }
    }
}

/// Delivers a fixed set of blocks, or fails the way `mode` says
struct FakeEngines {
    mode: EngineMode,
    blocks: Vec<Vec<f32>>,
    log: EventLog,
}

impl AudioEngineFactory<FakeStream> for FakeEngines {
    type Engine = FakeEngine;

    fn build_graph(
        &self,
        _stream: &FakeStream,
        block_size: usize,
    ) -> Result<(FakeEngine, BlockReceiver), EngineError> {
        match self.mode {
            EngineMode::Refused => return Err(EngineError::ProcessorUnsupported),
            EngineMode::Unavailable(reason) => {
                return Err(EngineError::Unavailable(reason.to_string()))
            }
            _ => {}
        }
        let (tx, rx) = mpsc::unbounded_channel();
        for block in &self.blocks {
            assert_eq!(block.len(), block_size);
            let _ = tx.send(block.clone());
        }
        Ok((
            FakeEngine {
                state: EngineState::Suspended,
                mode: self.mode,
                log: Arc::clone(&self.log),
            },
            rx,
        ))
    }
}

struct FakeEncoder {
    chunks: Vec<Vec<u8>>,
    state: EncoderState,
    tx: Option<mpsc::UnboundedSender<EncoderEvent>>,
}

impl NativeEncoder for FakeEncoder {
    fn mime_type(&self) -> Option<String> {
        Some(OGG.to_string())
    }

    fn state(&self) -> EncoderState {
        self.state
    }

    fn start(&mut self, _timeslice: StdDuration) -> Result<EncoderEvents, EncoderError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.tx = Some(tx);
        self.state = EncoderState::Recording;
        Ok(rx)
    }

    fn stop(&mut self) -> Result<(), EncoderError> {
        if self.state != EncoderState::Recording {
            return Err(EncoderError::InvalidState);
        }
        self.state = EncoderState::Inactive;
        if let Some(tx) = self.tx.take() {
            for chunk in self.chunks.drain(..) {
                let _ = tx.send(EncoderEvent::Data(chunk));
            }
            let _ = tx.send(EncoderEvent::Stopped);
        }
        Ok(())
    }
}

/// Emits its chunks on stop, or refuses every media type
struct FakeEncoders {
    supported: bool,
    chunks: Vec<Vec<u8>>,
    log: EventLog,
}

impl EncoderFactory<FakeStream> for FakeEncoders {
    type Encoder = FakeEncoder;

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported && mime_type == OGG
    }

    fn create(
        &self,
        _stream: &FakeStream,
        mime_type: Option<&str>,
    ) -> Result<FakeEncoder, EncoderError> {
        self.log.lock().unwrap().push("encoder");
        if !self.supported {
            return Err(EncoderError::Unavailable("no codecs".into()));
        }
        assert_eq!(mime_type, Some(OGG));
        Ok(FakeEncoder {
            chunks: self.chunks.clone(),
            state: EncoderState::Inactive,
            tx: None,
        })
    }
}

type TestRecorder = VoiceRecorder<FakeDevices, FakeEngines, FakeEncoders>;

struct Host {
    counters: Arc<Counters>,
    failure: Option<PlatformError>,
    engine: EngineMode,
    blocks: Vec<Vec<f32>>,
    lossy: bool,
    chunks: Vec<Vec<u8>>,
    log: EventLog,
}

impl Host {
    fn new() -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            failure: None,
            engine: EngineMode::Ready,
            blocks: Vec::new(),
            lossy: true,
            chunks: vec![b"OggS-head".to_vec(), b"OggS-body".to_vec()],
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn recorder(&self) -> TestRecorder {
        VoiceRecorder::new(
            FakeDevices {
                counters: Arc::clone(&self.counters),
                failure: self.failure.clone(),
            },
            FakeEngines {
                mode: self.engine,
                blocks: self.blocks.clone(),
                log: Arc::clone(&self.log),
            },
            FakeEncoders {
                supported: self.lossy,
                chunks: self.chunks.clone(),
                log: Arc::clone(&self.log),
            },
        )
    }

    fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    fn events(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

fn collect_errors() -> (Arc<Mutex<Vec<CaptureError>>>, RecorderCallbacks) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&errors);
    let callbacks = RecorderCallbacks {
        on_error: Some(Box::new(move |e: &CaptureError| {
            seen.lock().unwrap().push(e.clone());
        })),
        ..Default::default()
    };
    (errors, callbacks)
}

// --- lossless path ---

#[tokio::test]
async fn three_frames_make_a_playable_wav() {
    let mut host = Host::new();
    host.blocks = vec![vec![1.0; 4096], vec![0.0; 4096], vec![-1.0; 4096]];
    let mut recorder = host.recorder();

    assert_eq!(recorder.start().await.unwrap(), PipelineKind::Lossless);
    assert!(recorder.is_recording());
    assert_eq!(recorder.state(), RecorderState::Recording);

    let artifact = recorder.stop().await.unwrap();
    assert_eq!(artifact.media_type(), "audio/wav");
    assert_eq!(artifact.size_bytes(), 24_620);
    assert_eq!(&artifact.data()[4..8], &(36u32 + 2 * 12_288).to_le_bytes());

    let mut reader = hound::WavReader::new(Cursor::new(artifact.into_data())).unwrap();
    let format = reader.spec();
    assert_eq!(format.channels, 1);
    assert_eq!(format.sample_rate, 16_000);
    assert_eq!(format.bits_per_sample, 16);

    let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples.len(), 12_288);
    assert_eq!(samples[0], 32_767);
    assert_eq!(samples[4096], 0);
    assert_eq!(samples[12_287], -32_768);

    assert!(!recorder.is_recording());
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(host.released(), 1);
}

#[tokio::test]
async fn stop_without_frames_yields_header_only() {
    let host = Host::new();
    let mut recorder = host.recorder();

    recorder.start().await.unwrap();
    let artifact = recorder.stop().await.unwrap();
    assert_eq!(artifact.size_bytes(), 44);
}

// --- fallback ---

#[tokio::test]
async fn unsupported_lossless_falls_back_on_same_stream() {
    let mut host = Host::new();
    host.engine = EngineMode::Refused;
    let mut recorder = host.recorder();

    assert_eq!(recorder.start().await.unwrap(), PipelineKind::Lossy);
    assert_eq!(recorder.active_pipeline(), Some(PipelineKind::Lossy));
    assert_eq!(host.acquired(), 1);
    assert_eq!(host.released(), 0);

    let artifact = recorder.stop().await.unwrap();
    assert_eq!(artifact.media_type(), OGG);
    assert_eq!(artifact.data(), b"OggS-headOggS-body");
    assert_eq!(host.released(), 1);
}

#[tokio::test]
async fn lossless_can_be_switched_off() {
    let host = Host::new();
    let mut recorder = host.recorder().with_options(RecorderOptions {
        allow_lossless: false,
    });

    assert_eq!(recorder.start().await.unwrap(), PipelineKind::Lossy);
}

#[tokio::test]
async fn both_pipelines_failing_releases_the_stream() {
    let mut host = Host::new();
    host.engine = EngineMode::Refused;
    host.lossy = false;
    let mut recorder = host.recorder();

    let err = recorder.start().await.unwrap_err();
    assert!(matches!(err, CaptureError::Unknown(_)));
    assert!(!recorder.is_recording());
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(host.acquired(), 1);
    assert_eq!(host.released(), 1);
}

#[tokio::test]
async fn capability_wording_is_not_read_as_a_device_error() {
    let mut host = Host::new();
    host.engine = EngineMode::Unavailable("AudioContext is not available");
    host.lossy = false;
    let mut recorder = host.recorder();

    let err = recorder.start().await.unwrap_err();
    assert_ne!(err, CaptureError::DeviceNotFound);
    match err {
        CaptureError::Unknown(message) => {
            assert!(message.contains("AudioContext is not available"), "{}", message);
            assert!(message.contains("no codecs"), "{}", message);
        }
        other => panic!("expected Unknown, got {:?}", other),
    }
    assert_eq!(host.released(), 1);
}

#[tokio::test]
async fn resume_failure_falls_back_after_teardown() {
    let mut host = Host::new();
    host.engine = EngineMode::ResumeFails;
    let mut recorder = host.recorder();

    assert_eq!(recorder.start().await.unwrap(), PipelineKind::Lossy);
    assert_eq!(host.acquired(), 1);
    assert_eq!(host.released(), 0);
    assert_eq!(host.events(), vec!["disconnect", "close", "encoder"]);

    let artifact = recorder.stop().await.unwrap();
    assert_eq!(artifact.media_type(), OGG);
}

#[tokio::test]
async fn engine_stuck_suspended_falls_back_after_teardown() {
    let mut host = Host::new();
    host.engine = EngineMode::StaysSuspended;
    let mut recorder = host.recorder();

    assert_eq!(recorder.start().await.unwrap(), PipelineKind::Lossy);
    assert_eq!(host.acquired(), 1);
    assert_eq!(host.events(), vec!["disconnect", "close", "encoder"]);
}

#[tokio::test]
async fn engine_close_failure_still_delivers_the_note() {
    let mut host = Host::new();
    host.engine = EngineMode::CloseFails;
    host.blocks = vec![vec![0.5; 4096]];
    let (errors, callbacks) = collect_errors();
    let mut recorder = host.recorder().with_callbacks(callbacks);

    assert_eq!(recorder.start().await.unwrap(), PipelineKind::Lossless);
    let artifact = recorder.stop().await.unwrap();
    assert_eq!(artifact.size_bytes(), 44 + 2 * 4096);
    assert_eq!(host.released(), 1);
    assert_eq!(recorder.state(), RecorderState::Idle);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("device unplugged"));
}

#[tokio::test]
async fn engine_close_failure_on_cancel_is_reported() {
    let mut host = Host::new();
    host.engine = EngineMode::CloseFails;
    let (errors, callbacks) = collect_errors();
    let mut recorder = host.recorder().with_callbacks(callbacks);

    recorder.start().await.unwrap();
    recorder.cancel().await.unwrap();
    assert_eq!(host.released(), 1);
    assert_eq!(errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn lossy_session_without_data_is_a_fault() {
    let mut host = Host::new();
    host.engine = EngineMode::Refused;
    host.chunks = Vec::new();
    let mut recorder = host.recorder();

    recorder.start().await.unwrap();
    let err = recorder.stop().await.unwrap_err();
    assert!(matches!(err, CaptureError::EncoderFault(_)));
    assert!(!recorder.is_recording());
    assert_eq!(host.released(), 1);
}

// --- acquisition failures ---

#[tokio::test]
async fn permission_denied_leaves_recorder_idle() {
    let mut host = Host::new();
    host.failure = Some(PlatformError::new(
        PlatformErrorKind::NotAllowed,
        "user said no",
    ));
    let (errors, callbacks) = collect_errors();
    let mut recorder = host.recorder().with_callbacks(callbacks);

    let err = recorder.start().await.unwrap_err();
    assert_eq!(err, CaptureError::PermissionDenied);
    assert!(!recorder.is_recording());
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(*errors.lock().unwrap(), vec![CaptureError::PermissionDenied]);
}

#[tokio::test]
async fn busy_device_is_classified() {
    let mut host = Host::new();
    host.failure = Some(PlatformError::other("Device or resource busy"));
    let mut recorder = host.recorder();

    assert_eq!(recorder.start().await.unwrap_err(), CaptureError::DeviceBusy);
}

// --- lifecycle ---

#[tokio::test]
async fn stop_and_cancel_from_idle_are_rejected() {
    let host = Host::new();
    let mut recorder = host.recorder();

    assert_eq!(recorder.stop().await.unwrap_err(), CaptureError::NotRecording);
    assert_eq!(recorder.cancel().await.unwrap_err(), CaptureError::NotRecording);
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(host.acquired(), 0);
}

#[tokio::test]
async fn second_start_keeps_the_live_session() {
    let mut host = Host::new();
    host.blocks = vec![vec![0.25; 4096]];
    let mut recorder = host.recorder();

    recorder.start().await.unwrap();
    assert_eq!(
        recorder.start().await.unwrap_err(),
        CaptureError::AlreadyRecording
    );
    assert!(recorder.is_recording());
    assert_eq!(host.acquired(), 1);

    let artifact = recorder.stop().await.unwrap();
    assert_eq!(artifact.size_bytes(), 44 + 2 * 4096);
}

#[tokio::test]
async fn cancel_releases_and_discards() {
    let host = Host::new();
    let stops = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&stops);
    let mut recorder = host.recorder().with_callbacks(RecorderCallbacks {
        on_stop: Some(Box::new(move |_: &EncodedArtifact| {
            counted.fetch_add(1, Ordering::SeqCst);
        })),
        ..Default::default()
    });

    recorder.start().await.unwrap();
    recorder.cancel().await.unwrap();

    assert!(!recorder.is_recording());
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(host.released(), 1);
    assert_eq!(stops.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn recorder_can_run_again_after_stop() {
    let host = Host::new();
    let mut recorder = host.recorder();

    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();
    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();

    assert_eq!(host.acquired(), 2);
    assert_eq!(host.released(), 2);
}

#[tokio::test]
async fn dropping_an_active_recorder_releases_once() {
    let host = Host::new();
    let mut recorder = host.recorder();

    recorder.start().await.unwrap();
    drop(recorder);
    assert_eq!(host.released(), 1);
}

#[tokio::test]
async fn start_and_stop_callbacks_fire() {
    let mut host = Host::new();
    host.engine = EngineMode::Refused;
    let events = Arc::new(Mutex::new(Vec::new()));
    let on_start = Arc::clone(&events);
    let on_stop = Arc::clone(&events);
    let mut recorder = host.recorder().with_callbacks(RecorderCallbacks {
        on_start: Some(Box::new(move |kind: PipelineKind| {
            on_start.lock().unwrap().push(format!("start:{}", kind));
        })),
        on_stop: Some(Box::new(move |artifact: &EncodedArtifact| {
            on_stop
                .lock()
                .unwrap()
                .push(format!("stop:{}", artifact.size_bytes()));
        })),
        on_error: None,
    });

    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["start:lossy".to_string(), "stop:18".to_string()]
    );
}
