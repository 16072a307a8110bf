//! Capture host backed by cpal
//!
//! Each acquired stream lives on its own thread because `cpal::Stream` is
//! not `Send`. The data callback down-mixes to mono `f32` and forwards
//! every buffer to a [`StreamTap`], which the lossless engine or the lossy
//! encoder attaches to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex as StdMutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig, SupportedStreamConfigRange};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::application::ports::{
    AudioConstraints, AudioStream, CaptureSupport, MediaDevices, PlatformError, PlatformErrorKind,
};
use crate::domain::recording::wav::SAMPLE_RATE;
use crate::infrastructure::worker;

/// Receiving end of a stream tap
pub type TapReceiver = std_mpsc::Receiver<Vec<f32>>;

type TapSlot = Arc<StdMutex<Option<std_mpsc::Sender<Vec<f32>>>>>;

/// Forwarding slot for a stream's mono samples. One consumer at a time.
#[derive(Clone)]
pub struct StreamTap {
    slot: TapSlot,
    sample_rate: u32,
}

impl StreamTap {
    pub(crate) fn new(sample_rate: u32) -> Self {
        Self {
            slot: Arc::new(StdMutex::new(None)),
            sample_rate,
        }
    }

    /// Rate of the samples coming through the tap
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Start forwarding to a new consumer, replacing any previous one
    pub fn attach(&self) -> TapReceiver {
        let (tx, rx) = std_mpsc::channel();
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(tx);
        }
        rx
    }

    /// Stop forwarding. The consumer sees its channel close.
    pub fn detach(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.take();
        }
    }

    pub(super) fn forward(&self, samples: Vec<f32>) {
        if let Ok(mut slot) = self.slot.lock() {
            let gone = slot.as_ref().is_some_and(|tx| tx.send(samples).is_err());
            if gone {
                *slot = None;
            }
        }
    }
}

/// An input stream playing on a dedicated thread
pub struct CpalStream {
    device_name: String,
    tap: StreamTap,
    live: Arc<AtomicBool>,
    stop_tx: Option<std_mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl CpalStream {
    /// Name of the device the stream reads from
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Handle for attaching a consumer
    pub fn tap(&self) -> StreamTap {
        self.tap.clone()
    }
}

impl AudioStream for CpalStream {
    fn stop_tracks(&mut self) {
        self.tap.detach();
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        // The capture thread drops the cpal stream once it sees the stop
        if let Some(handle) = self.worker.take() {
            worker::reap(handle, "capture");
            debug!(device = %self.device_name, "Capture stopping");
        }
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// An input device as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

/// cpal-backed capture host
#[derive(Debug, Clone, Default)]
pub struct CpalMediaDevices {
    preferred_device: Option<String>,
}

impl CpalMediaDevices {
    /// Use the host's default input device
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer a named input device when the request leaves it open
    pub fn with_device(preferred_device: Option<String>) -> Self {
        Self { preferred_device }
    }

    /// Enumerate input devices on the default host
    pub fn list_inputs(&self) -> Result<Vec<InputDeviceInfo>, PlatformError> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices = host
            .input_devices()
            .map_err(|e| PlatformError::other(e.to_string()))?;

        let mut inputs = Vec::new();
        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };
            let config = device.default_input_config().ok();
            inputs.push(InputDeviceInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                sample_rate: config.as_ref().map(|c| c.sample_rate().0),
                channels: config.as_ref().map(|c| c.channels()),
                name,
            });
        }
        Ok(inputs)
    }
}

#[async_trait]
impl MediaDevices for CpalMediaDevices {
    type Stream = CpalStream;

    fn support(&self) -> CaptureSupport {
        if cpal::available_hosts().is_empty() {
            CaptureSupport::Unsupported
        } else {
            CaptureSupport::Available
        }
    }

    async fn get_user_media(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<CpalStream, PlatformError> {
        let wanted = constraints
            .device_id
            .clone()
            .or_else(|| self.preferred_device.clone());

        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();
        let live = Arc::new(AtomicBool::new(false));
        let thread_live = Arc::clone(&live);

        let worker = std::thread::Builder::new()
            .name("voice-note-capture".into())
            .spawn(move || run_capture(wanted, thread_live, ready_tx, stop_rx))
            .map_err(|e| PlatformError::other(format!("Failed to spawn capture thread: {}", e)))?;

        match ready_rx.await {
            Ok(Ok((device_name, tap))) => Ok(CpalStream {
                device_name,
                tap,
                live,
                stop_tx: Some(stop_tx),
                worker: Some(worker),
            }),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(PlatformError::new(
                    PlatformErrorKind::Abort,
                    "Capture thread exited before the stream started",
                ))
            }
        }
    }
}

type Ready = oneshot::Sender<Result<(String, StreamTap), PlatformError>>;

/// Body of the capture thread: open, play, park until told to stop
fn run_capture(
    wanted: Option<String>,
    live: Arc<AtomicBool>,
    ready: Ready,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let opened = open_stream(wanted.as_deref(), &live).and_then(|(name, tap, stream)| {
        stream.play().map_err(map_play_error)?;
        Ok((name, tap, stream))
    });

    let (name, tap, stream) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            warn!(error = %e, "Failed to open input stream");
            let _ = ready.send(Err(e));
            return;
        }
    };

    live.store(true, Ordering::SeqCst);
    info!(device = %name, sample_rate = tap.sample_rate(), "Capture started");

    if ready.send(Ok((name, tap))).is_err() {
        // Requester went away before taking the stream
        return;
    }

    // Returns on stop or when the stream handle is dropped
    let _ = stop_rx.recv();
    drop(stream);
}

fn open_stream(
    wanted: Option<&str>,
    live: &Arc<AtomicBool>,
) -> Result<(String, StreamTap, cpal::Stream), PlatformError> {
    let host = cpal::default_host();
    let device = select_device(&host, wanted)?;
    let name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let ranges = device
        .supported_input_configs()
        .map_err(map_configs_error)?;
    let (config, format) = choose_config(ranges).ok_or_else(|| {
        PlatformError::new(
            PlatformErrorKind::Overconstrained,
            format!("No usable input configuration on '{}'", name),
        )
    })?;
    debug!(
        device = %name,
        sample_rate = config.sample_rate.0,
        channels = config.channels,
        format = ?format,
        "Selected input configuration"
    );

    let tap = StreamTap::new(config.sample_rate.0);
    let stream = match format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, &tap, live, |s| s),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, &tap, live, |s| {
            s as f32 / 32768.0
        }),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, &tap, live, |s| {
            (s as f32 - 32768.0) / 32768.0
        }),
        other => Err(PlatformError::new(
            PlatformErrorKind::Overconstrained,
            format!("Unsupported sample format {:?}", other),
        )),
    }?;

    Ok((name, tap, stream))
}

fn select_device(host: &cpal::Host, wanted: Option<&str>) -> Result<cpal::Device, PlatformError> {
    let Some(wanted) = wanted else {
        return host.default_input_device().ok_or_else(|| {
            PlatformError::new(PlatformErrorKind::NotFound, "No input device available")
        });
    };

    let devices = host
        .input_devices()
        .map_err(|e| PlatformError::other(e.to_string()))?;
    for device in devices {
        if device.name().is_ok_and(|name| name == wanted) {
            return Ok(device);
        }
    }
    Err(PlatformError::new(
        PlatformErrorKind::NotFound,
        format!("Input device '{}' not found", wanted),
    ))
}

/// Pick a configuration, preferring ranges that cover 16 kHz, then fewer channels
fn choose_config(
    ranges: impl IntoIterator<Item = SupportedStreamConfigRange>,
) -> Option<(StreamConfig, SampleFormat)> {
    let covers_target = |r: &SupportedStreamConfigRange| {
        r.min_sample_rate().0 <= SAMPLE_RATE && r.max_sample_rate().0 >= SAMPLE_RATE
    };

    let best = ranges
        .into_iter()
        .filter(|r| {
            matches!(
                r.sample_format(),
                SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
            )
        })
        .max_by_key(|r| (covers_target(r), std::cmp::Reverse(r.channels())))?;

    let sample_rate = if covers_target(&best) {
        SampleRate(SAMPLE_RATE)
    } else if best.max_sample_rate().0 < SAMPLE_RATE {
        best.max_sample_rate()
    } else {
        best.min_sample_rate()
    };

    let config = StreamConfig {
        channels: best.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };
    Some((config, best.sample_format()))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    tap: &StreamTap,
    live: &Arc<AtomicBool>,
    convert: fn(T) -> f32,
) -> Result<cpal::Stream, PlatformError>
where
    T: cpal::SizedSample + 'static,
{
    let channels = config.channels;
    let tap = tap.clone();
    let live = Arc::clone(live);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                tap.forward(downmix(data, channels, convert));
            },
            move |err| {
                warn!(error = %err, "Audio stream error");
                live.store(false, Ordering::SeqCst);
            },
            None,
        )
        .map_err(map_build_error)
}

/// Average interleaved channels into mono
fn downmix<T: Copy>(data: &[T], channels: u16, convert: fn(T) -> f32) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    data.chunks(channels)
        .map(|frame| frame.iter().map(|&s| convert(s)).sum::<f32>() / frame.len() as f32)
        .collect()
}

fn map_build_error(err: cpal::BuildStreamError) -> PlatformError {
    let kind = match err {
        cpal::BuildStreamError::DeviceNotAvailable => PlatformErrorKind::NotFound,
        cpal::BuildStreamError::StreamConfigNotSupported
        | cpal::BuildStreamError::InvalidArgument => PlatformErrorKind::Overconstrained,
        _ => PlatformErrorKind::Other,
    };
    PlatformError::new(kind, err.to_string())
}

fn map_play_error(err: cpal::PlayStreamError) -> PlatformError {
    let kind = match err {
        cpal::PlayStreamError::DeviceNotAvailable => PlatformErrorKind::NotFound,
        _ => PlatformErrorKind::Other,
    };
    PlatformError::new(kind, err.to_string())
}

fn map_configs_error(err: cpal::SupportedStreamConfigsError) -> PlatformError {
    let kind = match err {
        cpal::SupportedStreamConfigsError::DeviceNotAvailable => PlatformErrorKind::NotFound,
        _ => PlatformErrorKind::Other,
    };
    PlatformError::new(kind, err.to_string())
}
