//! Runners for the record and devices commands

use std::process::ExitCode;
use std::time::Instant;

use tracing::{info, warn};

use crate::application::ports::{ArtifactSink, ConfigStore};
use crate::application::{RecorderCallbacks, RecorderOptions};
use crate::domain::config::AppConfig;
use crate::domain::error::{CaptureError, DurationParseError};
use crate::domain::recording::{Duration, EncodedArtifact, PipelineKind};
use crate::infrastructure::{create_recorder, CpalMediaDevices, FileArtifactSink, NativeRecorder};

use super::args::{Cli, RecordLimit, RecordOptions};
use super::presenter::Presenter;
use super::signals::{Interrupt, InterruptSignal};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// How often the spinner refreshes its progress line
const PROGRESS_INTERVAL: std::time::Duration = std::time::Duration::from_millis(250);

/// Record one voice note and save it into the output directory
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let mut signals = match InterruptSignal::listen() {
        Ok(signals) => signals,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut recorder = create_recorder(options.device.clone())
        .with_options(RecorderOptions {
            allow_lossless: options.lossless,
        })
        .with_callbacks(logging_callbacks());

    let kind = match recorder.start().await {
        Ok(kind) => kind,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let RecordLimit::UntilStopped { .. } = options.limit {
        presenter.info("Press Ctrl+C to stop, twice to discard");
    }
    presenter.start_spinner(&format!("Recording ({})...", kind));

    let limit = options.limit.deadline();
    match wait_for_end(&mut recorder, &mut signals, &presenter, limit).await {
        Interrupt::Stop => {}
        Interrupt::Cancel => {
            if let Err(e) = recorder.cancel().await {
                warn!(error = %e, "Cancel failed");
            }
            presenter.spinner_fail("Recording discarded");
            return ExitCode::from(EXIT_ERROR);
        }
    }

    presenter.update_spinner("Finishing...");
    let stopped = tokio::select! {
        result = recorder.stop() => Some(result),
        Some(Interrupt::Cancel) = signals.recv() => None,
    };

    let artifact = match stopped {
        Some(Ok(artifact)) => artifact,
        Some(Err(e)) => {
            presenter.spinner_fail("Recording failed");
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        None => {
            recorder.recover_interrupted();
            presenter.spinner_fail("Recording discarded");
            return ExitCode::from(EXIT_ERROR);
        }
    };
    presenter.spinner_success("Recording complete");

    let sink = FileArtifactSink::new(&options.output_dir);
    match sink.deliver(&artifact).await {
        Ok(location) => {
            presenter.saved(&location, &artifact);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Tick the progress line until the limit passes or an interrupt arrives
async fn wait_for_end(
    recorder: &mut NativeRecorder,
    signals: &mut InterruptSignal,
    presenter: &Presenter,
    limit: Duration,
) -> Interrupt {
    let started = Instant::now();
    let deadline = tokio::time::sleep(limit.as_std());
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);

    loop {
        tokio::select! {
            _ = &mut deadline => return Interrupt::Stop,
            signal = signals.recv() => return signal.unwrap_or(Interrupt::Stop),
            _ = ticker.tick() => {
                let units = recorder.captured_units();
                if let Some(kind) = recorder.active_pipeline() {
                    let elapsed = started.elapsed().as_millis() as u64;
                    presenter.update_recording_progress(kind, elapsed, limit.as_millis(), units);
                }
            }
        }
    }
}

fn logging_callbacks() -> RecorderCallbacks {
    RecorderCallbacks {
        on_start: Some(Box::new(|kind: PipelineKind| {
            info!(pipeline = %kind, "Recording started");
        })),
        on_stop: Some(Box::new(|artifact: &EncodedArtifact| {
            info!(
                media_type = artifact.media_type(),
                bytes = artifact.size_bytes(),
                "Recording finished"
            );
        })),
        on_error: Some(Box::new(|error: &CaptureError| {
            warn!(code = error.code(), "{}", error);
        })),
    }
}

/// List input devices, marking the host default
pub fn run_devices() -> ExitCode {
    let presenter = Presenter::new();
    match CpalMediaDevices::new().list_inputs() {
        Ok(devices) if devices.is_empty() => {
            presenter.warn("No input devices found");
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(devices) => {
            for device in &devices {
                presenter.device(device);
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&format!("Failed to list input devices: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Config values given on the command line
pub fn cli_overrides(cli: &Cli) -> AppConfig {
    AppConfig {
        duration: cli.duration.clone(),
        max_duration: cli.max_duration.clone(),
        output_dir: cli.output.as_ref().map(|p| p.display().to_string()),
        lossless: if cli.lossy { Some(false) } else { None },
        device: cli.device.clone(),
    }
}

/// Load and merge configuration: defaults < file < CLI
pub async fn load_merged_config<S: ConfigStore>(store: &S, cli_config: AppConfig) -> AppConfig {
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %store.path().display(), error = %e, "Ignoring unreadable config file");
            AppConfig::empty()
        }
    };

    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Resolve the recording limit and destination from merged config
pub fn record_options(
    config: &AppConfig,
    until_stopped: bool,
) -> Result<RecordOptions, DurationParseError> {
    let cap = parse_or(
        config.max_duration.as_deref(),
        Duration::default_max_duration(),
    )?;
    let limit = if until_stopped {
        RecordLimit::UntilStopped { cap }
    } else {
        let duration = parse_or(config.duration.as_deref(), Duration::default_duration())?;
        RecordLimit::Fixed(duration.min(cap))
    };

    Ok(RecordOptions {
        limit,
        output_dir: config.output_dir_or_default(),
        lossless: config.lossless_or_default(),
        device: config.device().map(str::to_string),
    })
}

fn parse_or(value: Option<&str>, fallback: Duration) -> Result<Duration, DurationParseError> {
    value
        .map(str::parse::<Duration>)
        .transpose()
        .map(|parsed| parsed.unwrap_or(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::infrastructure::XdgConfigStore;

    #[test]
    fn fixed_duration_is_capped() {
        let config = AppConfig {
            duration: Some("10m".into()),
            max_duration: Some("1m".into()),
            ..AppConfig::defaults()
        };
        let options = record_options(&config, false).unwrap();
        assert_eq!(options.limit, RecordLimit::Fixed(Duration::from_secs(60)));
    }

    #[test]
    fn until_stopped_uses_cap() {
        let options = record_options(&AppConfig::defaults(), true).unwrap();
        assert_eq!(
            options.limit,
            RecordLimit::UntilStopped {
                cap: Duration::default_max_duration()
            }
        );
        assert!(options.lossless);
    }

    #[test]
    fn invalid_duration_is_an_error() {
        let config = AppConfig {
            duration: Some("soon".into()),
            ..AppConfig::defaults()
        };
        assert!(record_options(&config, false).is_err());
        // ignored when recording until stopped
        assert!(record_options(&config, true).is_ok());
    }

    #[test]
    fn lossy_flag_overrides() {
        let cli = Cli::parse_from(["voice-note", "--lossy", "-o", "/tmp/notes"]);
        let config = AppConfig::defaults().merge(cli_overrides(&cli));
        let options = record_options(&config, false).unwrap();
        assert!(!options.lossless);
        assert_eq!(options.output_dir, PathBuf::from("/tmp/notes"));
    }

    #[tokio::test]
    async fn cli_beats_file_beats_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "duration = \"45s\"\nlossless = false\n").unwrap();
        let store = XdgConfigStore::with_path(&path);

        let cli_config = AppConfig {
            duration: Some("5s".into()),
            ..AppConfig::empty()
        };
        let merged = load_merged_config(&store, cli_config).await;

        assert_eq!(merged.duration, Some("5s".to_string()));
        assert_eq!(merged.lossless, Some(false));
        assert_eq!(merged.max_duration, Some("5m".to_string()));
    }

    #[tokio::test]
    async fn broken_config_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "duration = [").unwrap();
        let store = XdgConfigStore::with_path(&path);

        let merged = load_merged_config(&store, AppConfig::empty()).await;
        assert_eq!(merged, AppConfig::defaults());
    }
}
