//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::recording::Duration;

/// voice-note - capture a voice note from the microphone
#[derive(Parser, Debug)]
#[command(name = "voice-note")]
#[command(version)]
#[command(about = "Record a voice note as lossless WAV, falling back to Ogg Opus")]
#[command(long_about = None)]
pub struct Cli {
    /// Recording duration (e.g., 10s, 1m, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME", conflicts_with = "until_stopped")]
    pub duration: Option<String>,

    /// Record until Ctrl+C instead of for a fixed duration
    #[arg(short = 'u', long)]
    pub until_stopped: bool,

    /// Hard cap on recording length
    #[arg(long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Directory the note is saved into
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Skip the lossless path and record Ogg Opus
    #[arg(long)]
    pub lossy: bool,

    /// Input device name (see `voice-note devices`)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Config file to use instead of the XDG location
    #[arg(long, value_name = "FILE", env = "VOICE_NOTE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List audio input devices
    Devices,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// How long a recording runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLimit {
    /// Stop and save after this long
    Fixed(Duration),
    /// Run until interrupted, saving at the cap
    UntilStopped { cap: Duration },
}

impl RecordLimit {
    /// When the recording ends on its own
    pub fn deadline(&self) -> Duration {
        match *self {
            Self::Fixed(d) => d,
            Self::UntilStopped { cap } => cap,
        }
    }
}

/// Parsed record options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub limit: RecordLimit,
    pub output_dir: PathBuf,
    pub lossless: bool,
    pub device: Option<String>,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "duration",
    "max_duration",
    "output_dir",
    "lossless",
    "device",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
