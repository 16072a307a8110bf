//! voice-note - capture a voice note from the microphone
//!
//! Records mono 16 kHz audio and encodes it as a lossless 16-bit PCM WAV file.
//! When the host cannot run the lossless pipeline, the same device stream is
//! handed to a native lossy encoder (Ogg Opus) instead.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the WAV encoder, the recorder state machine and errors
//! - **Application**: The recorder use case, device acquirer, capture pipelines and port traits
//! - **Infrastructure**: Adapter implementations (cpal capture, Ogg Opus, XDG config, file sink)
//! - **CLI**: Command-line interface, argument parsing and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
