//! Artifact delivery

mod file;

pub use file::FileArtifactSink;
