//! Artifact sink that saves notes into a directory

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tokio::fs;
use tracing::info;

use crate::application::ports::{ArtifactSink, SinkError};
use crate::domain::recording::EncodedArtifact;

const FILE_PREFIX: &str = "voice-note";

/// Writes each artifact to `<dir>/voice-note-<timestamp>.<ext>`
pub struct FileArtifactSink {
    dir: PathBuf,
}

impl FileArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free path for this artifact; a numeric suffix avoids clobbering
    fn target_path(&self, stem: &str, extension: &str) -> PathBuf {
        let mut path = self.dir.join(format!("{}.{}", stem, extension));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{}-{}.{}", stem, n, extension));
            n += 1;
        }
        path
    }
}

#[async_trait]
impl ArtifactSink for FileArtifactSink {
    async fn deliver(&self, artifact: &EncodedArtifact) -> Result<String, SinkError> {
        if artifact.size_bytes() == 0 {
            return Err(SinkError::EmptyArtifact);
        }

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SinkError::DeliveryFailed(format!("{}: {}", self.dir.display(), e)))?;

        let stem = format!("{}-{}", FILE_PREFIX, Local::now().format("%Y%m%d-%H%M%S"));
        let path = self.target_path(&stem, artifact.extension());

        fs::write(&path, artifact.data())
            .await
            .map_err(|e| SinkError::DeliveryFailed(format!("{}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            media_type = artifact.media_type(),
            bytes = artifact.size_bytes(),
            "Voice note saved"
        );
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::domain::recording::wav;

    #[tokio::test]
    async fn writes_wav_with_extension() {
        let dir = TempDir::new().unwrap();
        let sink = FileArtifactSink::new(dir.path().join("notes"));
        let artifact = EncodedArtifact::lossless(wav::encode_wav(&[0, 1, 2]));

        let location = sink.deliver(&artifact).await.unwrap();
        assert!(location.ends_with(".wav"));
        assert!(location.contains("voice-note-"));
        assert_eq!(std::fs::read(&location).unwrap(), artifact.data());
    }

    #[tokio::test]
    async fn same_second_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let sink = FileArtifactSink::new(dir.path());
        let artifact = EncodedArtifact::lossy(vec![1, 2, 3], Some("audio/ogg".into()));

        let first = sink.deliver(&artifact).await.unwrap();
        let second = sink.deliver(&artifact).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn empty_artifact_is_refused() {
        let dir = TempDir::new().unwrap();
        let sink = FileArtifactSink::new(dir.path());
        let artifact = EncodedArtifact::lossy(Vec::new(), None);

        let err = sink.deliver(&artifact).await.unwrap_err();
        assert!(matches!(err, SinkError::EmptyArtifact));
    }
}
