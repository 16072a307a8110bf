//! Artifact sink port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::EncodedArtifact;

/// Sink errors
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("Refusing to deliver an empty artifact")]
    EmptyArtifact,

    #[error("Failed to deliver artifact: {0}")]
    DeliveryFailed(String),
}

/// Port for handing a finished artifact to its consumer
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Deliver the artifact bytes and media type.
    ///
    /// # Returns
    /// A human-readable location of the delivered artifact
    async fn deliver(&self, artifact: &EncodedArtifact) -> Result<String, SinkError>;
}
