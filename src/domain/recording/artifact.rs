//! Encoded artifact value object

use std::fmt;

/// Media type of every lossless artifact
pub const WAV_MEDIA_TYPE: &str = "audio/wav";

/// Media type used when a lossy encoder does not report one
pub const FALLBACK_LOSSY_MEDIA_TYPE: &str = "audio/webm";

/// Which capture pipeline produced a session's audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Lossless,
    Lossy,
}

impl PipelineKind {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lossless => "lossless",
            Self::Lossy => "lossy",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single output of a completed recording session:
/// encoded bytes plus their declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    data: Vec<u8>,
    media_type: String,
    kind: PipelineKind,
}

impl EncodedArtifact {
    /// Wrap a complete WAV file
    pub fn lossless(data: Vec<u8>) -> Self {
        Self {
            data,
            media_type: WAV_MEDIA_TYPE.to_string(),
            kind: PipelineKind::Lossless,
        }
    }

    /// Wrap bytes assembled from a lossy encoder.
    /// An empty media type is replaced by [`FALLBACK_LOSSY_MEDIA_TYPE`].
    pub fn lossy(data: Vec<u8>, media_type: Option<String>) -> Self {
        let media_type = media_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_LOSSY_MEDIA_TYPE.to_string());
        Self {
            data,
            media_type,
            kind: PipelineKind::Lossy,
        }
    }

    /// Get the encoded bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the encoded bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Get the declared media type
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Get the pipeline that produced this artifact
    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    /// File extension matching the media type
    pub fn extension(&self) -> &'static str {
        let essence = self
            .media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
            "audio/ogg" => "ogg",
            "audio/webm" => "webm",
            "audio/mp4" | "audio/aac" => "m4a",
            "audio/mpeg" => "mp3",
            _ => "bin",
        }
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
