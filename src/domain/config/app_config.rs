//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::recording::Duration;

/// Default directory name for saved voice notes (under the user's audio dir)
const DEFAULT_OUTPUT_SUBDIR: &str = "voice-notes";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub duration: Option<String>,
    pub max_duration: Option<String>,
    pub output_dir: Option<String>,
    pub lossless: Option<bool>,
    pub device: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            duration: Some(Duration::default_duration().to_string()),
            max_duration: Some(Duration::default_max_duration().to_string()),
            output_dir: None,
            lossless: Some(true),
            device: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            duration: other.duration.or(self.duration),
            max_duration: other.max_duration.or(self.max_duration),
            output_dir: other.output_dir.or(self.output_dir),
            lossless: other.lossless.or(self.lossless),
            device: other.device.or(self.device),
        }
    }

    /// Get duration as parsed Duration, or default if not set/invalid
    pub fn duration_or_default(&self) -> Duration {
        self.duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_duration)
    }

    /// Get max_duration as parsed Duration, or default if not set/invalid
    pub fn max_duration_or_default(&self) -> Duration {
        self.max_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_max_duration)
    }

    /// Get output directory, falling back to `<audio dir>/voice-notes`
    pub fn output_dir_or_default(&self) -> PathBuf {
        match self.output_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::audio_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_OUTPUT_SUBDIR),
        }
    }

    /// Whether the lossless pipeline may be attempted, true if not set
    pub fn lossless_or_default(&self) -> bool {
        self.lossless.unwrap_or(true)
    }

    /// Preferred input device name, None for the host default
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref().filter(|d| !d.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.duration, Some("30s".to_string()));
        assert_eq!(config.max_duration, Some("5m".to_string()));
        assert!(config.output_dir.is_none());
        assert_eq!(config.lossless, Some(true));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.duration.is_none());
        assert!(config.max_duration.is_none());
        assert!(config.output_dir.is_none());
        assert!(config.lossless.is_none());
        assert!(config.device.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            duration: Some("10s".to_string()),
            output_dir: Some("/base".to_string()),
            lossless: Some(true),
            ..Default::default()
        };

        let other = AppConfig {
            duration: None, // Should not override
            output_dir: Some("/other".to_string()),
            lossless: Some(false),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.duration, Some("10s".to_string()));
        assert_eq!(merged.output_dir, Some("/other".to_string()));
        assert_eq!(merged.lossless, Some(false));
    }

    #[test]
    fn duration_or_default_parses() {
        let config = AppConfig {
            duration: Some("45s".to_string()),
            ..Default::default()
        };
        assert_eq!(config.duration_or_default().as_secs(), 45);
    }

    #[test]
    fn duration_or_default_uses_default_on_invalid() {
        let config = AppConfig {
            duration: Some("invalid".to_string()),
            ..Default::default()
        };
        assert_eq!(config.duration_or_default().as_secs(), 30);
        assert_eq!(AppConfig::empty().max_duration_or_default().as_secs(), 300);
    }

    #[test]
    fn output_dir_or_default_uses_configured() {
        let config = AppConfig {
            output_dir: Some("/tmp/notes".to_string()),
            ..Default::default()
        };
        assert_eq!(config.output_dir_or_default(), PathBuf::from("/tmp/notes"));
    }

    #[test]
    fn output_dir_or_default_falls_back() {
        let dir = AppConfig::empty().output_dir_or_default();
        assert!(dir.ends_with("voice-notes"));
    }

    #[test]
    fn lossless_defaults_to_true() {
        assert!(AppConfig::empty().lossless_or_default());
        let config = AppConfig {
            lossless: Some(false),
            ..Default::default()
        };
        assert!(!config.lossless_or_default());
    }

    #[test]
    fn blank_device_means_host_default() {
        let config = AppConfig {
            device: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.device(), None);

        let config = AppConfig {
            device: Some("USB Mic".to_string()),
            ..Default::default()
        };
        assert_eq!(config.device(), Some("USB Mic"));
    }
}
