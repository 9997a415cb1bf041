use crate::defaults;
use crate::error::{LivesubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub chunking: ChunkingConfig,
    pub transcription: TranscriptionConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
}

/// Chunk segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_duration_secs: f32,
    pub overlap_duration_secs: f32,
}

/// Remote transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub api_url: String,
    pub model: String,
    /// Language code, or "auto" for automatic detection.
    pub language: String,
    /// Locale used for the context prompt templates (en, ja, zh, ko).
    pub prompt_locale: String,
    /// Number of past transcriptions kept as rolling context.
    pub context_history: usize,
    /// Hard timeout for a single transcription request, in seconds.
    pub timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_duration_secs: defaults::CHUNK_DURATION_SECS,
            overlap_duration_secs: defaults::OVERLAP_DURATION_SECS,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::DEFAULT_API_URL.to_string(),
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            prompt_locale: "en".to_string(),
            context_history: defaults::CONTEXT_HISTORY,
            timeout_secs: defaults::API_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file contains invalid TOML or fails
    /// validation. Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LivesubError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                LivesubError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file
    /// doesn't exist.
    ///
    /// Only returns defaults if the file is missing. Returns errors for
    /// invalid TOML or invalid values.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(LivesubError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(LivesubError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.chunking.chunk_duration_secs <= 0.0 {
            return Err(LivesubError::ConfigInvalidValue {
                key: "chunking.chunk_duration_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.chunking.overlap_duration_secs < 0.0 {
            return Err(LivesubError::ConfigInvalidValue {
                key: "chunking.overlap_duration_secs".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        if self.chunking.overlap_duration_secs >= self.chunking.chunk_duration_secs {
            return Err(LivesubError::ConfigInvalidValue {
                key: "chunking.overlap_duration_secs".to_string(),
                message: "must be shorter than chunk duration".to_string(),
            });
        }
        if self.transcription.context_history == 0 {
            return Err(LivesubError::ConfigInvalidValue {
                key: "transcription.context_history".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Default configuration file path: `~/.config/livesub/config.toml`.
#[cfg(feature = "cli")]
pub fn default_config_path() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from(".config"))
        .join("livesub")
        .join("config.toml")
}
