use crate::defaults;
use crate::error::{FrontendError, Result};
use crate::pipeline::{Dialect, Domain, EmptyInputPolicy, PipelineConfig, PipelineOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineSection,
    pub normalization: NormalizationConfig,
    pub phonemes: PhonemeConfig,
    pub dictionary: DictionaryConfig,
}

/// Daemon socket and worker pool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub socket: Option<PathBuf>,
    pub max_workers: usize,
    /// Milliseconds a client may take to send its request line
    pub read_timeout_ms: u64,
}

/// Service-level pipeline behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    pub empty_input: EmptyInputPolicy,
    pub split_sentences: bool,
}

/// Normalization defaults reported by `get_default_parameters`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NormalizationConfig {
    pub domain: Domain,
}

/// Default phoneme description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhonemeConfig {
    pub word_separator: String,
    /// Syllabification symbol; empty disables syllable marking.
    pub syllabified: String,
    pub stress_labels: bool,
    pub dialect: Dialect,
    pub alphabet: String,
}

/// Pronunciation dictionary file merged under request dictionaries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DictionaryConfig {
    pub path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket: None,
            max_workers: defaults::MAX_WORKERS,
            read_timeout_ms: defaults::REQUEST_READ_TIMEOUT_MS,
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            empty_input: EmptyInputPolicy::Reject,
            split_sentences: defaults::SPLIT_SENTENCES,
        }
    }
}

impl Default for PhonemeConfig {
    fn default() -> Self {
        Self {
            word_separator: defaults::WORD_SEPARATOR.to_string(),
            syllabified: defaults::SYLLABIFICATION_SYMBOL.to_string(),
            stress_labels: false,
            dialect: Dialect::Standard,
            alphabet: defaults::ALPHABET.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Invalid TOML and invalid values are returned as errors.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - TTS_FRONTEND_SOCKET → server.socket
    /// - TTS_FRONTEND_MAX_WORKERS → server.max_workers
    /// - TTS_FRONTEND_DOMAIN → normalization.domain
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(socket) = std::env::var("TTS_FRONTEND_SOCKET")
            && !socket.is_empty()
        {
            self.server.socket = Some(PathBuf::from(socket));
        }

        if let Ok(workers) = std::env::var("TTS_FRONTEND_MAX_WORKERS")
            && !workers.is_empty()
        {
            self.server.max_workers =
                workers
                    .parse()
                    .map_err(|e| FrontendError::ConfigInvalidValue {
                        key: "TTS_FRONTEND_MAX_WORKERS".to_string(),
                        message: format!("'{}': {}", workers, e),
                    })?;
        }

        if let Ok(domain) = std::env::var("TTS_FRONTEND_DOMAIN")
            && !domain.is_empty()
        {
            self.normalization.domain =
                domain
                    .parse()
                    .map_err(|message| FrontendError::ConfigInvalidValue {
                        key: "TTS_FRONTEND_DOMAIN".to_string(),
                        message,
                    })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.server.max_workers == 0 {
            return Err(FrontendError::ConfigInvalidValue {
                key: "server.max_workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.server.read_timeout_ms == 0 {
            return Err(FrontendError::ConfigInvalidValue {
                key: "server.read_timeout_ms".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.phonemes.alphabet.trim().is_empty() {
            return Err(FrontendError::ConfigInvalidValue {
                key: "phonemes.alphabet".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Service-level options for the pipeline orchestrator.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            empty_input: self.pipeline.empty_input,
            split_sentences: self.pipeline.split_sentences,
        }
    }

    /// Pipeline configuration a request gets when it overrides nothing.
    pub fn default_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_domain(self.normalization.domain)
            .with_word_separator(self.phonemes.word_separator.clone())
            .with_syllabification_symbol(self.phonemes.syllabified.clone())
            .with_stress_labels(self.phonemes.stress_labels)
            .with_dialect(self.phonemes.dialect)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/tts-frontend/config.toml on Linux
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dir.join(defaults::APP_DIR).join("config.toml"))
    }
}
