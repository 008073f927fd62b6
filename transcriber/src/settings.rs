//! Layered settings: built-in defaults, then a TOML file, then CLI flags.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use vlm_gemini::types::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_PROMPT, DEFAULT_TIMEOUT};
use vlm_gemini::RequestConfig;
use vlm_pipeline::config::{
    AuthFailurePolicy, PipelineConfig, RetryConfig, ValidationLimits, DEFAULT_ALLOWED_FORMATS,
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_FILE_SIZE_BYTES,
};

/// Environment variable naming the settings file.
pub const CONFIG_ENV_VAR: &str = "VLM_TRANSCRIBER_CONFIG";

/// File name under the per-user config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

const APP_DIR: &str = "vlm-transcriber";

/// Errors loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A settings file named explicitly does not exist.
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// A value is out of range.
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// All recognized settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Largest accepted image, in bytes.
    pub max_file_size_bytes: u64,
    /// Accepted file extensions.
    pub allowed_formats: Vec<String>,
    /// Most images per batch.
    pub max_batch_size: usize,
    /// Attempts per image, first call included.
    pub retry_max_attempts: usize,
    /// Wait between attempts, in seconds.
    pub retry_delay_seconds: f64,
    /// Reaction to a rejected API key.
    pub auth_failure_policy: AuthFailurePolicy,
    /// Gemini model name.
    pub model: String,
    /// Scheme and host of the API.
    pub api_base_url: String,
    /// Per-request timeout, in seconds.
    pub request_timeout_seconds: u64,
    /// Instruction sent with every image.
    pub prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_formats: DEFAULT_ALLOWED_FORMATS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            retry_max_attempts: RetryConfig::default().max_attempts,
            retry_delay_seconds: RetryConfig::default().delay.as_secs_f64(),
            auth_failure_policy: AuthFailurePolicy::default(),
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

/// Values given on the command line; `None` keeps the file or default value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    /// `--model`
    pub model: Option<String>,
    /// `--max-attempts`
    pub retry_max_attempts: Option<usize>,
    /// `--retry-delay`
    pub retry_delay_seconds: Option<f64>,
}

/// Where settings are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    /// The file to read.
    pub path: PathBuf,
    /// Whether a missing file is an error.
    pub required: bool,
}

/// Default settings file: `<config_dir>/vlm-transcriber/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Picks the settings file: `--config`, then the environment, then the
/// per-user default. Only the per-user default may be absent.
#[must_use]
pub fn resolve_config_source(
    explicit: Option<&Path>,
    env_value: Option<OsString>,
    default: Option<PathBuf>,
) -> Option<ConfigSource> {
    if let Some(path) = explicit {
        return Some(ConfigSource {
            path: path.to_path_buf(),
            required: true,
        });
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(ConfigSource {
            path: PathBuf::from(value),
            required: true,
        });
    }
    default.map(|path| ConfigSource {
        path,
        required: false,
    })
}

impl Settings {
    /// Parses settings from TOML text. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Parse` on invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, SettingsError> {
        toml::from_str(text).map_err(|source| SettingsError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Loads settings from `source`, or defaults when there is none.
    ///
    /// # Errors
    ///
    /// Fails if a required file is missing or any file is unreadable or invalid.
    pub fn load(source: Option<&ConfigSource>) -> Result<Self, SettingsError> {
        let Some(source) = source else {
            return Ok(Self::default());
        };

        match std::fs::read_to_string(&source.path) {
            Ok(text) => {
                tracing::debug!(path = %source.path.display(), "Loaded settings file");
                Self::from_toml_str(&text, &source.path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if source.required {
                    Err(SettingsError::NotFound(source.path.clone()))
                } else {
                    Ok(Self::default())
                }
            }
            Err(source_err) => Err(SettingsError::Read {
                path: source.path.clone(),
                source: source_err,
            }),
        }
    }

    /// Applies command-line values on top.
    #[must_use]
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(attempts) = overrides.retry_max_attempts {
            self.retry_max_attempts = attempts;
        }
        if let Some(delay) = overrides.retry_delay_seconds {
            self.retry_delay_seconds = delay;
        }
        self
    }

    /// Checks ranges after all layers are merged.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` naming the first bad key.
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(key: &'static str, reason: impl Into<String>) -> SettingsError {
            SettingsError::Invalid {
                key,
                reason: reason.into(),
            }
        }

        if self.max_file_size_bytes == 0 {
            return Err(invalid("max_file_size_bytes", "must be greater than zero"));
        }
        if self.max_batch_size == 0 {
            return Err(invalid("max_batch_size", "must be greater than zero"));
        }
        if self.allowed_formats.is_empty() {
            return Err(invalid("allowed_formats", "at least one format is required"));
        }
        if let Some(unknown) = self.allowed_formats.iter().find(|f| {
            !DEFAULT_ALLOWED_FORMATS.contains(&f.trim_start_matches('.').to_ascii_lowercase().as_str())
        }) {
            return Err(invalid(
                "allowed_formats",
                format!(
                    "unsupported format {unknown:?}, expected any of {}",
                    DEFAULT_ALLOWED_FORMATS.join(", ")
                ),
            ));
        }
        if self.retry_max_attempts == 0 {
            return Err(invalid("retry_max_attempts", "must be at least 1"));
        }
        if !self.retry_delay_seconds.is_finite() || self.retry_delay_seconds < 0.0 {
            return Err(invalid(
                "retry_delay_seconds",
                "must be a non-negative number of seconds",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(invalid("model", "must not be empty"));
        }
        if !(self.api_base_url.starts_with("https://") || self.api_base_url.starts_with("http://"))
        {
            return Err(invalid("api_base_url", "must start with http:// or https://"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(invalid("request_timeout_seconds", "must be greater than zero"));
        }
        if self.prompt.trim().is_empty() {
            return Err(invalid("prompt", "must not be empty"));
        }
        Ok(())
    }

    /// Batch configuration for the pipeline.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        let limits = ValidationLimits {
            max_file_size_bytes: self.max_file_size_bytes,
            allowed_formats: self
                .allowed_formats
                .iter()
                .map(|f| f.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        };
        PipelineConfig::new()
            .with_limits(limits)
            .with_max_batch_size(self.max_batch_size)
            .with_max_attempts(self.retry_max_attempts)
            .with_retry_delay(self.retry_delay())
            .with_auth_failure_policy(self.auth_failure_policy)
    }

    /// Request configuration for the Gemini client.
    #[must_use]
    pub fn request_config(&self) -> RequestConfig {
        RequestConfig {
            model: self.model.clone(),
            base_url: self.api_base_url.trim_end_matches('/').to_string(),
            prompt: self.prompt.clone(),
            timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }

    /// Delay between attempts. Out-of-range values fall back to zero; call
    /// [`validate`](Self::validate) first to reject them.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_delay_seconds).unwrap_or_default()
    }

    /// The settings rendered as a commented TOML document.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which only happens for non-finite floats.
    pub fn to_commented_toml(&self) -> Result<String, toml::ser::Error> {
        let body = toml::to_string_pretty(self)?;
        Ok(format!(
            "# vlm-transcriber settings.\n\
             #\n\
             # Values here override the built-in defaults; command-line flags\n\
             # override values here. Unknown keys are rejected.\n\
             #\n\
             # The API key is never read from this file. Set {} or pass --api-key.\n\n\
             {body}",
            vlm_gemini::API_KEY_ENV_VAR
        ))
    }
}
