//! Limits and retry behavior for a batch run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Largest accepted image (20 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 20 * 1024 * 1024;

/// Extensions accepted by default.
pub const DEFAULT_ALLOWED_FORMATS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Most images accepted in one batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Per-image checks applied before any request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationLimits {
    /// Files strictly larger than this are rejected.
    pub max_file_size_bytes: u64,
    /// Accepted file extensions, lower-case and without the dot.
    pub allowed_formats: BTreeSet<String>,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_formats: DEFAULT_ALLOWED_FORMATS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
        }
    }
}

impl ValidationLimits {
    /// Returns `true` if `extension` is allowed, ignoring case and a leading dot.
    #[must_use]
    pub fn allows_extension(&self, extension: &str) -> bool {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        self.allowed_formats.contains(&normalized)
    }
}

/// Retry behavior for one image's extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, first call included (default: 3).
    pub max_attempts: usize,
    /// Wait between two attempts (default: 1 second).
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// What the orchestrator does when the API rejects the credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailurePolicy {
    /// Stop the batch and return the results gathered so far.
    #[default]
    Halt,
    /// Record the failure for that image and carry on.
    Continue,
}

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Per-image validation limits.
    pub limits: ValidationLimits,
    /// Maximum number of images per batch.
    pub max_batch_size: usize,
    /// Retry behavior for transient API failures.
    pub retry: RetryConfig,
    /// Reaction to an authentication failure.
    pub auth_failure_policy: AuthFailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limits: ValidationLimits::default(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            retry: RetryConfig::default(),
            auth_failure_policy: AuthFailurePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new `PipelineConfig` with default settings.
    ///
    /// Equivalent to `PipelineConfig::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum batch size.
    #[must_use]
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max;
        self
    }

    /// Set the maximum number of attempts per image.
    #[must_use]
    pub fn with_max_attempts(mut self, max: usize) -> Self {
        self.retry.max_attempts = max;
        self
    }

    /// Set the delay between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.delay = delay;
        self
    }

    /// Set the per-image validation limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the authentication failure policy.
    #[must_use]
    pub fn with_auth_failure_policy(mut self, policy: AuthFailurePolicy) -> Self {
        self.auth_failure_policy = policy;
        self
    }
}
