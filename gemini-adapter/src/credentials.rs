//! Resolution of the Gemini API key.

use crate::error::VisionError;
use std::fmt;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";

/// Value shipped in `.env` templates; treated the same as an unset key.
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// A Gemini API key. The `Debug` output never shows the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a raw key after rejecting empty and placeholder values.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Auth` if the key is blank or the template placeholder.
    pub fn new(raw: impl Into<String>) -> Result<Self, VisionError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VisionError::Auth(format!(
                "API key is empty; set {API_KEY_ENV_VAR}"
            )));
        }
        if trimmed == PLACEHOLDER_API_KEY {
            return Err(VisionError::Auth(format!(
                "API key is still the placeholder value; set a real key in {API_KEY_ENV_VAR}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The raw key, for the request header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Locates the API key.
///
/// Resolution order:
/// 1. `explicit` if provided (e.g. a `--api-key` flag).
/// 2. The `GOOGLE_API_KEY` environment variable.
///
/// # Errors
///
/// Returns `VisionError::Auth` when no usable key is found.
pub fn resolve_api_key(explicit: Option<String>) -> Result<ApiKey, VisionError> {
    resolve_api_key_with(explicit, std::env::var(API_KEY_ENV_VAR).ok())
}

/// Same as [`resolve_api_key`] with the environment value supplied by the caller.
///
/// # Errors
///
/// Returns `VisionError::Auth` when no usable key is found.
pub fn resolve_api_key_with(
    explicit: Option<String>,
    env_value: Option<String>,
) -> Result<ApiKey, VisionError> {
    match explicit.or(env_value) {
        Some(raw) => ApiKey::new(raw),
        None => Err(VisionError::Auth(format!(
            "no API key found; set {API_KEY_ENV_VAR} or pass one explicitly"
        ))),
    }
}
