//! Model settings resolved from the process environment.
//!
//! [`ModelSettings`] is the single source of provider configuration. Build it
//! once at startup with [`ModelSettings::from_env`] and pass it by reference
//! to a [`ClientFactory`](crate::factory::ClientFactory).
//!
//! Reads from:
//! - `OPENAI_API_KEY` - Optional API key
//! - `OPENAI_BASE_URL` - Optional base URL (e.g. `https://api.example.com/v1`)
//! - `OPENAI_MODEL_NAME` - Optional model name, defaults to `gpt-4`
//!
//! A `.env` file in the working directory (or any parent) is loaded first if
//! present. An empty key or base URL counts as unset. The model name only
//! falls back to `gpt-4` when the variable is missing entirely.

use tracing::debug;

/// Environment variable holding the provider API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable holding the provider base URL.
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
/// Environment variable holding the model name.
pub const MODEL_NAME_VAR: &str = "OPENAI_MODEL_NAME";

/// Model name used when `OPENAI_MODEL_NAME` is unset.
pub const DEFAULT_MODEL_NAME: &str = "gpt-4";

/// Immutable provider settings for the lifetime of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelSettings {
    api_key: Option<String>,
    base_url: Option<String>,
    model_name: String,
}

impl ModelSettings {
    /// Creates settings from explicit values.
    ///
    /// Empty key and base URL strings are normalised to `None`. A missing
    /// model name falls back to [`DEFAULT_MODEL_NAME`]; an empty one is kept.
    #[must_use]
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        model_name: Option<String>,
    ) -> Self {
        Self {
            api_key: non_empty(api_key),
            base_url: non_empty(base_url),
            model_name: model_name.unwrap_or_else(|| DEFAULT_MODEL_NAME.to_owned()),
        }
    }

    /// Loads `.env` (if any) and reads settings from the process environment.
    ///
    /// Never fails: missing values are left for the provider to reject.
    #[must_use]
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Self::new(
            lookup(API_KEY_VAR),
            lookup(BASE_URL_VAR),
            lookup(MODEL_NAME_VAR),
        );
        debug!(
            model = %settings.model_name,
            has_api_key = settings.api_key.is_some(),
            base_url = settings.base_url.as_deref().unwrap_or("<provider default>"),
            "resolved model settings",
        );
        settings
    }

    /// Returns the configured model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the API key, if one is configured.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Returns the base URL, if one is configured.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

// Keeps the key out of logs and panic messages.
impl std::fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> ModelSettings {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ModelSettings::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_default_model() {
        let settings = settings_from(&[]);
        assert_eq!(settings.model_name(), "gpt-4");
        assert!(settings.api_key().is_none());
        assert!(settings.base_url().is_none());
    }

    #[test]
    fn model_name_from_environment() {
        let settings = settings_from(&[(MODEL_NAME_VAR, "qwen-turbo")]);
        assert_eq!(settings.model_name(), "qwen-turbo");
    }

    #[test]
    fn empty_key_and_base_url_are_absent() {
        let settings = settings_from(&[(API_KEY_VAR, ""), (BASE_URL_VAR, "")]);
        assert!(settings.api_key().is_none());
        assert!(settings.base_url().is_none());
        assert_eq!(settings.model_name(), DEFAULT_MODEL_NAME);
    }

    #[test]
    fn empty_model_name_is_kept() {
        let settings = settings_from(&[(MODEL_NAME_VAR, "")]);
        assert_eq!(settings.model_name(), "");
    }

    #[test]
    fn reads_all_three_variables() {
        let settings = settings_from(&[
            (API_KEY_VAR, "abc"),
            (BASE_URL_VAR, "https://x/v1"),
            (MODEL_NAME_VAR, "qwen-turbo"),
        ]);
        assert_eq!(settings.api_key(), Some("abc"));
        assert_eq!(settings.base_url(), Some("https://x/v1"));
        assert_eq!(settings.model_name(), "qwen-turbo");
    }

    #[test]
    fn debug_redacts_api_key() {
        let settings = ModelSettings::new(Some("sk-secret".into()), None, None);
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
