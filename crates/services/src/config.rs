use std::env;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for the AI mentor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl MentorConfig {
    /// Build a config, normalizing blanks to defaults.
    ///
    /// Returns `Ok(None)` when no API key is given: the mentor is then
    /// disabled rather than misconfigured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the base URL does not parse.
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = normalize_optional(api_key) else {
            return Ok(None);
        };
        let base_url = normalize_optional(base_url).unwrap_or_else(|| DEFAULT_BASE_URL.into());
        if Url::parse(&base_url).is_err() {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }
        let model = normalize_optional(model).unwrap_or_else(|| DEFAULT_MODEL.into());

        Ok(Some(Self {
            base_url,
            api_key,
            model,
        }))
    }

    /// Read `LEARN_AI_API_KEY`, `LEARN_AI_BASE_URL` and `LEARN_AI_MODEL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if `LEARN_AI_BASE_URL` is set but
    /// invalid.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::new(
            env::var("LEARN_AI_API_KEY").ok(),
            env::var("LEARN_AI_BASE_URL").ok(),
            env::var("LEARN_AI_MODEL").ok(),
        )
    }

    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
