//! Configuration management for Babel Tavern.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory.
const APP_NAME: &str = "BabelTavern";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Placeholder value for unconfigured API keys.
const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Default prompt for translating a single card field.
pub const DEFAULT_TRANSLATION_PROMPT: &str = "\
This is a {source_lang} to {target_lang} translation, please provide the {target_lang} translation for this text.

- Preserve text formatting, special characters, and HTML elements.
- Do not provide any explanations or text apart from the translation.
- Label [{source_lang}] and [{target_lang}] should also not be included in the output.
- Always preserve the important placeholder tags {{user}} and {{char}} exactly as they appear in the original text

[{source_lang}]: {text}

[{target_lang}]:
";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text-generation API configuration.
    pub api: ApiConfig,

    /// Translation behavior settings.
    pub translation: TranslationConfig,

    /// LLM prompts.
    pub prompts: PromptsConfig,

    /// File paths.
    pub paths: PathsConfig,
}

/// Which text-generation service to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Any OpenAI-compatible chat completions endpoint.
    #[default]
    #[value(name = "openai")]
    OpenAi,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl Provider {
    /// Base URL used when none is configured.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Gemini => "gemini-2.5-flash",
        }
    }

    /// Environment variable holding the API key for this provider.
    pub fn key_env(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GOOGLE_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

/// API configuration for LLM endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Service flavour.
    pub provider: Provider,

    /// API key (required).
    pub key: String,

    /// Model identifier.
    pub model: String,

    /// Base URL for the API; the provider default when unset.
    pub base_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            key: API_KEY_PLACEHOLDER.to_string(),
            model: Provider::default().default_model().to_string(),
            base_url: None,
        }
    }
}

impl ApiConfig {
    /// Checks if the API key is configured (not placeholder).
    pub fn is_configured(&self) -> bool {
        !self.key.is_empty() && self.key != API_KEY_PLACEHOLDER
    }

    /// Returns the base URL without a trailing slash.
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Switches provider, resetting the model if it belonged to the old one.
    pub fn set_provider(&mut self, provider: Provider) {
        if self.model == self.provider.default_model() {
            self.model = provider.default_model().to_string();
        }
        self.provider = provider;
    }
}

/// Translation behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Language the card is written in.
    pub source_lang: String,

    /// Language to translate into.
    pub target_lang: String,

    /// HTTP timeout for a single backend request, in seconds.
    pub request_timeout_sec: u64,

    /// Ceiling on concurrent backend requests. Unbounded when unset.
    pub max_in_flight: Option<usize>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: "english".to_string(),
            target_lang: "chinese".to_string(),
            request_timeout_sec: 120,
            max_in_flight: None,
        }
    }
}

impl TranslationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_sec)
    }
}

/// LLM prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Template for translating one field. Placeholders: `{source_lang}`,
    /// `{target_lang}`, `{text}`.
    pub translation: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            translation: DEFAULT_TRANSLATION_PROMPT.to_string(),
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for translated cards. Next to the input when unset.
    pub output_directory: Option<PathBuf>,
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fills the API key and base URL from the environment.
    ///
    /// `lookup` is normally `std::env::var(..).ok()`. Values from the
    /// environment win over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty(self.api.provider.key_env()) {
            self.api.key = key;
        }
        if self.api.provider == Provider::OpenAi {
            if let Some(base_url) = non_empty("OPENAI_BASE_URL") {
                self.api.base_url = Some(base_url);
            }
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.is_configured() {
            return Err(ConfigError::MissingValue(format!(
                "api.key (set your API key in config file or {})",
                self.api.provider.key_env()
            )));
        }

        if self.api.model.trim().is_empty() {
            return Err(ConfigError::MissingValue("api.model".to_string()));
        }

        if let Some(base_url) = &self.api.base_url {
            url::Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
                key: "api.base_url".to_string(),
                message: e.to_string(),
            })?;
        }

        if self.translation.max_in_flight == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "translation.max_in_flight".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if !self.prompts.translation.contains("{text}") {
            return Err(ConfigError::InvalidValue {
                key: "prompts.translation".to_string(),
                message: "must contain the {text} placeholder".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the directory translated cards are written to.
    pub fn output_dir_for(&self, input: &Path) -> PathBuf {
        match &self.paths.output_directory {
            Some(dir) => dir.clone(),
            None => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}
