//! Card translation through a text-generation backend.
//!
//! Every non-blank text leaf of a card becomes one backend request built
//! from the prompt template; the answers are written back in place.

use crate::backend::Backend;
use crate::card::{Card, Translatable};
use crate::config::{Config, DEFAULT_TRANSLATION_PROMPT};
use crate::error::{SchemaError, TranslationError};
use crate::utils::snippet;
use crate::walker;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Characters of source/translated text shown in log lines.
const LOG_SNIPPET_CHARS: usize = 60;

const PLACEHOLDERS: [&str; 3] = ["{source_lang}", "{target_lang}", "{text}"];

/// Fills a prompt template.
///
/// Only the exact placeholders `{source_lang}`, `{target_lang}` and `{text}`
/// are substituted, in a single pass, so braces inside the inserted values
/// (such as `{{user}}`) come through untouched.
pub fn render_prompt(template: &str, source_lang: &str, target_lang: &str, text: &str) -> String {
    let mut prompt = String::with_capacity(template.len() + text.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];

        match PLACEHOLDERS.iter().find(|p| tail.starts_with(*p)) {
            Some(placeholder) => {
                prompt.push_str(match *placeholder {
                    "{source_lang}" => source_lang,
                    "{target_lang}" => target_lang,
                    _ => text,
                });
                rest = &tail[placeholder.len()..];
            }
            None => {
                prompt.push('{');
                rest = &tail[1..];
            }
        }
    }

    prompt.push_str(rest);
    prompt
}

/// Builds the default translation prompt for one piece of text.
pub fn build_prompt(source_lang: &str, target_lang: &str, text: &str) -> String {
    render_prompt(DEFAULT_TRANSLATION_PROMPT, source_lang, target_lang, text)
}

/// A loaded card together with the language pair to translate it between.
#[derive(Debug, Clone)]
pub struct TranslateSource {
    pub card: Card,
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslateSource {
    pub fn new(card: Card, source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            card,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    /// Classifies, validates and builds a card from parsed JSON.
    pub fn from_json(
        value: Value,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let card = Card::from_value(value)?;
        Ok(Self::new(card, source_lang, target_lang))
    }

    /// Loads a card embedded in PNG metadata.
    pub fn from_png(
        _png: &[u8],
        _source_lang: impl Into<String>,
        _target_lang: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        Err(SchemaError::Unimplemented("loading cards from PNG metadata"))
    }
}

/// Translates cards with a [`Backend`].
pub struct Translator {
    backend: Arc<dyn Backend>,
    template: String,
    limiter: Option<Semaphore>,
}

impl Translator {
    /// Creates a translator using the default prompt and no request ceiling.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            template: DEFAULT_TRANSLATION_PROMPT.to_string(),
            limiter: None,
        }
    }

    /// Uses a custom prompt template (see [`render_prompt`]).
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Caps the number of backend requests in flight. `None` or zero means
    /// no cap.
    pub fn with_max_in_flight(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit.filter(|n| *n > 0).map(Semaphore::new);
        self
    }

    /// Creates a translator with the prompt and request ceiling from `config`.
    pub fn from_config(backend: Arc<dyn Backend>, config: &Config) -> Self {
        Self::new(backend)
            .with_template(config.prompts.translation.clone())
            .with_max_in_flight(config.translation.max_in_flight)
    }

    /// Translates a loaded source in place.
    pub async fn run(&self, source: &mut TranslateSource) -> Result<(), TranslationError> {
        info!(
            card = source.card.name(),
            version = %source.card.version(),
            backend = self.backend.name(),
            "translating {} -> {}",
            source.source_lang,
            source.target_lang
        );
        self.translate(&mut source.card, &source.source_lang, &source.target_lang)
            .await
    }

    /// Translates every text leaf of `record` in place.
    ///
    /// The first backend failure fails the whole call; leaves translated
    /// before it keep their new text.
    pub async fn translate(
        &self,
        record: &mut dyn Translatable,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<(), TranslationError> {
        let callback = move |text: String| self.translate_leaf(source_lang, target_lang, text);
        walker::replace(record, &callback).await
    }

    async fn translate_leaf(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: String,
    ) -> Result<String, TranslationError> {
        let prompt = render_prompt(&self.template, source_lang, target_lang, &text);

        // The limiter is never closed, so acquiring only waits.
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        debug!(source = %snippet(&text, LOG_SNIPPET_CHARS), "requesting translation");
        let translated = self.backend.generate(&prompt).await?;
        info!(translated = %snippet(&translated, LOG_SNIPPET_CHARS), "translated field");

        Ok(translated)
    }
}
