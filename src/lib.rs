//! Babel Tavern - character card translator.
//!
//! This library provides functionality for:
//! - Loading and validating V1 and V2 character cards, lore books included
//! - Walking the translatable text fields of a card
//! - Translating those fields through OpenAI-compatible or Gemini APIs

pub mod backend;
pub mod card;
pub mod config;
pub mod console;
pub mod error;
pub mod translator;
pub mod utils;
pub mod walker;

// Re-export commonly used types
pub use backend::{Backend, create_backend};
pub use card::{Card, CardVersion, Translatable, classify};
pub use config::Config;
pub use console::Console;
pub use error::{BackendError, ConfigError, SchemaError, TranslationError, WalkError};
pub use translator::{TranslateSource, Translator, build_prompt};
pub use walker::TreeWalk;
