//! Configuration module for the dish bot.
//!
//! Handles loading and validation of API credentials, runtime settings,
//! and the vocabulary the dishes are built from.

mod period;
mod settings;
mod vocabulary;

pub use period::parse_period;
pub use settings::{BotSettings, ConfigError, Credentials};
pub use vocabulary::{Phrasing, PoolSize, VocabLoadError, VocabularySet, WordBank, WordKind};

/// Maximum post length accepted by the posting API.
pub const MAX_POST_LENGTH: usize = 280;

/// Default credentials file, read before falling back to the environment.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default vocabulary file.
pub const DEFAULT_VOCAB_FILE: &str = "vocab.yaml";
