//! Application settings and API credentials.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{DEFAULT_VOCAB_FILE, MAX_POST_LENGTH, parse_period};
use crate::generator::{GeneratorOptions, GeneratorVariant};
use crate::twitter::RetryPolicy;

/// OAuth 1.0a credentials and posting period.
///
/// Field names in the YAML file follow the `ConsumerKey` style; the
/// environment fallback uses `CONSUMER_KEY` style names.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    #[serde(rename = "ConsumerKey", default)]
    pub consumer_key: String,

    #[serde(rename = "ConsumerSecret", default)]
    pub consumer_secret: String,

    #[serde(rename = "AccessToken", default)]
    pub access_token: String,

    #[serde(rename = "AccessSecret", default)]
    pub access_secret: String,

    /// Posting period, e.g. `1h30m`.
    #[serde(rename = "Period", default)]
    pub period: String,
}

impl Credentials {
    /// Loads credentials from `path` if it exists, otherwise from the
    /// environment, and validates them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed, or if a
    /// credential or the period is missing or invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Like [`Credentials::load`], with an arbitrary variable lookup for
    /// the environment fallback.
    pub fn load_with(
        path: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let credentials = match std::fs::read_to_string(path) {
            Ok(content) => {
                info!("Loading credentials from {}", path.display());
                Self::from_yaml_str(&content)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config file at {}, reading credentials from environment", path.display());
                Self::from_lookup(lookup)
            }
            Err(e) => return Err(ConfigError::IoError(e)),
        };

        credentials.validate()?;
        Ok(credentials)
    }

    /// Parses credentials from a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Reads credentials from `CONSUMER_KEY`, `CONSUMER_SECRET`,
    /// `ACCESS_TOKEN`, `ACCESS_SECRET` and `PERIOD`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads credentials through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).unwrap_or_default();
        Self {
            consumer_key: var("CONSUMER_KEY"),
            consumer_secret: var("CONSUMER_SECRET"),
            access_token: var("ACCESS_TOKEN"),
            access_secret: var("ACCESS_SECRET"),
            period: var("PERIOD"),
        }
    }

    /// Checks that every credential is present and the period parses.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("ConsumerKey", &self.consumer_key),
            ("ConsumerSecret", &self.consumer_secret),
            ("AccessToken", &self.access_token),
            ("AccessSecret", &self.access_secret),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingCredential(name));
            }
        }

        if self.period.trim().is_empty() {
            return Err(ConfigError::MissingPeriod);
        }
        self.period()?;

        Ok(())
    }

    /// Returns the parsed posting period.
    pub fn period(&self) -> Result<Duration, ConfigError> {
        parse_period(&self.period)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BotSettings {
    /// Path to the vocabulary YAML file.
    pub vocab_path: PathBuf,

    /// Base URL of the posting API.
    pub api_base_url: String,

    /// Maximum length of a post in characters.
    pub max_post_length: usize,

    /// Generation preset.
    pub variant: GeneratorVariant,

    /// Generation options, starting from the variant defaults.
    pub generator: GeneratorOptions,

    /// Retries after a retryable publish failure.
    pub publish_retries: u32,

    /// Delay before the first retry, in seconds.
    pub retry_backoff_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.twitter.com".to_owned()
}

const fn default_publish_retries() -> u32 {
    3
}

const fn default_retry_backoff() -> u64 {
    30
}

impl Default for BotSettings {
    fn default() -> Self {
        let variant = GeneratorVariant::default();
        Self {
            vocab_path: PathBuf::from(DEFAULT_VOCAB_FILE),
            api_base_url: default_api_base_url(),
            max_post_length: MAX_POST_LENGTH,
            variant,
            generator: GeneratorOptions::for_variant(variant),
            publish_retries: default_publish_retries(),
            retry_backoff_secs: default_retry_backoff(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates bot settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let variant = parse_var(&lookup, "GENERATOR_VARIANT")?.unwrap_or(defaults.variant);
        let base = GeneratorOptions::for_variant(variant);
        let generator = GeneratorOptions {
            recency: parse_var(&lookup, "RECENCY_FILTER")?.unwrap_or(base.recency),
            adjective_chance: parse_chance(&lookup, "ADJECTIVE_CHANCE")?
                .unwrap_or(base.adjective_chance),
            place_chance: parse_chance(&lookup, "PLACE_CHANCE")?.unwrap_or(base.place_chance),
        };

        let max_post_length =
            parse_var(&lookup, "MAX_POST_LENGTH")?.unwrap_or(defaults.max_post_length);
        if max_post_length == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "MAX_POST_LENGTH",
                value: "0".to_owned(),
            });
        }

        Ok(Self {
            vocab_path: lookup("VOCAB_PATH").map_or(defaults.vocab_path, PathBuf::from),
            api_base_url: lookup("API_BASE_URL").unwrap_or(defaults.api_base_url),
            max_post_length,
            variant,
            generator,
            publish_retries: parse_var(&lookup, "PUBLISH_RETRIES")?
                .unwrap_or(defaults.publish_retries),
            retry_backoff_secs: parse_var(&lookup, "RETRY_BACKOFF_SECS")?
                .unwrap_or(defaults.retry_backoff_secs),
        })
    }

    /// Retry policy for the publish boundary.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.publish_retries,
            Duration::from_secs(self.retry_backoff_secs),
        )
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(ConfigError::InvalidSetting { name, value: raw }),
        },
    }
}

/// Parses a probability in `[0, 1]`.
fn parse_chance(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<f64>, ConfigError> {
    let chance: Option<f64> = parse_var(lookup, name)?;
    match chance {
        Some(value) if !(0.0..=1.0).contains(&value) => Err(ConfigError::InvalidSetting {
            name,
            value: value.to_string(),
        }),
        other => Ok(other),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("Missing required posting period")]
    MissingPeriod,

    #[error("Invalid period {value:?}: {reason}")]
    InvalidPeriod { value: String, reason: &'static str },

    #[error("Invalid value for {name}: {value:?}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const FULL_ENV: [(&str, &str); 5] = [
        ("CONSUMER_KEY", "ck"),
        ("CONSUMER_SECRET", "cs"),
        ("ACCESS_TOKEN", "at"),
        ("ACCESS_SECRET", "as"),
        ("PERIOD", "1h"),
    ];

    #[test]
    fn test_credentials_from_lookup() {
        let credentials = Credentials::from_lookup(lookup_from(&FULL_ENV));
        assert_eq!(credentials.consumer_key, "ck");
        assert_eq!(credentials.access_secret, "as");
        assert!(credentials.validate().is_ok());
        assert_eq!(credentials.period().unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_missing_credential() {
        let credentials = Credentials::from_lookup(lookup_from(&FULL_ENV[1..]));
        assert!(matches!(
            credentials.validate(),
            Err(ConfigError::MissingCredential("ConsumerKey"))
        ));
    }

    #[test]
    fn test_missing_period() {
        let credentials = Credentials::from_lookup(lookup_from(&FULL_ENV[..4]));
        assert!(matches!(credentials.validate(), Err(ConfigError::MissingPeriod)));
    }

    #[test]
    fn test_credentials_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "ConsumerKey: ck\nConsumerSecret: cs\nAccessToken: at\nAccessSecret: as\nPeriod: 30m"
        )
        .unwrap();

        let credentials = Credentials::load(file.path()).unwrap();
        assert_eq!(credentials.access_token, "at");
        assert_eq!(credentials.period().unwrap(), Duration::from_secs(1800));
    }

    #[test]
    fn test_missing_file_falls_back_to_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let credentials = Credentials::load_with(&path, lookup_from(&FULL_ENV)).unwrap();
        assert_eq!(credentials.consumer_key, "ck");
        assert_eq!(credentials.consumer_secret, "cs");
        assert_eq!(credentials.access_token, "at");
        assert_eq!(credentials.access_secret, "as");
        assert_eq!(credentials.period().unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_missing_file_and_incomplete_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        assert!(matches!(
            Credentials::load_with(&path, lookup_from(&FULL_ENV[..3])),
            Err(ConfigError::MissingCredential("AccessSecret"))
        ));
    }

    #[test]
    fn test_file_wins_over_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "ConsumerKey: file-ck\nConsumerSecret: cs\nAccessToken: at\nAccessSecret: as\nPeriod: 30m"
        )
        .unwrap();

        let credentials = Credentials::load_with(file.path(), lookup_from(&FULL_ENV)).unwrap();
        assert_eq!(credentials.consumer_key, "file-ck");
        assert_eq!(credentials.period().unwrap(), Duration::from_secs(1800));
    }

    #[test]
    fn test_credentials_file_with_bad_period() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "ConsumerKey: ck\nConsumerSecret: cs\nAccessToken: at\nAccessSecret: as\nPeriod: soon"
        )
        .unwrap();

        assert!(matches!(
            Credentials::load(file.path()),
            Err(ConfigError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credentials = Credentials::from_lookup(lookup_from(&FULL_ENV));
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("cs"));
        assert!(!debug.contains("\"as\""));
    }

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, BotSettings::default());
        assert_eq!(settings.max_post_length, 280);
        assert_eq!(settings.variant, GeneratorVariant::Fresh);
        assert!(settings.generator.recency);
        assert_eq!(settings.publish_retries, 3);
    }

    #[test]
    fn test_plain_variant_with_override() {
        let settings = BotSettings::from_lookup(lookup_from(&[
            ("GENERATOR_VARIANT", "plain"),
            ("ADJECTIVE_CHANCE", "0.25"),
            ("VOCAB_PATH", "words.yaml"),
        ]))
        .unwrap();
        assert!(!settings.generator.recency);
        assert!((settings.generator.place_chance - 0.5).abs() < f64::EPSILON);
        assert!((settings.generator.adjective_chance - 0.25).abs() < f64::EPSILON);
        assert_eq!(settings.vocab_path, PathBuf::from("words.yaml"));
    }

    #[test]
    fn test_invalid_settings() {
        for pairs in [
            [("PLACE_CHANCE", "1.5")],
            [("PUBLISH_RETRIES", "many")],
            [("GENERATOR_VARIANT", "spicy")],
            [("MAX_POST_LENGTH", "0")],
        ] {
            assert!(matches!(
                BotSettings::from_lookup(lookup_from(&pairs)),
                Err(ConfigError::InvalidSetting { .. })
            ));
        }
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let settings = BotSettings {
            publish_retries: 2,
            retry_backoff_secs: 10,
            ..BotSettings::default()
        };
        let policy = settings.retry_policy();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.initial_backoff, Duration::from_secs(10));
    }
}
