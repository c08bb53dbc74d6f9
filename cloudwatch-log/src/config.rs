//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slog::Level;

use crate::{
    error::ConfigError,
    record::parse_level,
    render::{SerializerOptions, DEFAULT_CALLOUTS},
    stages::Thresholds,
};

/// Sources whose routine chatter is suppressed unless configured otherwise.
pub const DEFAULT_NOISY_LOG_SOURCES: [&str; 3] = ["aws_config", "aws_smithy_runtime", "hyper"];

/// Level that noisy sources are raised to.
pub const NOISY_SOURCE_LEVEL: Level = Level::Warning;

/// Options shaping the standard pipeline.
///
/// Every field has a default, so any subset can be deserialized:
///
/// ```
/// use cloudwatch_log::LoggingConfig;
///
/// let config: LoggingConfig =
///     serde_json::from_str(r#"{ "wordlist_to_censor": ["password"], "level": "debug" }"#).unwrap();
/// assert_eq!(config.callouts, ["status_code", "event"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Field names whose values are censored.
    #[serde(default)]
    pub wordlist_to_censor: Vec<String>,

    /// Field names called out in clear text; only the first two are used.
    #[serde(default = "default_callouts")]
    pub callouts: Vec<String>,

    /// Minimum severity to emit (e.g. "info", "debug", "warning")
    #[serde(default = "default_level")]
    pub level: String,

    /// Sources raised to `Warning` to silence their routine messages.
    #[serde(default = "default_noisy_log_sources")]
    pub noisy_log_sources: Vec<String>,

    /// Extra options forwarded verbatim to the serializer.
    #[serde(default = "default_serializer_options")]
    pub serializer_options: SerializerOptions,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            wordlist_to_censor: Vec::new(),
            callouts: default_callouts(),
            level: default_level(),
            noisy_log_sources: default_noisy_log_sources(),
            serializer_options: default_serializer_options(),
        }
    }
}

fn default_callouts() -> Vec<String> {
    DEFAULT_CALLOUTS.iter().map(ToString::to_string).collect()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_noisy_log_sources() -> Vec<String> {
    DEFAULT_NOISY_LOG_SOURCES
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_serializer_options() -> SerializerOptions {
    let mut options = SerializerOptions::new();
    options.insert("sort_keys".to_string(), Value::Bool(false));
    options
}

impl LoggingConfig {
    /// Sets the censored field names.
    #[must_use]
    pub fn with_wordlist<I, S>(mut self, wordlist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wordlist_to_censor = wordlist.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the callout field names.
    #[must_use]
    pub fn with_callouts<I, S>(mut self, callouts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.callouts = callouts.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the minimum level by name.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Replaces the noisy source list.
    #[must_use]
    pub fn with_noisy_log_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.noisy_log_sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Adds or replaces one serializer option.
    #[must_use]
    pub fn with_serializer_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.serializer_options.insert(key.into(), value.into());
        self
    }

    /// Parsed minimum level.
    pub fn min_level(&self) -> Result<Level, ConfigError> {
        parse_level(&self.level).ok_or_else(|| ConfigError::InvalidLevel(self.level.clone()))
    }

    /// Thresholds implied by `level` and `noisy_log_sources`.
    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        let mut thresholds = Thresholds::new(self.min_level()?);
        for source in &self.noisy_log_sources {
            if source.trim().is_empty() {
                return Err(ConfigError::EmptySourceName);
            }
            thresholds = thresholds.with_source(source.as_str(), NOISY_SOURCE_LEVEL);
        }
        Ok(thresholds)
    }
}
