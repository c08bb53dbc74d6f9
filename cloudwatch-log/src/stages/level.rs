//! Severity thresholds and the `level` field.

use std::{collections::BTreeMap, sync::Arc};

use serde_json::Value;
use slog::Level;

use crate::{
    error::PipelineError,
    record::{level_method_name, EventMeta, EventRecord},
    stages::Processor,
};

/// Minimum severities: one default plus per-source overrides.
///
/// Sources match hierarchically. An override for `hyper` also covers
/// `hyper.client` and `hyper::proto::h1`; the longest matching source wins.
#[derive(Clone, Debug)]
pub struct Thresholds {
    default: Level,
    overrides: BTreeMap<String, Level>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl Thresholds {
    /// Thresholds with `default` as the minimum level for every source.
    #[must_use]
    pub fn new(default: Level) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    /// Sets the minimum level for `source` and everything below it.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>, level: Level) -> Self {
        self.overrides.insert(source.into(), level);
        self
    }

    /// Default minimum level.
    pub fn default_level(&self) -> Level {
        self.default
    }

    /// Minimum level that applies to `target`.
    pub fn level_for(&self, target: &str) -> Level {
        self.overrides
            .iter()
            .filter(|(source, _)| covers(source, target))
            .max_by_key(|(source, _)| source.len())
            .map_or(self.default, |(_, level)| *level)
    }

    /// Returns `true` if an event at `level` from `target` should be emitted.
    pub fn enabled(&self, target: &str, level: Level) -> bool {
        level.is_at_least(self.level_for(target))
    }
}

fn covers(source: &str, target: &str) -> bool {
    match target.strip_prefix(source) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with("::"),
        None => false,
    }
}

/// Drops events below the threshold for their target.
///
/// Events that carry no level always pass.
#[derive(Clone, Debug)]
pub struct FilterByLevel {
    thresholds: Arc<Thresholds>,
}

impl FilterByLevel {
    /// Filters against shared thresholds.
    #[must_use]
    pub fn new(thresholds: Arc<Thresholds>) -> Self {
        Self { thresholds }
    }
}

impl Processor for FilterByLevel {
    fn name(&self) -> &'static str {
        "filter_by_level"
    }

    fn process(
        &self,
        meta: &EventMeta<'_>,
        record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError> {
        match meta.level {
            Some(level) if !self.thresholds.enabled(meta.target(), level) => Ok(None),
            _ => Ok(Some(record)),
        }
    }
}

/// Adds `level` with the lower-case method name of the call, e.g. `"info"`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddLogLevel;

impl Processor for AddLogLevel {
    fn name(&self) -> &'static str {
        "add_log_level"
    }

    fn process(
        &self,
        meta: &EventMeta<'_>,
        mut record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError> {
        if let Some(level) = meta.level {
            record.insert(
                "level".to_string(),
                Value::String(level_method_name(level).to_string()),
            );
        }
        Ok(Some(record))
    }
}
