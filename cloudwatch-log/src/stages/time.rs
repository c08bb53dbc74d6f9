//! Timestamps.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde_json::Value;

use crate::{
    error::PipelineError,
    record::{EventMeta, EventRecord},
    stages::Processor,
};

/// Adds an ISO-8601 timestamp to every record.
#[derive(Clone, Copy, Debug)]
pub struct TimeStamper {
    key: &'static str,
    utc: bool,
    clock: fn() -> DateTime<Utc>,
}

impl Default for TimeStamper {
    fn default() -> Self {
        Self::iso()
    }
}

impl TimeStamper {
    /// UTC timestamps under `timestamp`, e.g. `2024-01-15T10:30:00.123456Z`.
    #[must_use]
    pub fn iso() -> Self {
        Self {
            key: "timestamp",
            utc: true,
            clock: Utc::now,
        }
    }

    /// Stores the timestamp under `key` instead.
    #[must_use]
    pub fn with_key(mut self, key: &'static str) -> Self {
        self.key = key;
        self
    }

    /// Renders in the local timezone with its UTC offset.
    #[must_use]
    pub fn local(mut self) -> Self {
        self.utc = false;
        self
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn stamp(&self) -> String {
        let now = (self.clock)();
        if self.utc {
            now.to_rfc3339_opts(SecondsFormat::Micros, true)
        } else {
            now.with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Micros, false)
        }
    }
}

impl Processor for TimeStamper {
    fn name(&self) -> &'static str {
        "time_stamper"
    }

    fn process(
        &self,
        _meta: &EventMeta<'_>,
        mut record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError> {
        record.insert(self.key.to_string(), Value::String(self.stamp()));
        Ok(Some(record))
    }
}
