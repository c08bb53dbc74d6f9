//! Field censoring.
//!
//! The censor works on field names, not on values: a field whose key is in
//! the wordlist has its whole value replaced, whatever its type. It runs
//! before rendering, so censored values never reach the output sink.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::PipelineError,
    record::{EventMeta, EventRecord},
    stages::Processor,
};

/// Placeholder written over censored values.
pub const CENSORED_PLACEHOLDER: &str = "*CENSORED*";

/// Replaces the values of configured field names with [`CENSORED_PLACEHOLDER`].
///
/// Key comparison is exact and case-sensitive. With an empty wordlist the
/// censor is a no-op.
///
/// The wordlist is the censor's whole state, so it serializes as
/// `{"wordlist": [...]}` and can be restored from the same shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Censor {
    wordlist: BTreeSet<String>,
}

impl Censor {
    /// Builds a censor for the given field names.
    pub fn new<I, S>(wordlist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            wordlist: wordlist.into_iter().map(Into::into).collect(),
        }
    }

    /// A censor that leaves every record untouched.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns `true` when no field would ever be censored.
    pub fn is_disabled(&self) -> bool {
        self.wordlist.is_empty()
    }

    /// Returns `true` if values under `key` get censored.
    pub fn censors(&self, key: &str) -> bool {
        self.wordlist.contains(key)
    }

    /// Censors `record` in place and hands it back.
    #[must_use]
    pub fn apply(&self, mut record: EventRecord) -> EventRecord {
        if self.is_disabled() {
            return record;
        }
        for (key, value) in &mut record {
            if self.censors(key) {
                *value = Value::String(CENSORED_PLACEHOLDER.to_string());
            }
        }
        record
    }
}

impl Processor for Censor {
    fn name(&self) -> &'static str {
        "censor"
    }

    fn process(
        &self,
        _meta: &EventMeta<'_>,
        record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError> {
        Ok(Some(self.apply(record)))
    }
}
