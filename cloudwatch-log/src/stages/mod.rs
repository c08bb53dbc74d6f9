//! Processing stages that run before rendering.
//!
//! Each stage receives the record produced by the previous one and either
//! returns it (possibly modified) or drops the event. The pipeline order is
//! fixed at construction; later stages rely on fields added by earlier ones.
//!
//! - **`level`**: threshold filtering and the `level` field
//! - **`format`**: positional-argument substitution into `event`
//! - **`time`**: ISO-8601 timestamps
//! - **`exception`**: stack and error rendering
//! - **`text`**: byte payload decoding
//! - **`context`**: thread-local context merging

use std::panic::RefUnwindSafe;

use serde_json::Value;

use crate::{
    error::PipelineError,
    record::{EventMeta, EventRecord},
};

mod context;
mod exception;
mod format;
mod level;
mod text;
mod time;

pub use context::{
    bind_threadlocal, bound_threadlocal, clear_threadlocal, unbind_threadlocal, ContextGuard,
    MergeThreadLocal,
};
pub use exception::{ExceptionFormatter, StackInfoRenderer};
pub use format::{PositionalArgumentsFormatter, POSITIONAL_ARGS_KEY};
pub use level::{AddLogLevel, FilterByLevel, Thresholds};
pub use text::UnicodeDecoder;
pub use time::TimeStamper;

/// A single transformation step over an event record.
///
/// Returning `Ok(None)` drops the event: no later stage runs and nothing is
/// written. Errors propagate to the slog drain unchanged.
pub trait Processor: Send + Sync + RefUnwindSafe {
    /// Short name used in error reports.
    fn name(&self) -> &'static str;

    /// Transforms `record`, or drops it by returning `Ok(None)`.
    fn process(
        &self,
        meta: &EventMeta<'_>,
        record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError>;
}

/// `false`, `null` and absent fields count as unset; anything else is set.
pub(crate) fn is_set(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null | Value::Bool(false)))
}

/// Text of a value as it should appear inside a message: strings bare,
/// everything else as compact JSON.
pub(crate) fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
