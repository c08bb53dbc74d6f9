//! Stack and error rendering.

use std::backtrace::Backtrace;

use serde_json::Value;

use crate::{
    error::PipelineError,
    record::{EventMeta, EventRecord},
    stages::{is_set, Processor},
};

/// Replaces a set `stack_info` field with a captured backtrace under `stack`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StackInfoRenderer;

impl Processor for StackInfoRenderer {
    fn name(&self) -> &'static str {
        "stack_info_renderer"
    }

    fn process(
        &self,
        _meta: &EventMeta<'_>,
        mut record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError> {
        if let Some(flag) = record.remove("stack_info") {
            if is_set(Some(&flag)) {
                let stack = Backtrace::force_capture().to_string();
                record.insert("stack".to_string(), Value::String(stack));
            }
        }
        Ok(Some(record))
    }
}

/// Moves `exc_info` to a rendered `exception` field.
///
/// Strings (as produced by `ErrorChain`) are moved as-is. `true`, `false` and
/// `null` are dropped since there is no ambient error to render. Other values
/// are stored as their JSON text.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExceptionFormatter;

impl Processor for ExceptionFormatter {
    fn name(&self) -> &'static str {
        "format_exc_info"
    }

    fn process(
        &self,
        _meta: &EventMeta<'_>,
        mut record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError> {
        let rendered = match record.remove("exc_info") {
            None | Some(Value::Null | Value::Bool(_)) => None,
            Some(Value::String(text)) if text.is_empty() => None,
            Some(Value::String(text)) => Some(text),
            Some(other) => Some(other.to_string()),
        };
        if let Some(exception) = rendered {
            record.insert("exception".to_string(), Value::String(exception));
        }
        Ok(Some(record))
    }
}
