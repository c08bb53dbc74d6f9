//! Positional-argument substitution into the event message.

use serde_json::{Map, Value};

use crate::{
    error::PipelineError,
    record::{EventMeta, EventRecord, EVENT_KEY},
    stages::{display_text, Processor},
};

/// Field carrying arguments for the `event` message template.
pub const POSITIONAL_ARGS_KEY: &str = "positional_args";

/// Fills placeholders in `event` from [`POSITIONAL_ARGS_KEY`].
///
/// An array fills `{}` placeholders in order. A single non-empty object
/// (bare, or as the only array element) fills named `{name}` placeholders.
/// Placeholders without a matching argument are left as they are.
#[derive(Clone, Copy, Debug)]
pub struct PositionalArgumentsFormatter {
    remove_positional_args: bool,
}

impl Default for PositionalArgumentsFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PositionalArgumentsFormatter {
    /// `remove_positional_args` controls whether the argument field is dropped
    /// after formatting.
    #[must_use]
    pub fn new(remove_positional_args: bool) -> Self {
        Self {
            remove_positional_args,
        }
    }
}

impl Processor for PositionalArgumentsFormatter {
    fn name(&self) -> &'static str {
        "positional_arguments_formatter"
    }

    fn process(
        &self,
        _meta: &EventMeta<'_>,
        mut record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError> {
        let formatted = match (record.get(EVENT_KEY), record.get(POSITIONAL_ARGS_KEY)) {
            (Some(Value::String(template)), Some(args)) => format_template(template, args),
            _ => None,
        };
        if let Some(message) = formatted {
            record.insert(EVENT_KEY.to_string(), Value::String(message));
        }
        if self.remove_positional_args {
            record.remove(POSITIONAL_ARGS_KEY);
        }
        Ok(Some(record))
    }
}

fn format_template(template: &str, args: &Value) -> Option<String> {
    match args {
        Value::Array(items) => match items.as_slice() {
            [] => None,
            [Value::Object(named)] if !named.is_empty() => Some(fill_named(template, named)),
            items => Some(fill_positional(template, items)),
        },
        Value::Object(named) if !named.is_empty() => Some(fill_named(template, named)),
        _ => None,
    }
}

fn fill_positional(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(at) = rest.find("{}") {
        out.push_str(&rest[..at]);
        match args.next() {
            Some(arg) => out.push_str(&display_text(arg)),
            None => out.push_str("{}"),
        }
        rest = &rest[at + 2..];
    }
    out.push_str(rest);
    out
}

fn fill_named(template: &str, args: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match args.get(name) {
                    Some(arg) => out.push_str(&display_text(arg)),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
