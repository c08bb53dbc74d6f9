//! CloudWatch-friendly line rendering.
//!
//! A rendered line reads:
//!
//! ```text
//! [INFO] "200" "request served" {"status_code":200,"event":"request served",...}
//! ```
//!
//! The bracketed level makes lines easy to filter, the callouts make them easy
//! to scan, and the JSON body keeps every field machine-readable. Callout
//! fields stay in the body.

use std::fmt;

use serde_json::Value;

use crate::{
    error::SerializationError,
    record::{level_method_name, EventMeta, EventRecord},
    render::{JsonSerializer, Renderer, Serializer, SerializerOptions},
    stages::display_text,
};

/// Callout names used when none are configured explicitly.
pub const DEFAULT_CALLOUTS: [&str; 2] = ["status_code", "event"];

/// Field names whose values are repeated in clear text at the front of a line.
///
/// Only the first two names are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Callouts {
    names: Vec<String>,
}

impl Callouts {
    /// Keeps the first two of `names`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().take(2).map(Into::into).collect(),
        }
    }

    /// No callouts: lines carry only the level tag and the body.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The retained names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Renders `[<LEVEL>] <callout-1> <callout-2> <json-body>`.
///
/// Callouts whose key is missing from the record are skipped without a
/// placeholder. Without a level in the metadata the tag is `[LOG]`.
pub struct CloudWatchRenderer {
    callouts: Callouts,
    serializer: Box<dyn Serializer>,
    options: SerializerOptions,
}

impl fmt::Debug for CloudWatchRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudWatchRenderer")
            .field("callouts", &self.callouts)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for CloudWatchRenderer {
    fn default() -> Self {
        Self::new(Callouts::new(DEFAULT_CALLOUTS))
    }
}

impl CloudWatchRenderer {
    /// A renderer using [`JsonSerializer`] with no options.
    #[must_use]
    pub fn new(callouts: Callouts) -> Self {
        Self {
            callouts,
            serializer: Box::new(JsonSerializer),
            options: SerializerOptions::new(),
        }
    }

    /// Replaces the body serializer.
    #[must_use]
    pub fn with_serializer(self, serializer: impl Serializer + 'static) -> Self {
        self.with_boxed_serializer(Box::new(serializer))
    }

    pub(crate) fn with_boxed_serializer(mut self, serializer: Box<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Options forwarded verbatim to the serializer on every call.
    #[must_use]
    pub fn with_options(mut self, options: SerializerOptions) -> Self {
        self.options = options;
        self
    }

    /// Lets the serializer reject its options before any line is rendered.
    pub fn check_options(&self) -> Result<(), SerializationError> {
        self.serializer.check_options(&self.options)
    }

    fn level_tag(meta: &EventMeta<'_>) -> String {
        let name = meta.level.map_or("log", level_method_name);
        format!("[{}]", name.to_ascii_uppercase())
    }

    fn callout(value: &Value) -> Result<String, SerializationError> {
        Ok(serde_json::to_string(&display_text(value))?)
    }
}

impl Renderer for CloudWatchRenderer {
    fn render(
        &self,
        meta: &EventMeta<'_>,
        record: &EventRecord,
    ) -> Result<String, SerializationError> {
        let mut line = Self::level_tag(meta);
        for name in self.callouts.names() {
            if let Some(value) = record.get(name) {
                line.push(' ');
                line.push_str(&Self::callout(value)?);
            }
        }
        line.push(' ');
        line.push_str(&self.serializer.serialize(record, &self.options)?);
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::{Callouts, CloudWatchRenderer};
    use crate::{
        error::SerializationError,
        record::{EventMeta, EventRecord},
        render::{Renderer, SerializerOptions},
    };
    use serde_json::{json, Value};
    use slog::Level;

    fn record(value: Value) -> EventRecord {
        let Value::Object(map) = value else {
            panic!("expected an object");
        };
        map
    }

    #[test]
    fn only_first_two_callouts_are_kept() {
        let callouts = Callouts::new(["a", "b", "c"]);
        assert_eq!(callouts.names().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn renders_tag_callouts_and_body() {
        let renderer = CloudWatchRenderer::new(Callouts::new(["status", "event"]));
        let line = renderer
            .render(
                &EventMeta::new(Level::Info),
                &record(json!({ "status": "wut", "event": "msg", "peer": "127.0.0.1" })),
            )
            .unwrap();
        assert_eq!(
            line,
            r#"[INFO] "wut" "msg" {"status":"wut","event":"msg","peer":"127.0.0.1"}"#
        );
    }

    #[test]
    fn missing_callouts_leave_no_gap() {
        let renderer = CloudWatchRenderer::new(Callouts::new(["status", "event"]));
        let line = renderer
            .render(&EventMeta::new(Level::Warning), &record(json!({ "event": "msg" })))
            .unwrap();
        assert_eq!(line, r#"[WARNING] "msg" {"event":"msg"}"#);
    }

    #[test]
    fn non_text_callouts_are_quoted_json() {
        let renderer = CloudWatchRenderer::new(Callouts::new(["status_code", "event"]));
        let line = renderer
            .render(
                &EventMeta::new(Level::Error),
                &record(json!({ "status_code": 503, "event": "say \"hi\"" })),
            )
            .unwrap();
        assert_eq!(
            line,
            r#"[ERROR] "503" "say \"hi\"" {"status_code":503,"event":"say \"hi\""}"#
        );
    }

    #[test]
    fn missing_level_uses_generic_tag() {
        let renderer = CloudWatchRenderer::new(Callouts::none());
        let line = renderer
            .render(&EventMeta::default(), &record(json!({ "event": "msg" })))
            .unwrap();
        assert_eq!(line, r#"[LOG] {"event":"msg"}"#);
    }

    #[test]
    fn options_reach_the_serializer() {
        let Value::Object(options) = json!({ "sort_keys": true }) else {
            unreachable!()
        };
        let renderer = CloudWatchRenderer::new(Callouts::none()).with_options(options);
        let line = renderer
            .render(&EventMeta::new(Level::Info), &record(json!({ "z": 1, "a": 2 })))
            .unwrap();
        assert_eq!(line, r#"[INFO] {"a":2,"z":1}"#);
    }

    #[test]
    fn serializer_failures_propagate() {
        let renderer = CloudWatchRenderer::new(Callouts::none()).with_serializer(
            |_: &EventRecord, _: &SerializerOptions| -> Result<String, SerializationError> {
                Err(SerializationError::Unrepresentable {
                    key: "blob".to_string(),
                    reason: "unsupported".to_string(),
                })
            },
        );
        let err = renderer
            .render(&EventMeta::new(Level::Info), &record(json!({ "blob": 1 })))
            .unwrap_err();
        assert!(matches!(err, SerializationError::Unrepresentable { .. }));
    }
}
