//! serde_json-backed record serializer.

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Value};

use crate::{
    error::SerializationError,
    record::EventRecord,
    render::{Serializer, SerializerOptions},
};

/// Encodes records as JSON objects.
///
/// Recognized options (all other keys are ignored):
///
/// | Option         | Type              | Effect                                       |
/// |----------------|-------------------|----------------------------------------------|
/// | `sort_keys`    | bool              | sort object keys, recursively                |
/// | `ensure_ascii` | bool              | escape every non-ASCII character as `\uXXXX` |
/// | `indent`       | unsigned or null  | pretty-print with that many spaces           |
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

#[derive(Default)]
struct JsonOptions {
    sort_keys: bool,
    ensure_ascii: bool,
    indent: Option<usize>,
}

impl JsonOptions {
    fn parse(options: &SerializerOptions) -> Result<Self, SerializationError> {
        let mut parsed = Self::default();
        if let Some(value) = options.get("sort_keys") {
            parsed.sort_keys = flag("sort_keys", value)?;
        }
        if let Some(value) = options.get("ensure_ascii") {
            parsed.ensure_ascii = flag("ensure_ascii", value)?;
        }
        match options.get("indent") {
            None | Some(Value::Null) => {}
            Some(value) => {
                let width = value
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| SerializationError::InvalidOption {
                        name: "indent".to_string(),
                        reason: "expected a non-negative integer or null",
                    })?;
                parsed.indent = Some(width);
            }
        }
        Ok(parsed)
    }
}

fn flag(name: &str, value: &Value) -> Result<bool, SerializationError> {
    value
        .as_bool()
        .ok_or_else(|| SerializationError::InvalidOption {
            name: name.to_string(),
            reason: "expected a boolean",
        })
}

impl Serializer for JsonSerializer {
    fn serialize(
        &self,
        record: &EventRecord,
        options: &SerializerOptions,
    ) -> Result<String, SerializationError> {
        let options = JsonOptions::parse(options)?;

        let sorted;
        let record = if options.sort_keys {
            sorted = sort_map(record);
            &sorted
        } else {
            record
        };

        let text = match options.indent {
            None => serde_json::to_string(record)?,
            Some(width) => {
                let indent = vec![b' '; width];
                let mut buf = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(
                    &mut buf,
                    PrettyFormatter::with_indent(&indent),
                );
                record.serialize(&mut ser)?;
                String::from_utf8(buf).map_err(|err| SerializationError::Unrepresentable {
                    key: "<record>".to_string(),
                    reason: err.to_string(),
                })?
            }
        };

        Ok(if options.ensure_ascii {
            escape_non_ascii(&text)
        } else {
            text
        })
    }

    fn check_options(&self, options: &SerializerOptions) -> Result<(), SerializationError> {
        JsonOptions::parse(options).map(|_| ())
    }
}

fn sort_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), sort_value(value)))
        .collect()
}

fn sort_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sort_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        other => other.clone(),
    }
}

// Non-ASCII characters only ever appear inside JSON strings, so escaping
// them after encoding keeps the document valid.
fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut units = [0u16; 2];
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::JsonSerializer;
    use crate::{
        error::SerializationError,
        record::EventRecord,
        render::{Serializer, SerializerOptions},
    };
    use serde_json::{json, Value};

    fn object(value: Value) -> serde_json::Map<String, Value> {
        let Value::Object(map) = value else {
            panic!("expected an object");
        };
        map
    }

    fn record() -> EventRecord {
        object(json!({ "status": "wut", "event": "msg", "nested": { "b": 1, "a": 2 } }))
    }

    #[test]
    fn keeps_insertion_order_by_default() {
        let text = JsonSerializer
            .serialize(&record(), &SerializerOptions::new())
            .unwrap();
        assert_eq!(text, r#"{"status":"wut","event":"msg","nested":{"b":1,"a":2}}"#);
    }

    #[test]
    fn sort_keys_sorts_recursively() {
        let options = object(json!({ "sort_keys": true }));
        let text = JsonSerializer.serialize(&record(), &options).unwrap();
        assert_eq!(text, r#"{"event":"msg","nested":{"a":2,"b":1},"status":"wut"}"#);
    }

    #[test]
    fn ensure_ascii_escapes_non_ascii() {
        let options = object(json!({ "ensure_ascii": true }));
        let input = object(json!({ "user": "zoë", "mood": "🔒" }));
        let text = JsonSerializer.serialize(&input, &options).unwrap();
        assert_eq!(text, r#"{"user":"zo\u00eb","mood":"\ud83d\udd12"}"#);

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["user"], "zoë");
        assert_eq!(parsed["mood"], "🔒");
    }

    #[test]
    fn indent_pretty_prints() {
        let options = object(json!({ "indent": 2 }));
        let input = object(json!({ "a": 1 }));
        let text = JsonSerializer.serialize(&input, &options).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn unknown_options_are_ignored() {
        let options = object(json!({ "separators": [",", ":"], "default": "repr" }));
        assert!(JsonSerializer.check_options(&options).is_ok());
        assert!(JsonSerializer.serialize(&record(), &options).is_ok());
    }

    #[test]
    fn wrongly_typed_options_are_rejected() {
        let options = object(json!({ "sort_keys": "yes" }));
        let err = JsonSerializer.check_options(&options).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::InvalidOption { ref name, .. } if name == "sort_keys"
        ));

        let options = object(json!({ "indent": -1 }));
        assert!(JsonSerializer.serialize(&record(), &options).is_err());
    }
}
