//! Byte payload decoding.

use serde_json::Value;

use crate::{
    error::PipelineError,
    record::{EventMeta, EventRecord, BYTES_MARKER},
    stages::Processor,
};

/// Turns byte payloads logged through `Bytes` into text.
///
/// Invalid UTF-8 sequences become U+FFFD. Only top-level fields are decoded.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeDecoder;

impl UnicodeDecoder {
    fn decode(value: &Value) -> Option<String> {
        let Value::Object(tagged) = value else {
            return None;
        };
        if tagged.len() != 1 {
            return None;
        }
        let Some(Value::Array(items)) = tagged.get(BYTES_MARKER) else {
            return None;
        };
        let bytes = items
            .iter()
            .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect::<Option<Vec<u8>>>()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Processor for UnicodeDecoder {
    fn name(&self) -> &'static str {
        "unicode_decoder"
    }

    fn process(
        &self,
        _meta: &EventMeta<'_>,
        mut record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError> {
        for value in record.values_mut() {
            if let Some(text) = Self::decode(value) {
                *value = Value::String(text);
            }
        }
        Ok(Some(record))
    }
}
