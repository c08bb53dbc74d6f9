//! The event record and the glue that builds it from an slog call.
//!
//! A record is an insertion-ordered JSON object. The drain builds one per log
//! call from the logger context and the call-site key/values, runs it through
//! the pipeline, and throws it away.

use std::{error::Error as StdError, fmt};

use serde_json::{Map, Number, Value};
use slog::{Key, Level, OwnedKVList, Record, Serializer, KV};

use crate::error::SerializationError;

mod finite;

/// One log call's structured payload.
pub type EventRecord = Map<String, Value>;

/// Key holding the formatted log message.
pub const EVENT_KEY: &str = "event";

/// Marker key used by [`Bytes`] to carry raw byte payloads until they are decoded.
pub const BYTES_MARKER: &str = "$bytes";

/// Per-call metadata supplied by the logging subsystem rather than the record.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventMeta<'a> {
    /// Severity of the call, if known.
    pub level: Option<Level>,
    /// Name given to the logger when it was acquired.
    pub logger_name: Option<&'a str>,
    /// Module path of the call site.
    pub module: Option<&'a str>,
}

impl<'a> EventMeta<'a> {
    /// Metadata carrying only a level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            level: Some(level),
            ..Self::default()
        }
    }

    /// Sets the logger name.
    #[must_use]
    pub fn with_logger_name(mut self, name: &'a str) -> Self {
        self.logger_name = Some(name);
        self
    }

    /// Sets the call-site module path.
    #[must_use]
    pub fn with_module(mut self, module: &'a str) -> Self {
        self.module = Some(module);
        self
    }

    /// Name used for threshold lookups: the logger name, else the module path.
    pub fn target(&self) -> &'a str {
        self.logger_name.or(self.module).unwrap_or("")
    }
}

/// Lower-case method name for a level, e.g. `"warning"`.
pub fn level_method_name(level: Level) -> &'static str {
    match level {
        Level::Critical => "critical",
        Level::Error => "error",
        Level::Warning => "warning",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

/// Parses a severity name. Long and short slog spellings are accepted, case-insensitively.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "critical" | "crit" => Some(Level::Critical),
        "error" | "erro" => Some(Level::Error),
        "warning" | "warn" => Some(Level::Warning),
        "info" | "informational" => Some(Level::Info),
        "debug" | "debg" => Some(Level::Debug),
        "trace" | "trce" => Some(Level::Trace),
        _ => None,
    }
}

/// Builds an [`EventRecord`] from an slog record and its logger context.
///
/// slog emits the most specific pairs first (call site, then child loggers,
/// then the root). They are replayed in reverse so the root context comes
/// first in the record and more specific values overwrite it in place. The
/// formatted message is stored last under [`EVENT_KEY`].
pub(crate) fn collect(
    record: &Record<'_>,
    values: &OwnedKVList,
) -> Result<EventRecord, SerializationError> {
    let mut collector = Collector::default();
    record
        .kv()
        .serialize(record, &mut collector)
        .map_err(|err| collector.failure("<call site>", &err))?;
    values
        .serialize(record, &mut collector)
        .map_err(|err| collector.failure("<logger context>", &err))?;
    if let Some(err) = collector.error {
        return Err(err);
    }

    let mut event = EventRecord::new();
    for (key, value) in collector.pairs.into_iter().rev() {
        event.insert(key, value);
    }
    event.insert(EVENT_KEY.to_string(), Value::String(record.msg().to_string()));
    Ok(event)
}

#[derive(Default)]
struct Collector {
    pairs: Vec<(String, Value)>,
    error: Option<SerializationError>,
}

impl Collector {
    fn push(&mut self, key: Key, value: Value) -> slog::Result {
        self.pairs.push((key.to_string(), value));
        Ok(())
    }

    fn failure(&mut self, key: &str, err: &slog::Error) -> SerializationError {
        self.error.take().unwrap_or_else(|| SerializationError::Unrepresentable {
            key: key.to_string(),
            reason: format!("{err:?}"),
        })
    }

    fn record_error(&mut self, err: SerializationError) -> slog::Result {
        // The first failure is the one worth reporting.
        if self.error.is_none() {
            self.error = Some(err);
        }
        Ok(())
    }
}

impl Serializer for Collector {
    fn emit_arguments(&mut self, key: Key, val: &fmt::Arguments<'_>) -> slog::Result {
        self.push(key, Value::String(val.to_string()))
    }

    fn emit_str(&mut self, key: Key, val: &str) -> slog::Result {
        self.push(key, Value::String(val.to_string()))
    }

    fn emit_bool(&mut self, key: Key, val: bool) -> slog::Result {
        self.push(key, Value::Bool(val))
    }

    fn emit_char(&mut self, key: Key, val: char) -> slog::Result {
        self.push(key, Value::String(val.to_string()))
    }

    fn emit_usize(&mut self, key: Key, val: usize) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_isize(&mut self, key: Key, val: isize) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_u8(&mut self, key: Key, val: u8) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_i8(&mut self, key: Key, val: i8) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_u16(&mut self, key: Key, val: u16) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_i16(&mut self, key: Key, val: i16) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_u32(&mut self, key: Key, val: u32) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_i32(&mut self, key: Key, val: i32) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_u64(&mut self, key: Key, val: u64) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_i64(&mut self, key: Key, val: i64) -> slog::Result {
        self.push(key, Value::from(val))
    }

    fn emit_f32(&mut self, key: Key, val: f32) -> slog::Result {
        self.emit_f64(key, f64::from(val))
    }

    fn emit_f64(&mut self, key: Key, val: f64) -> slog::Result {
        match Number::from_f64(val) {
            Some(number) => self.push(key, Value::Number(number)),
            None => self.record_error(SerializationError::Unrepresentable {
                key: key.to_string(),
                reason: format!("non-finite number {val}"),
            }),
        }
    }

    fn emit_unit(&mut self, key: Key) -> slog::Result {
        self.push(key, Value::Null)
    }

    fn emit_none(&mut self, key: Key) -> slog::Result {
        self.push(key, Value::Null)
    }

    fn emit_serde(&mut self, key: Key, val: &dyn slog::SerdeValue) -> slog::Result {
        if let Err(err) = finite::check(val.as_serde()) {
            return self.record_error(SerializationError::Unrepresentable {
                key: key.to_string(),
                reason: err.to_string(),
            });
        }
        match serde_json::to_value(val.as_serde()) {
            Ok(value) => self.push(key, value),
            Err(err) => self.record_error(err.into()),
        }
    }
}

/// Logs a raw byte buffer.
///
/// The bytes travel through the pipeline tagged with [`BYTES_MARKER`] until
/// `UnicodeDecoder` turns them into text.
///
/// ```ignore
/// info!(logger, "received"; "payload" => Bytes(&frame));
/// ```
pub struct Bytes<'a>(pub &'a [u8]);

impl slog::Value for Bytes<'_> {
    fn serialize(
        &self,
        record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> slog::Result {
        let mut tagged = Map::new();
        tagged.insert(BYTES_MARKER.to_string(), Value::from(self.0.to_vec()));
        let nested = slog::Serde(Value::Object(tagged));
        slog::Value::serialize(&nested, record, key, serializer)
    }
}

/// Logs an error together with its `source()` chain, one cause per line.
///
/// Meant for the `exc_info` key, which `ExceptionFormatter` moves to `exception`.
pub struct ErrorChain<'a>(pub &'a (dyn StdError + 'static));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, "\nCaused by: {cause}")?;
            source = cause.source();
        }
        Ok(())
    }
}

impl slog::Value for ErrorChain<'_> {
    fn serialize(
        &self,
        _record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> slog::Result {
        serializer.emit_str(key, &self.to_string())
    }
}
