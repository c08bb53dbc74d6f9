//! Turning a finished record into one line of text.
//!
//! - **`json`**: the default [`Serializer`], backed by serde_json
//! - **`cloudwatch`**: the terminal [`Renderer`] producing CloudWatch-friendly lines

use std::panic::RefUnwindSafe;

use serde_json::{Map, Value};

use crate::{
    error::SerializationError,
    record::{EventMeta, EventRecord},
};

mod cloudwatch;
mod json;

pub use cloudwatch::{Callouts, CloudWatchRenderer, DEFAULT_CALLOUTS};
pub use json::JsonSerializer;

/// Extra serializer options, forwarded verbatim.
///
/// Their meaning is up to the serializer. Keys a serializer does not know are ignored.
pub type SerializerOptions = Map<String, Value>;

/// Encodes a whole record as text.
///
/// Any `Fn(&EventRecord, &SerializerOptions) -> Result<String, SerializationError>`
/// is a serializer, so an alternative encoder can be plugged in as a closure.
pub trait Serializer: Send + Sync + RefUnwindSafe {
    /// Encodes `record` using `options`.
    fn serialize(
        &self,
        record: &EventRecord,
        options: &SerializerOptions,
    ) -> Result<String, SerializationError>;

    /// Rejects options up front, at configuration time. Accepts everything by default.
    fn check_options(&self, _options: &SerializerOptions) -> Result<(), SerializationError> {
        Ok(())
    }
}

impl<F> Serializer for F
where
    F: Fn(&EventRecord, &SerializerOptions) -> Result<String, SerializationError>
        + Send
        + Sync
        + RefUnwindSafe,
{
    fn serialize(
        &self,
        record: &EventRecord,
        options: &SerializerOptions,
    ) -> Result<String, SerializationError> {
        self(record, options)
    }
}

/// The terminal stage: produces the line handed to the output sink.
pub trait Renderer: Send + Sync + RefUnwindSafe {
    /// Renders `record` to a single line without a trailing newline.
    fn render(
        &self,
        meta: &EventMeta<'_>,
        record: &EventRecord,
    ) -> Result<String, SerializationError>;
}
