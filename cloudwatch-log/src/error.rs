//! Error types for pipeline construction and per-event processing.
//!
//! Nothing in this crate swallows an error raised while processing an event.
//! Whether a failed log line is dropped or fatal is decided by the slog drain
//! wrapper the caller picks (`ignore_res`, `fuse`, ...).

use std::io;

/// A record could not be turned into text by the configured serializer.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// The JSON encoder rejected the value.
    #[error("failed to serialize event record: {0}")]
    Json(#[from] serde_json::Error),
    /// A serializer option the serializer understands carries a value it cannot use.
    #[error("invalid serializer option `{name}`: {reason}")]
    InvalidOption {
        /// Option key as passed by the caller.
        name: String,
        /// What the serializer expected instead.
        reason: &'static str,
    },
    /// A field value has no representation in the target format.
    #[error("field `{key}` cannot be represented: {reason}")]
    Unrepresentable {
        /// Offending field name.
        key: String,
        /// Serializer-specific explanation.
        reason: String,
    },
}

/// Invalid options detected while assembling a pipeline.
///
/// These are reported by `PipelineBuilder::build` and `configure`, never
/// deferred to the first log call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The minimum level is not a known severity name.
    #[error("unknown log level `{0}`")]
    InvalidLevel(String),
    /// A noisy log source was given as an empty string.
    #[error("noisy log source names must not be empty")]
    EmptySourceName,
    /// The serializer rejected the configured options.
    #[error("serializer rejected its options: {0}")]
    Serializer(#[source] SerializationError),
}

/// A failure while running one event through the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Rendering or collecting the record failed.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    /// The output sink could not be written.
    #[error("failed to write log line: {0}")]
    Io(#[from] io::Error),
    /// A custom processor gave up on the event.
    #[error("processor `{stage}` failed: {message}")]
    Stage {
        /// Name reported by the failing processor.
        stage: &'static str,
        /// Human-readable failure description.
        message: String,
    },
}
