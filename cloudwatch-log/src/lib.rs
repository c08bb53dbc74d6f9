//! CloudWatch-friendly JSON log lines for `slog`, with field censoring.
//!
//! Every log call becomes an insertion-ordered record, runs through a fixed
//! list of stages and is rendered as:
//!
//! ```text
//! [INFO] "200" "request served" {"status_code":200,"event":"request served","level":"info","timestamp":"..."}
//! ```
//!
//! The standard stages, in order:
//!
//! 1. level filtering, with noisy sources raised to `Warning`
//! 2. the `level` field
//! 3. positional-argument formatting of `event`
//! 4. an ISO-8601 `timestamp`
//! 5. `stack_info` rendering
//! 6. `exc_info` rendering
//! 7. byte payload decoding
//! 8. censoring of configured field names
//! 9. thread-local context merging
//! 10. rendering
//!
//! What this crate does:
//! - builds and installs the pipeline ([`configure`], [`PipelineBuilder`])
//! - hands out slog loggers bound to it ([`get_logger`], [`Pipeline::logger`])
//!
//! What it does not do:
//! - ship, store or rotate logs; lines go to stdout or a caller-supplied writer
//!
//! Process-wide entry points live behind the `global` feature (on by default).
//! Tests and libraries can build an isolated [`Pipeline`] instead.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

// Module declarations
mod censor;
mod config;
mod error;
#[cfg(feature = "global")]
mod global;
mod pipeline;
mod record;
mod render;
mod stages;

// Re-exports
pub use censor::{Censor, CENSORED_PLACEHOLDER};
pub use config::{LoggingConfig, DEFAULT_NOISY_LOG_SOURCES, NOISY_SOURCE_LEVEL};
pub use error::{ConfigError, PipelineError, SerializationError};
#[cfg(feature = "global")]
pub use global::{configure, current, get_logger, install, setup_and_get_logger};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineDrain};
pub use record::{
    level_method_name, parse_level, Bytes, ErrorChain, EventMeta, EventRecord, BYTES_MARKER,
    EVENT_KEY,
};
pub use render::{
    Callouts, CloudWatchRenderer, JsonSerializer, Renderer, Serializer, SerializerOptions,
    DEFAULT_CALLOUTS,
};
pub use stages::{
    bind_threadlocal, bound_threadlocal, clear_threadlocal, unbind_threadlocal, AddLogLevel,
    ContextGuard, ExceptionFormatter, FilterByLevel, MergeThreadLocal,
    PositionalArgumentsFormatter, Processor, StackInfoRenderer, Thresholds, TimeStamper,
    UnicodeDecoder, POSITIONAL_ARGS_KEY,
};
