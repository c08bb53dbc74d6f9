//! Tests for the process-wide entry points.
//!
//! Every test here replaces the installed pipeline, so they run serially.

#![cfg(feature = "global")]

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use cloudwatch_log::{
    configure, current, get_logger, install, setup_and_get_logger, ConfigError, LoggingConfig,
    Pipeline, PipelineBuilder,
};
use serial_test::serial;
use slog::{info, o, warn};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8(bytes.clone())
            .unwrap()
            .lines()
            .map(ToString::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn configure_into(config: LoggingConfig) -> SharedBuffer {
    let buffer = SharedBuffer::default();
    configure(PipelineBuilder::new(config).writer(buffer.clone())).unwrap();
    buffer
}

#[test]
#[serial]
fn test_noisy_source_only_logs_warnings() {
    let buffer = configure_into(LoggingConfig::default().with_noisy_log_sources(["boto"]));
    let logger = get_logger(Some("boto"), o!());

    info!(logger, "retrying");
    warn!(logger, "throttled");

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].starts_with(r#"[WARNING] "throttled" {"#), "{}", lines[0]);
}

#[test]
#[serial]
fn test_children_of_noisy_sources_are_suppressed() {
    let buffer = configure_into(LoggingConfig::default().with_noisy_log_sources(["boto"]));

    info!(get_logger(Some("boto.s3"), o!()), "listing");
    info!(get_logger(Some("botocore"), o!()), "unrelated");

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].starts_with(r#"[INFO] "unrelated""#));
}

#[test]
#[serial]
fn test_loggers_follow_reconfiguration() {
    let first = configure_into(LoggingConfig::default());
    let logger = get_logger(Some("app"), o!("service" => "billing"));
    info!(logger, "before");

    let second = configure_into(LoggingConfig::default().with_wordlist(["service"]));
    info!(logger, "after");

    assert_eq!(first.lines().len(), 1);
    let lines = second.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""service":"*CENSORED*""#), "{}", lines[0]);
}

#[test]
#[serial]
fn test_invalid_configuration_keeps_the_installed_pipeline() {
    let buffer = configure_into(LoggingConfig::default());
    let before = current();

    let result = configure(LoggingConfig::default().with_level("loud"));
    assert!(matches!(result, Err(ConfigError::InvalidLevel(_))));

    let result = configure(LoggingConfig::default().with_serializer_option("sort_keys", "yes"));
    assert!(matches!(result, Err(ConfigError::Serializer(_))));

    assert!(Arc::ptr_eq(&before, &current()));
    info!(get_logger(None, o!()), "still here");
    assert_eq!(buffer.lines().len(), 1);
}

#[test]
#[serial]
fn test_setup_and_get_logger() {
    let buffer = SharedBuffer::default();
    let logger = setup_and_get_logger(
        PipelineBuilder::new(LoggingConfig::default().with_wordlist(["password"]))
            .writer(buffer.clone()),
    )
    .unwrap();

    info!(logger, "login"; "user" => "alice", "password" => "hunter2");

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(r#"[INFO] "login" {"#), "{}", lines[0]);
    assert!(lines[0].contains(r#""password":"*CENSORED*""#));
    assert!(!lines[0].contains("hunter2"));
}

#[test]
#[serial]
fn test_install_prebuilt_pipeline() {
    let buffer = SharedBuffer::default();
    let pipeline = PipelineBuilder::new(LoggingConfig::default().with_level("warning"))
        .writer(buffer.clone())
        .build()
        .unwrap();
    install(Arc::new(pipeline));

    let logger = get_logger(None, o!());
    info!(logger, "hidden");
    warn!(logger, "shown");

    assert_eq!(buffer.lines().len(), 1);
    assert!(buffer.lines()[0].starts_with(r#"[WARNING] "shown""#));

    install(Arc::new(Pipeline::default()));
    assert_eq!(current().thresholds().default_level(), slog::Level::Info);
}
