//! Process-wide configuration.
//!
//! [`configure`] installs a pipeline for the whole process; [`get_logger`]
//! hands out loggers that always log through whichever pipeline is installed
//! at the time of the call. Configure once at startup, before concurrent
//! logging begins.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use slog::{o, Drain, Logger, OwnedKV, OwnedKVList, Record, SendSyncRefUnwindSafeKV};

use crate::{
    error::{ConfigError, PipelineError},
    pipeline::{Pipeline, PipelineBuilder},
};

static ACTIVE: LazyLock<RwLock<Arc<Pipeline>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Pipeline::default())));

/// Builds a pipeline from `setup` and installs it process-wide, replacing the
/// previous one.
///
/// Invalid options are reported here and leave the installed pipeline untouched.
///
/// ```no_run
/// use cloudwatch_log::{configure, get_logger, LoggingConfig};
/// use slog::{info, o};
///
/// configure(LoggingConfig::default().with_wordlist(["password"])).unwrap();
/// let logger = get_logger(Some("api"), o!("request_id" => "r-1"));
/// info!(logger, "login"; "user" => "alice", "password" => "hunter2");
/// ```
pub fn configure(setup: impl Into<PipelineBuilder>) -> Result<(), ConfigError> {
    let pipeline = setup.into().build()?;
    install(Arc::new(pipeline));
    Ok(())
}

/// Installs an already built pipeline process-wide.
pub fn install(pipeline: Arc<Pipeline>) {
    let mut active = ACTIVE.write().unwrap_or_else(PoisonError::into_inner);
    *active = pipeline;
}

/// The pipeline currently installed.
pub fn current() -> Arc<Pipeline> {
    Arc::clone(&ACTIVE.read().unwrap_or_else(PoisonError::into_inner))
}

/// A logger bound to the process-wide pipeline.
///
/// `name` is the logger name used for threshold lookups; without one the
/// call-site module path is used. `initial_values` are added to every record
/// from this handle. Pipeline errors are ignored.
pub fn get_logger<T>(name: Option<&str>, initial_values: OwnedKV<T>) -> Logger
where
    T: SendSyncRefUnwindSafeKV + 'static,
{
    let drain = GlobalDrain {
        name: name.map(ToString::to_string),
    };
    Logger::root(drain.ignore_res(), initial_values)
}

/// [`configure`] followed by an unnamed [`get_logger`] with no initial values.
pub fn setup_and_get_logger(setup: impl Into<PipelineBuilder>) -> Result<Logger, ConfigError> {
    configure(setup)?;
    Ok(get_logger(None, o!()))
}

struct GlobalDrain {
    name: Option<String>,
}

impl Drain for GlobalDrain {
    type Ok = ();
    type Err = PipelineError;

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> Result<(), PipelineError> {
        current().log(self.name.as_deref(), record, values)
    }
}
