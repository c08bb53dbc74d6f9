//! Pipeline assembly and the slog drain that feeds it.
//!
//! A [`Pipeline`] is an ordered list of processors, a renderer, severity
//! thresholds and an output sink. It is built once and then shared behind an
//! `Arc` by every logger handle bound to it.

use std::{
    fmt,
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

use slog::{Drain, Logger, OwnedKV, OwnedKVList, Record, SendSyncRefUnwindSafeKV};

use crate::{
    censor::Censor,
    config::LoggingConfig,
    error::{ConfigError, PipelineError},
    record::{self, EventMeta, EventRecord},
    render::{Callouts, CloudWatchRenderer, Renderer, Serializer},
    stages::{
        AddLogLevel, ExceptionFormatter, FilterByLevel, MergeThreadLocal,
        PositionalArgumentsFormatter, Processor, StackInfoRenderer, Thresholds, TimeStamper,
        UnicodeDecoder,
    },
};

/// The standard stages, in their fixed order, ahead of the renderer.
fn standard_processors(
    config: &LoggingConfig,
    thresholds: Arc<Thresholds>,
) -> Vec<Box<dyn Processor>> {
    vec![
        Box::new(FilterByLevel::new(thresholds)),
        Box::new(AddLogLevel),
        Box::new(PositionalArgumentsFormatter::default()),
        Box::new(TimeStamper::iso()),
        Box::new(StackInfoRenderer),
        Box::new(ExceptionFormatter),
        Box::new(UnicodeDecoder),
        Box::new(Censor::new(&config.wordlist_to_censor)),
        Box::new(MergeThreadLocal),
    ]
}

fn standard_renderer(
    config: &LoggingConfig,
    serializer: Option<Box<dyn Serializer>>,
) -> CloudWatchRenderer {
    let renderer = CloudWatchRenderer::new(Callouts::new(&config.callouts))
        .with_options(config.serializer_options.clone());
    match serializer {
        Some(serializer) => renderer.with_boxed_serializer(serializer),
        None => renderer,
    }
}

/// Collects the options for a [`Pipeline`].
///
/// Without a custom processor list the standard stages are used, configured
/// from the [`LoggingConfig`]. A custom list replaces every stage including
/// the renderer, so the config then only contributes the thresholds.
pub struct PipelineBuilder {
    config: LoggingConfig,
    serializer: Option<Box<dyn Serializer>>,
    custom: Option<(Vec<Box<dyn Processor>>, Box<dyn Renderer>)>,
    writer: Option<Box<dyn Write + Send>>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

impl From<LoggingConfig> for PipelineBuilder {
    fn from(config: LoggingConfig) -> Self {
        Self::new(config)
    }
}

impl PipelineBuilder {
    /// Starts from `config`.
    #[must_use]
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config,
            serializer: None,
            custom: None,
            writer: None,
        }
    }

    /// Replaces the JSON body serializer of the standard renderer.
    #[must_use]
    pub fn serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Some(Box::new(serializer));
        self
    }

    /// Replaces the whole stage list, renderer included.
    #[must_use]
    pub fn processors(
        mut self,
        processors: Vec<Box<dyn Processor>>,
        renderer: impl Renderer + 'static,
    ) -> Self {
        self.custom = Some((processors, Box::new(renderer)));
        self
    }

    /// Sends lines to `writer` instead of stdout.
    #[must_use]
    pub fn writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// Validates the options and assembles the pipeline.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let thresholds = Arc::new(self.config.thresholds()?);
        let (processors, renderer) = match self.custom {
            Some(custom) => custom,
            None => {
                let renderer = standard_renderer(&self.config, self.serializer);
                renderer.check_options().map_err(ConfigError::Serializer)?;
                let processors = standard_processors(&self.config, Arc::clone(&thresholds));
                let renderer: Box<dyn Renderer> = Box::new(renderer);
                (processors, renderer)
            }
        };
        let sink: Box<dyn Write + Send> = match self.writer {
            Some(writer) => writer,
            None => Box::new(io::stdout()),
        };

        Ok(Pipeline {
            processors,
            renderer,
            thresholds,
            sink: Mutex::new(sink),
        })
    }
}

/// An assembled processing pipeline with its output sink.
pub struct Pipeline {
    processors: Vec<Box<dyn Processor>>,
    renderer: Box<dyn Renderer>,
    thresholds: Arc<Thresholds>,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("thresholds", &self.thresholds)
            .finish_non_exhaustive()
    }
}

impl Default for Pipeline {
    /// The standard pipeline with default options, writing to stdout.
    fn default() -> Self {
        let config = LoggingConfig::default();
        let thresholds = Arc::new(config.thresholds().unwrap_or_default());
        Self {
            processors: standard_processors(&config, Arc::clone(&thresholds)),
            renderer: Box::new(standard_renderer(&config, None)),
            thresholds,
            sink: Mutex::new(Box::new(io::stdout())),
        }
    }
}

impl Pipeline {
    /// Starts a builder with default options.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Builds the standard pipeline from `config`, writing to stdout.
    pub fn from_config(config: LoggingConfig) -> Result<Self, ConfigError> {
        PipelineBuilder::new(config).build()
    }

    /// Names of the processors, in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|stage| stage.name()).collect()
    }

    /// Severity thresholds applied before any stage runs.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    fn enabled(&self, meta: &EventMeta<'_>) -> bool {
        meta.level
            .map_or(true, |level| self.thresholds.enabled(meta.target(), level))
    }

    /// Runs `record` through every stage and renders it.
    ///
    /// Returns `Ok(None)` when a stage dropped the event.
    pub fn run(
        &self,
        meta: &EventMeta<'_>,
        mut record: EventRecord,
    ) -> Result<Option<String>, PipelineError> {
        for stage in &self.processors {
            match stage.process(meta, record)? {
                Some(next) => record = next,
                None => return Ok(None),
            }
        }
        Ok(Some(self.renderer.render(meta, &record)?))
    }

    /// Runs `record` through the pipeline and writes the line, newline-terminated,
    /// to the sink. Events below the threshold for their target are skipped.
    pub fn emit(&self, meta: &EventMeta<'_>, record: EventRecord) -> Result<(), PipelineError> {
        if !self.enabled(meta) {
            return Ok(());
        }
        let Some(line) = self.run(meta, record)? else {
            return Ok(());
        };
        // A panic elsewhere while holding the sink must not silence logging.
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(sink, "{line}")?;
        sink.flush()?;
        Ok(())
    }

    pub(crate) fn log(
        &self,
        name: Option<&str>,
        record: &Record<'_>,
        values: &OwnedKVList,
    ) -> Result<(), PipelineError> {
        let meta = EventMeta {
            level: Some(record.level()),
            logger_name: name,
            module: Some(record.module()),
        };
        if !self.enabled(&meta) {
            return Ok(());
        }
        let event = record::collect(record, values)?;
        self.emit(&meta, event)
    }

    /// A raw drain bound to this pipeline.
    ///
    /// Its errors are returned to slog as-is; wrap it with `fuse()` or
    /// `ignore_res()` to pick a policy.
    pub fn drain(self: &Arc<Self>, name: Option<&str>) -> PipelineDrain {
        PipelineDrain {
            pipeline: Arc::clone(self),
            name: name.map(ToString::to_string),
        }
    }

    /// A logger bound to this pipeline.
    ///
    /// `name` is used for threshold lookups. `initial_values` are added to
    /// every record logged through the handle and its children. Pipeline
    /// errors are ignored.
    pub fn logger<T>(self: &Arc<Self>, name: Option<&str>, initial_values: OwnedKV<T>) -> Logger
    where
        T: SendSyncRefUnwindSafeKV + 'static,
    {
        Logger::root(self.drain(name).ignore_res(), initial_values)
    }
}

/// slog drain running every record through one [`Pipeline`].
#[derive(Clone)]
pub struct PipelineDrain {
    pipeline: Arc<Pipeline>,
    name: Option<String>,
}

impl fmt::Debug for PipelineDrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineDrain")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Drain for PipelineDrain {
    type Ok = ();
    type Err = PipelineError;

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> Result<(), PipelineError> {
        self.pipeline.log(self.name.as_deref(), record, values)
    }
}

#[cfg(test)]
mod tests {
    use super::{Pipeline, PipelineBuilder};
    use crate::{
        config::LoggingConfig,
        error::ConfigError,
        record::{EventMeta, EventRecord},
        render::{Callouts, CloudWatchRenderer},
        stages::{AddLogLevel, Processor},
    };
    use serde_json::json;
    use slog::Level;

    #[test]
    fn standard_stage_order_is_fixed() {
        let pipeline = Pipeline::from_config(LoggingConfig::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            [
                "filter_by_level",
                "add_log_level",
                "positional_arguments_formatter",
                "time_stamper",
                "stack_info_renderer",
                "format_exc_info",
                "unicode_decoder",
                "censor",
                "merge_threadlocal",
            ]
        );
    }

    #[test]
    fn default_pipeline_matches_default_config() {
        let pipeline = Pipeline::default();
        assert_eq!(pipeline.stage_names().len(), 9);
        assert_eq!(pipeline.thresholds().level_for("hyper::client"), Level::Warning);
        assert_eq!(pipeline.thresholds().default_level(), Level::Info);
    }

    #[test]
    fn run_censors_before_rendering() {
        let pipeline = Pipeline::from_config(
            LoggingConfig::default()
                .with_wordlist(["password"])
                .with_callouts(["password", "event"]),
        )
        .unwrap();
        let serde_json::Value::Object(record) = json!({ "event": "login", "password": "hunter2" })
        else {
            unreachable!()
        };

        let line = pipeline
            .run(&EventMeta::new(Level::Info), record)
            .unwrap()
            .unwrap();
        assert!(line.starts_with(r#"[INFO] "*CENSORED*" "login" {"#));
        assert!(!line.contains("hunter2"));
    }

    #[test]
    fn custom_processors_replace_the_standard_list() {
        let processors: Vec<Box<dyn Processor>> = vec![Box::new(AddLogLevel)];
        let pipeline = PipelineBuilder::default()
            .processors(processors, CloudWatchRenderer::new(Callouts::none()))
            .build()
            .unwrap();
        assert_eq!(pipeline.stage_names(), ["add_log_level"]);

        let line = pipeline
            .run(&EventMeta::new(Level::Debug), EventRecord::new())
            .unwrap()
            .unwrap();
        assert_eq!(line, r#"[DEBUG] {"level":"debug"}"#);
    }

    #[test]
    fn invalid_serializer_options_fail_at_build_time() {
        let config = LoggingConfig::default().with_serializer_option("indent", "wide");
        assert!(matches!(
            Pipeline::from_config(config),
            Err(ConfigError::Serializer(_))
        ));
    }
}
