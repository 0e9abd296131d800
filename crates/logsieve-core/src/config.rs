//! Pipeline configuration
//!
//! [`LoggingConfig`] describes which sinks to open and which rules to apply,
//! and assembles them into a [`Pipeline`]:
//!
//! ```text
//! Logger -> FilteredSink -> FanoutSink -> { console (text), file (JSON) }
//! ```
//!
//! The filtering sink is always present so rules can be added at runtime.

use crate::error::Result;
use crate::fanout::FanoutSink;
use crate::filter::FilterRule;
use crate::filtered::FilteredSink;
use crate::level::{Level, LevelVar};
use crate::logger::Logger;
use crate::registry::{self, Registry};
use crate::sink::Sink;
use crate::stream::{FileSink, StreamSink};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

/// Default number of rotated files kept on disk
pub const DEFAULT_MAX_FILES: usize = 5;

/// How often the log file is rolled over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    /// Every minute
    Minutely,
    /// Every hour
    Hourly,
    /// Every day
    #[default]
    Daily,
    /// A single file for the whole run
    Never,
}

impl From<Rotation> for tracing_appender::rolling::Rotation {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::Minutely => Self::MINUTELY,
            Rotation::Hourly => Self::HOURLY,
            Rotation::Daily => Self::DAILY,
            Rotation::Never => Self::NEVER,
        }
    }
}

/// Rotating file sink settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSinkConfig {
    /// Directory the files are written to; created if missing
    pub directory: PathBuf,
    /// First component of every file name
    pub app_name: String,
    /// Rollover schedule
    #[serde(default)]
    pub rotation: Rotation,
    /// Retention; `None` keeps every file
    #[serde(default = "default_max_files")]
    pub max_files: Option<usize>,
}

fn default_max_files() -> Option<usize> {
    Some(DEFAULT_MAX_FILES)
}

impl FileSinkConfig {
    /// Files named after `app_name` in `directory`, rotated daily
    pub fn new(directory: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            app_name: app_name.into(),
            rotation: Rotation::default(),
            max_files: default_max_files(),
        }
    }

    /// Set the rollover schedule
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set how many files to keep; `None` keeps all of them
    pub fn max_files(mut self, max_files: Option<usize>) -> Self {
        self.max_files = max_files;
        self
    }
}

/// What a pipeline writes to and what it filters out
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level written by the sinks
    pub level: Level,
    /// Write text lines to stdout
    pub console: bool,
    /// Write JSON lines to rotating files
    pub file: Option<FileSinkConfig>,
    /// Initial filter rules, in evaluation order
    pub rules: Vec<FilterRule>,
    #[serde(skip)]
    level_var: Option<Arc<LevelVar>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            console: true,
            file: None,
            rules: Vec::new(),
            level_var: None,
        }
    }
}

impl std::fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("level", &self.level)
            .field("console", &self.console)
            .field("file", &self.file)
            .field("rules", &self.rules)
            .finish()
    }
}

impl LoggingConfig {
    /// Console only, at [`Level::Info`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Console only, everything from [`Level::Debug`] up
    pub fn development() -> Self {
        Self {
            level: Level::Debug,
            ..Default::default()
        }
    }

    /// Console and daily rotated JSON files, from [`Level::Info`] up
    pub fn production(directory: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
        Self {
            file: Some(FileSinkConfig::new(directory, app_name)),
            ..Default::default()
        }
    }

    /// Parse a configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the minimum level
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Enable or disable the console sink
    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Add a rotating file sink
    pub fn file(mut self, file: FileSinkConfig) -> Self {
        self.file = Some(file);
        self
    }

    /// Append a filter rule
    pub fn rule(mut self, rule: FilterRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Replace the filter rules
    pub fn rules(mut self, rules: Vec<FilterRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Make the sinks follow an existing threshold instead of a new one.
    /// The threshold is set to this config's level when the pipeline is built.
    pub fn level_var(mut self, level: Arc<LevelVar>) -> Self {
        self.level_var = Some(level);
        self
    }

    /// Check every rule
    pub fn validate(&self) -> Result<()> {
        self.rules
            .iter()
            .enumerate()
            .try_for_each(|(index, rule)| rule.validate(index))
    }

    /// Open the sinks and assemble the pipeline
    pub fn build(self) -> Result<Pipeline> {
        self.validate()?;

        let level = self
            .level_var
            .unwrap_or_else(|| Arc::new(LevelVar::new(self.level)));
        level.set(self.level);

        let mut fanout = FanoutSink::default();
        if self.console {
            fanout.push(Arc::new(StreamSink::stdout(Arc::clone(&level))));
        }

        let mut worker = None;
        if let Some(file) = &self.file {
            let (sink, guard): (FileSink, WorkerGuard) =
                StreamSink::rolling_file(file, Arc::clone(&level))?;
            fanout.push(Arc::new(sink));
            worker = Some(guard);
        }

        Ok(Pipeline::assemble(Arc::new(fanout), self.rules, level, worker))
    }

    /// Build against the global threshold and make it the global logger
    pub fn install(self) -> Result<LoggingGuard> {
        Ok(self.level_var(registry::global().level_var()).build()?.install())
    }
}

/// An assembled sink chain
pub struct Pipeline {
    logger: Logger,
    filter: FilteredSink,
    level: Arc<LevelVar>,
    worker: Option<WorkerGuard>,
}

impl Pipeline {
    /// Put a filtering sink with `rules` in front of `sink`
    pub fn from_sink(sink: Arc<dyn Sink>, rules: Vec<FilterRule>, level: Arc<LevelVar>) -> Self {
        Self::assemble(sink, rules, level, None)
    }

    fn assemble(
        sink: Arc<dyn Sink>,
        rules: Vec<FilterRule>,
        level: Arc<LevelVar>,
        worker: Option<WorkerGuard>,
    ) -> Self {
        let filter = FilteredSink::new(sink, rules);
        Self {
            logger: Logger::new(Arc::new(filter.clone())),
            filter,
            level,
            worker,
        }
    }

    /// Logger writing through the pipeline
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The filtering sink, for runtime rule changes and counters
    pub fn filter(&self) -> &FilteredSink {
        &self.filter
    }

    /// The sinks' threshold
    pub fn level(&self) -> &Arc<LevelVar> {
        &self.level
    }

    /// Make this pipeline the global logger.
    ///
    /// The global threshold takes this pipeline's level. Sinks built by
    /// [`LoggingConfig::install`] also share it, so later
    /// [`set_level`](crate::set_level) calls reach them.
    pub fn install(self) -> LoggingGuard {
        self.install_into(registry::global())
    }

    /// Make this pipeline the current logger of `registry`
    pub fn install_into(self, registry: &'static Registry) -> LoggingGuard {
        registry.set_level(self.level.get());
        registry.set(self.logger.clone());
        LoggingGuard {
            registry,
            filter: self.filter,
            worker: self.worker,
        }
    }
}

/// Keeps an installed pipeline alive.
///
/// Dropping it logs "Shutting down logging" through the registry and then
/// flushes the file sink's background writer.
#[must_use = "dropping the guard shuts logging down"]
pub struct LoggingGuard {
    registry: &'static Registry,
    filter: FilteredSink,
    worker: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// The installed filtering sink
    pub fn filter(&self) -> &FilteredSink {
        &self.filter
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        use crate::logger::Log;

        self.registry.info("Shutting down logging", &[]);
        drop(self.worker.take());
    }
}
