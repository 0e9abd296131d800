//! Process-wide logger registry
//!
//! One [`Registry`] instance lives for the whole process, created on first use
//! with a text sink on stdout at [`Level::Debug`]. The module-level functions
//! read the current logger at call time, so [`set_logger`] takes effect for
//! every later call from any thread.
//!
//! The threshold is a [`LevelVar`] shared with the default console sink and
//! with pipelines installed through [`LoggingConfig::install`]. It is checked
//! before the logger lock is taken.
//!
//! [`LoggingConfig::install`]: crate::LoggingConfig::install

use crate::level::{Level, LevelVar};
use crate::logger::{Log, Logger};
use crate::record::Attr;
use crate::stream::StreamSink;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Current logger and threshold
pub struct Registry {
    logger: RwLock<Logger>,
    level: Arc<LevelVar>,
}

impl Registry {
    /// Registry holding `logger`, gated by `level`
    pub fn new(logger: Logger, level: Arc<LevelVar>) -> Self {
        Self {
            logger: RwLock::new(logger),
            level,
        }
    }

    /// Registry with a stdout text logger at [`Level::Debug`]
    pub fn stdout() -> Self {
        let level = Arc::new(LevelVar::new(Level::Debug));
        let sink = StreamSink::stdout(Arc::clone(&level));
        Self::new(Logger::new(Arc::new(sink)), level)
    }

    /// The current logger
    pub fn get(&self) -> Logger {
        self.logger
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the current logger, returning the previous one
    pub fn set(&self, logger: Logger) -> Logger {
        let mut current = self.logger.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, logger)
    }

    /// Change the threshold
    pub fn set_level(&self, level: Level) {
        self.level.set(level);
    }

    /// Current threshold
    pub fn level(&self) -> Level {
        self.level.get()
    }

    /// The shared threshold, for sinks that should follow it
    pub fn level_var(&self) -> Arc<LevelVar> {
        Arc::clone(&self.level)
    }
}

impl Log for Registry {
    fn log(&self, level: Level, message: &str, attrs: &[Attr]) {
        if !self.level.allows(level) {
            return;
        }
        self.get().log(level, message, attrs);
    }

    fn with(&self, attrs: &[Attr]) -> Logger {
        self.get().with(attrs)
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::stdout)
}

/// The current global logger
pub fn logger() -> Logger {
    global().get()
}

/// Replace the global logger, returning the previous one
pub fn set_logger(logger: Logger) -> Logger {
    global().set(logger)
}

/// Change the global threshold
pub fn set_level(level: Level) {
    global().set_level(level);
}

/// Current global threshold
pub fn level() -> Level {
    global().level()
}

/// Log at [`Level::Trace`] through the global logger
pub fn trace(message: &str, attrs: &[Attr]) {
    global().trace(message, attrs);
}

/// Log at [`Level::Debug`] through the global logger
pub fn debug(message: &str, attrs: &[Attr]) {
    global().debug(message, attrs);
}

/// Log at [`Level::Info`] through the global logger
pub fn info(message: &str, attrs: &[Attr]) {
    global().info(message, attrs);
}

/// Log at [`Level::Warn`] through the global logger
pub fn warn(message: &str, attrs: &[Attr]) {
    global().warn(message, attrs);
}

/// Log at [`Level::Error`] through the global logger
pub fn error(message: &str, attrs: &[Attr]) {
    global().error(message, attrs);
}

/// Log at [`Level::Fatal`] through the global logger. Does not exit.
pub fn fatal(message: &str, attrs: &[Attr]) {
    global().fatal(message, attrs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySink;

    fn registry(level: Level) -> (Registry, MemorySink) {
        let memory = MemorySink::new();
        let registry = Registry::new(
            Logger::new(memory.shared()),
            Arc::new(LevelVar::new(level)),
        );
        (registry, memory)
    }

    #[test]
    fn test_threshold_checked_before_logger() {
        let (registry, memory) = registry(Level::Info);

        registry.debug("hidden", &[]);
        registry.info("shown", &[]);
        assert_eq!(memory.messages(), vec!["shown"]);

        registry.set_level(Level::Trace);
        assert_eq!(registry.level(), Level::Trace);
        registry.trace("now shown", &[]);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_set_swaps_logger_for_later_calls() {
        let (registry, first) = registry(Level::Debug);
        let second = MemorySink::new();

        registry.info("one", &[]);
        let previous = registry.set(Logger::new(second.shared()));
        registry.info("two", &[]);
        previous.info("three", &[]);

        assert_eq!(first.messages(), vec!["one", "three"]);
        assert_eq!(second.messages(), vec!["two"]);
    }

    #[test]
    fn test_with_derives_from_current_logger() {
        let (registry, memory) = registry(Level::Debug);
        registry
            .with(&[Attr::new("id", "c1")])
            .info("tagged", &[]);
        assert!(memory.last_attr("id").is_some());
    }

    #[test]
    fn test_fatal_does_not_exit() {
        let (registry, memory) = registry(Level::Error);
        registry.fatal("fatal but alive", &[]);
        registry.error("still running", &[]);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_concurrent_swaps_and_logging() {
        let (registry, _memory) = registry(Level::Debug);

        std::thread::scope(|scope| {
            for i in 0..4 {
                let registry = &registry;
                scope.spawn(move || {
                    for n in 0..100 {
                        if n % 10 == 0 {
                            registry.set(Logger::new(MemorySink::new().shared()));
                        }
                        registry.info("tick", &[Attr::new("thread", i)]);
                    }
                });
            }
        });
    }

    #[test]
    fn test_global_is_a_single_instance() {
        assert!(std::ptr::eq(global(), global()));
        assert!(Arc::ptr_eq(&global().level_var(), &global().level_var()));
    }
}
