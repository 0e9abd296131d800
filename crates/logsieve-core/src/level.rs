//! Severity scale
//!
//! The conventional Debug/Info/Warn/Error scale, extended with `Trace` below
//! `Debug` and `Fatal` above `Error`. Severities are spaced four apart so the
//! extensions sit exactly one step beyond each end of the conventional scale.

use crate::error::LogError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI8, Ordering};

/// Log severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i8)]
pub enum Level {
    /// Finer-grained than debug output
    Trace = -8,
    /// Debugging information
    Debug = -4,
    /// General information
    #[default]
    Info = 0,
    /// Warning conditions
    Warn = 4,
    /// Error conditions
    Error = 8,
    /// Unrecoverable conditions (recorded only, never terminates the process)
    Fatal = 12,
}

impl Level {
    /// Every level, most verbose first
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Textual label used by every sink.
    ///
    /// The two extensions render as literal `TRACE` and `FATAL` rather than
    /// as offsets from their neighbours.
    pub const fn label(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Numeric severity
    pub const fn severity(&self) -> i8 {
        *self as i8
    }

    /// Level for a numeric severity, rounding down to the nearest known level.
    pub fn from_severity(severity: i8) -> Level {
        Level::ALL
            .iter()
            .rev()
            .copied()
            .find(|level| level.severity() <= severity)
            .unwrap_or(Level::Trace)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A level that can be changed at runtime without locking.
///
/// Shared by `Arc` between the registry and the sinks it configures so that a
/// single `set` adjusts every threshold at once.
#[derive(Debug)]
pub struct LevelVar(AtomicI8);

impl LevelVar {
    /// Create a variable holding `level`
    pub fn new(level: Level) -> Self {
        Self(AtomicI8::new(level.severity()))
    }

    /// Current level
    pub fn get(&self) -> Level {
        Level::from_severity(self.0.load(Ordering::Relaxed))
    }

    /// Replace the current level
    pub fn set(&self, level: Level) {
        self.0.store(level.severity(), Ordering::Relaxed);
    }

    /// Whether records at `level` pass this threshold
    pub fn allows(&self, level: Level) -> bool {
        level >= self.get()
    }
}

impl Default for LevelVar {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}
