// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Backend capability receiving assembled entries.

use crate::field::Field;
use crate::level::Level;
use crate::record::Source;
use chrono::{DateTime, Utc};
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;

/// Severity understood by sinks.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SinkLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Recovered problems.
    Warn,
    /// Failed operations.
    Error,
}

impl SinkLevel {
    /// Upper-case name, as written by sinks.
    pub fn as_str(self) -> &'static str {
        match self {
            SinkLevel::Debug => "DEBUG",
            SinkLevel::Info => "INFO",
            SinkLevel::Warn => "WARN",
            SinkLevel::Error => "ERROR",
        }
    }
}

/// Front-end levels between two named levels map to the lower one.
impl From<Level> for SinkLevel {
    fn from(level: Level) -> Self {
        if level < Level::INFO {
            SinkLevel::Debug
        } else if level < Level::WARN {
            SinkLevel::Info
        } else if level < Level::ERROR {
            SinkLevel::Warn
        } else {
            SinkLevel::Error
        }
    }
}

impl fmt::Display for SinkLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkLevel {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(SinkLevel::Debug),
            "info" => Ok(SinkLevel::Info),
            "warn" | "warning" => Ok(SinkLevel::Warn),
            "error" => Ok(SinkLevel::Error),
            _ => Err(SinkError::InvalidLevel(s.to_owned())),
        }
    }
}

/// Errors reported by sinks and their configuration.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing or flushing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The entry could not be serialized.
    #[error("failed to encode entry: {0}")]
    Encode(String),
    /// A writer panicked while holding the output lock.
    #[error("sink writer lock poisoned")]
    Poisoned,
    /// A level name was not recognized.
    #[error("invalid sink level: {0:?}")]
    InvalidLevel(String),
}

/// Everything about a log call except its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Severity.
    pub level: SinkLevel,
    /// When the call was made.
    pub time: DateTime<Utc>,
    /// Log message.
    pub message: String,
    /// Call site, when requested.
    pub caller: Option<Source>,
}

/// An entry a sink agreed to write.
///
/// Only obtainable from [`Sink::check`] or [`CheckedEntry::new`] in sink
/// implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedEntry {
    entry: Entry,
}

impl CheckedEntry {
    /// Marks `entry` as accepted.
    pub fn new(entry: Entry) -> Self {
        Self { entry }
    }

    /// The accepted entry.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Unwraps the accepted entry.
    pub fn into_entry(self) -> Entry {
        self.entry
    }
}

/// Structured-log backend.
///
/// Implementations serialize their own writes; a single sink is shared by a
/// handler and every handler derived from it.
pub trait Sink: Send + Sync {
    /// Returns `None` when the entry should not be written.
    fn check(&self, entry: Entry) -> Option<CheckedEntry>;

    /// Writes an accepted entry with its fields.
    fn write(&self, entry: CheckedEntry, fields: &[Field]) -> Result<(), SinkError>;

    /// Flushes buffered output.
    fn sync(&self) -> Result<(), SinkError>;
}

/// In-memory [`Sink`] keeping every written entry, for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    level: SinkLevel,
    written: Mutex<Vec<(Entry, Vec<Field>)>>,
    syncs: Mutex<usize>,
    fail_write: bool,
    fail_sync: bool,
}

impl MemorySink {
    /// A sink accepting entries at `level` and above.
    pub fn new(level: SinkLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Makes every write fail (the entry is not kept).
    pub fn failing_writes(mut self) -> Self {
        self.fail_write = true;
        self
    }

    /// Makes every sync fail.
    pub fn failing_syncs(mut self) -> Self {
        self.fail_sync = true;
        self
    }

    /// Written entries, oldest first.
    pub fn entries(&self) -> Vec<(Entry, Vec<Field>)> {
        self.written
            .lock()
            .map(|written| written.clone())
            .unwrap_or_default()
    }

    /// Number of calls to [`Sink::sync`].
    pub fn sync_count(&self) -> usize {
        self.syncs.lock().map(|syncs| *syncs).unwrap_or_default()
    }
}

impl Sink for MemorySink {
    fn check(&self, entry: Entry) -> Option<CheckedEntry> {
        (entry.level >= self.level).then(|| CheckedEntry::new(entry))
    }

    fn write(&self, entry: CheckedEntry, fields: &[Field]) -> Result<(), SinkError> {
        if self.fail_write {
            return Err(io::Error::other("write refused").into());
        }
        self.written
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push((entry.into_entry(), fields.to_vec()));
        Ok(())
    }

    fn sync(&self) -> Result<(), SinkError> {
        *self.syncs.lock().map_err(|_| SinkError::Poisoned)? += 1;
        if self.fail_sync {
            return Err(io::Error::other("sync refused").into());
        }
        Ok(())
    }
}
