// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Record severities.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI32, Ordering};
use thiserror::Error;

/// Severity of a record.
///
/// Levels are integers; the named levels are spaced by four so that
/// intermediate severities (`INFO+2`) can be expressed.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(pub i32);

impl Level {
    /// Diagnostic detail.
    pub const DEBUG: Level = Level(-4);
    /// Normal operation.
    pub const INFO: Level = Level(0);
    /// Something unexpected that the program recovered from.
    pub const WARN: Level = Level(4);
    /// A failed operation.
    pub const ERROR: Level = Level(8);

    /// Nearest named level at or below `self`, and the offset from it.
    fn base(self) -> (&'static str, i32) {
        let (name, base) = if self < Level::INFO {
            ("DEBUG", Level::DEBUG)
        } else if self < Level::WARN {
            ("INFO", Level::INFO)
        } else if self < Level::ERROR {
            ("WARN", Level::WARN)
        } else {
            ("ERROR", Level::ERROR)
        };
        (name, self.0.saturating_sub(base.0))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base() {
            (name, 0) => f.write_str(name),
            (name, offset) => write!(f, "{name}{offset:+}"),
        }
    }
}

/// A string that does not name a level.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid log level: {0:?}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses names like `info`, `WARN` or `error-1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseLevelError(s.to_owned());
        let (name, offset) = match s.find(['+', '-']) {
            Some(idx) => {
                let offset: i32 = s[idx..].parse().map_err(|_| invalid())?;
                (&s[..idx], offset)
            }
            None => (s, 0),
        };
        let base = match name.to_ascii_uppercase().as_str() {
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "WARN" => Level::WARN,
            "ERROR" => Level::ERROR,
            _ => return Err(invalid()),
        };
        Ok(Level(base.0.saturating_add(offset)))
    }
}

/// Source of a minimum level, consulted on every check.
pub trait Leveler: Send + Sync {
    /// Current minimum level.
    fn level(&self) -> Level;
}

impl Leveler for Level {
    fn level(&self) -> Level {
        *self
    }
}

/// A [`Leveler`] that can be changed while handlers are using it.
#[derive(Debug, Default)]
pub struct LevelVar(AtomicI32);

impl LevelVar {
    /// A variable starting at `level`.
    pub fn new(level: Level) -> Self {
        Self(AtomicI32::new(level.0))
    }

    /// Changes the level seen by every handler sharing this variable.
    pub fn set(&self, level: Level) {
        self.0.store(level.0, Ordering::Relaxed);
    }
}

impl Leveler for LevelVar {
    fn level(&self) -> Level {
        Level(self.0.load(Ordering::Relaxed))
    }
}
