// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log records and their source locations.

use crate::level::Level;
use crate::value::Attr;
use chrono::{DateTime, Utc};
use std::fmt;
use std::panic::Location;

/// Location of the statement that produced a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Source file path, as given by the compiler.
    pub file: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl Source {
    /// Location of the caller of the current `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&Location<'_>> for Source {
    fn from(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_owned(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single log call: time, level, message, optional source and the
/// attributes passed with the call.
#[derive(Debug, Clone)]
pub struct Record {
    /// When the call was made.
    pub time: DateTime<Utc>,
    /// Severity of the call.
    pub level: Level,
    /// Log message.
    pub message: String,
    /// Call site, when captured.
    pub source: Option<Source>,
    attrs: Vec<Attr>,
}

impl Record {
    /// A record without attributes or source.
    pub fn new(time: DateTime<Utc>, level: Level, message: impl Into<String>) -> Self {
        Self {
            time,
            level,
            message: message.into(),
            source: None,
            attrs: Vec::new(),
        }
    }

    /// Sets the call site.
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Appends attributes after the existing ones.
    pub fn add_attrs(&mut self, attrs: impl IntoIterator<Item = Attr>) {
        self.attrs.extend(attrs);
    }

    /// The call's own attributes, in call order.
    pub fn attrs(&self) -> impl Iterator<Item = &Attr> + '_ {
        self.attrs.iter()
    }

    /// Number of attributes, tombstones included.
    pub fn num_attrs(&self) -> usize {
        self.attrs.len()
    }
}
