// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Adapter from records to a field-list [`Sink`].

use crate::assemble::assemble;
use crate::context::Context;
use crate::json::default_sink;
use crate::level::{Level, Leveler};
use crate::merge::merge_at_path;
use crate::record::Record;
use crate::sink::{Entry, Sink, SinkError};
use crate::value::Attr;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Rewrites each attribute before it is encoded. See [`HandlerOptions::replace_attr`].
pub type ReplaceAttrFn = Arc<dyn Fn(&[String], Attr) -> Attr + Send + Sync>;

/// Extracts attributes from the context of each call.
pub type AttrsFromCtxFn = Arc<dyn Fn(&Context) -> Vec<Attr> + Send + Sync>;

/// Errors reported by [`RecordHandler::handle`].
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The sink rejected the entry.
    #[error("sink write failed: {0}")]
    SinkWrite(#[source] SinkError),
    /// The entry was written but flushing the sink failed.
    #[error("sink flush failed: {0}")]
    SinkFlush(#[source] SinkError),
}

/// Receiver of log records, as seen by the [`crate::Logger`] front end.
pub trait RecordHandler: Send + Sync {
    /// Whether records at `level` would be handled.
    fn enabled(&self, ctx: &Context, level: Level) -> bool;

    /// Processes one record.
    fn handle(&self, ctx: &Context, record: &Record) -> Result<(), HandlerError>;

    /// A handler that adds `attrs` to every record, inside the currently open
    /// groups.
    fn with_attrs(&self, attrs: &[Attr]) -> Self
    where
        Self: Sized;

    /// A handler nesting all later attributes under `name`.
    fn with_group(&self, name: &str) -> Self
    where
        Self: Sized;
}

/// Behavior shared by a [`Handler`] and every handler derived from it.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    /// Adds the source location of the log call to each entry.
    pub add_source: bool,

    /// Minimum level of the records to handle. Defaults to [`Level::DEBUG`].
    pub level: Option<Arc<dyn Leveler>>,

    /// Called for every non-namespace attribute with the names of the groups
    /// enclosing it. Returning a tombstone ([`Attr::default`]) drops the
    /// attribute.
    ///
    /// The time, level, message and source of an entry are written by the sink
    /// and never pass through this function.
    pub replace_attr: Option<ReplaceAttrFn>,

    /// Attributes appended to every record, computed from the call context.
    pub attrs_from_ctx: Option<AttrsFromCtxFn>,
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("add_source", &self.add_source)
            .field("level", &self.level.as_ref().map(|l| l.level()))
            .field("replace_attr", &self.replace_attr.is_some())
            .field("attrs_from_ctx", &self.attrs_from_ctx.is_some())
            .finish()
    }
}

/// [`RecordHandler`] forwarding records to a [`Sink`] as flat field lists.
///
/// Attributes and groups added through [`RecordHandler::with_attrs`] and
/// [`RecordHandler::with_group`] are kept as a tree; each call flattens the tree
/// into namespace-scoped fields. Derived handlers share the sink and options
/// and never alter their parent.
#[derive(Clone)]
pub struct Handler {
    options: Arc<HandlerOptions>,
    sink: Arc<dyn Sink>,
    attrs: Arc<[Attr]>,
    groups: Arc<[String]>,
}

impl Handler {
    /// A handler with no attributes or groups writing to `sink`.
    pub fn new(options: HandlerOptions, sink: Arc<dyn Sink>) -> Self {
        Self {
            options: Arc::new(options),
            sink,
            attrs: Arc::new([]),
            groups: Arc::new([]),
        }
    }

    /// Handler writing JSON lines to stderr, see [`default_sink`].
    pub fn with_default_sink(options: HandlerOptions) -> Self {
        Self::new(options, default_sink())
    }

    /// Names of the open groups, outermost first.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Stored attribute tree.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    fn derive(&self, attrs: Arc<[Attr]>, groups: Arc<[String]>) -> Self {
        Self {
            options: Arc::clone(&self.options),
            sink: Arc::clone(&self.sink),
            attrs,
            groups,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("options", &self.options)
            .field("attrs", &self.attrs)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

fn keep_attr(_: &[String], attr: Attr) -> Attr {
    attr
}

impl RecordHandler for Handler {
    fn enabled(&self, _ctx: &Context, level: Level) -> bool {
        let min_level = self
            .options
            .level
            .as_ref()
            .map_or(Level::DEBUG, |leveler| leveler.level());
        level >= min_level
    }

    fn handle(&self, ctx: &Context, record: &Record) -> Result<(), HandlerError> {
        let entry = Entry {
            level: record.level.into(),
            time: record.time,
            message: record.message.clone(),
            caller: if self.options.add_source {
                record.source.clone()
            } else {
                None
            },
        };
        let Some(checked) = self.sink.check(entry) else {
            return Ok(());
        };

        let fields = assemble(
            ctx,
            &self.groups,
            &self.attrs,
            self.options.replace_attr.as_deref().unwrap_or(&keep_attr),
            self.options.attrs_from_ctx.as_deref(),
            record,
        );

        let written = self.sink.write(checked, &fields);
        let synced = self.sink.sync();
        if let Err(e) = &written {
            tracing::debug!(error = %e, "Failed to write log entry to sink");
        }
        if let Err(e) = &synced {
            tracing::debug!(error = %e, "Failed to sync sink");
        }
        written.map_err(HandlerError::SinkWrite)?;
        synced.map_err(HandlerError::SinkFlush)
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Self {
        if attrs.is_empty() {
            return self.clone();
        }
        let merged = merge_at_path(self.groups(), self.attrs(), attrs);
        self.derive(merged.into(), Arc::clone(&self.groups))
    }

    /// An empty `name` returns an identical handler.
    ///
    /// Opening the first group moves the attributes added so far into it: with
    /// a group open, the sink scopes every later field under that group's
    /// namespace.
    fn with_group(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        let groups: Arc<[String]> = self
            .groups
            .iter()
            .cloned()
            .chain([name.to_owned()])
            .collect();
        let attrs = if self.groups.is_empty() {
            merge_at_path(&groups[..], &[], self.attrs()).into()
        } else {
            Arc::clone(&self.attrs)
        };
        self.derive(attrs, groups)
    }
}
