// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Front end building records from log calls.

use crate::context::Context;
use crate::handler::{HandlerError, RecordHandler};
use crate::level::Level;
use crate::record::{Record, Source};
use crate::value::Attr;
use chrono::Utc;

/// Front end building records and passing them to a [`RecordHandler`].
///
/// The level helpers (`debug`, `info`, ...) never fail; handler errors are
/// reported through `tracing`. Use [`Logger::log`] to observe them.
#[derive(Debug, Clone)]
pub struct Logger<H> {
    handler: H,
}

impl<H: RecordHandler> Logger<H> {
    /// A logger sending its records to `handler`.
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The handler records are sent to.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// A logger whose records all carry `attrs`.
    pub fn with(&self, attrs: &[Attr]) -> Self {
        Self::new(self.handler.with_attrs(attrs))
    }

    /// A logger whose later attributes are nested under `name`.
    pub fn with_group(&self, name: &str) -> Self {
        Self::new(self.handler.with_group(name))
    }

    /// Whether a record at `level` would be handled.
    pub fn enabled(&self, ctx: &Context, level: Level) -> bool {
        self.handler.enabled(ctx, level)
    }

    /// Logs `message` at `level`, recording the caller's location.
    ///
    /// Records below the handler's level are dropped without error.
    #[track_caller]
    pub fn log(
        &self,
        ctx: &Context,
        level: Level,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<(), HandlerError> {
        if !self.handler.enabled(ctx, level) {
            return Ok(());
        }
        let mut record = Record::new(Utc::now(), level, message).with_source(Source::caller());
        record.add_attrs(attrs);
        self.handler.handle(ctx, &record)
    }

    #[track_caller]
    fn log_or_trace(
        &self,
        ctx: &Context,
        level: Level,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        if let Err(e) = self.log(ctx, level, message, attrs) {
            tracing::warn!(error = %e, "Failed to handle log record");
        }
    }

    /// Logs at [`Level::DEBUG`].
    #[track_caller]
    pub fn debug(
        &self,
        ctx: &Context,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        self.log_or_trace(ctx, Level::DEBUG, message, attrs);
    }

    /// Logs at [`Level::INFO`].
    #[track_caller]
    pub fn info(
        &self,
        ctx: &Context,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        self.log_or_trace(ctx, Level::INFO, message, attrs);
    }

    /// Logs at [`Level::WARN`].
    #[track_caller]
    pub fn warn(
        &self,
        ctx: &Context,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        self.log_or_trace(ctx, Level::WARN, message, attrs);
    }

    /// Logs at [`Level::ERROR`].
    #[track_caller]
    pub fn error(
        &self,
        ctx: &Context,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        self.log_or_trace(ctx, Level::ERROR, message, attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Handler, HandlerOptions};
    use crate::sink::{MemorySink, Sink, SinkLevel};
    use std::sync::Arc;

    fn logger(sink: &Arc<MemorySink>, options: HandlerOptions) -> Logger<Handler> {
        Logger::new(Handler::new(options, Arc::clone(sink) as Arc<dyn Sink>))
    }

    #[test]
    fn disabled_levels_skip_the_handler() {
        let sink = Arc::new(MemorySink::new(SinkLevel::Debug));
        let log = logger(
            &sink,
            HandlerOptions {
                level: Some(Arc::new(Level::WARN)),
                ..Default::default()
            },
        );
        let ctx = Context::background();
        log.info(&ctx, "quiet", []);
        log.error(&ctx, "loud", [Attr::new("code", 7)]);

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.message, "loud");
        assert_eq!(entries[0].0.level, SinkLevel::Error);
        assert_eq!(entries[0].1.len(), 1);
    }

    #[test]
    fn caller_location_is_captured() {
        let sink = Arc::new(MemorySink::new(SinkLevel::Debug));
        let log = logger(
            &sink,
            HandlerOptions {
                add_source: true,
                ..Default::default()
            },
        );
        let line = line!() + 1;
        log.warn(&Context::background(), "here", []);

        let caller = sink.entries()[0].0.caller.clone().unwrap();
        assert!(caller.file.ends_with("logger.rs"));
        assert_eq!(caller.line, line);
    }

    #[test]
    fn log_reports_handler_errors() {
        let sink = Arc::new(MemorySink::new(SinkLevel::Debug).failing_writes());
        let log = logger(&sink, HandlerOptions::default());
        let result = log.log(&Context::background(), Level::INFO, "m", []);
        assert!(matches!(result, Err(HandlerError::SinkWrite(_))));
    }

    #[test]
    fn derived_loggers_nest_attributes() {
        let sink = Arc::new(MemorySink::new(SinkLevel::Debug));
        let log = logger(&sink, HandlerOptions::default())
            .with_group("req")
            .with(&[Attr::new("id", 1)]);
        log.debug(&Context::background(), "m", [Attr::new("n", 2)]);

        let keys: Vec<_> = sink.entries()[0]
            .1
            .iter()
            .map(|field| field.key.clone())
            .collect();
        assert_eq!(keys, ["req", "id", "n"]);
        assert_eq!(log.handler().groups(), ["req"]);
    }
}
