// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! `libdd-structured-log` adapts a structured logging front end, where a log
//! call carries a leveled message and a tree of key/value attributes in
//! nested groups, onto sinks that only understand a flat list of fields with
//! namespace markers.
//!
//! A [`Handler`] keeps the attributes and groups added through
//! [`RecordHandler::with_attrs`] and [`RecordHandler::with_group`] as a tree
//! and flattens it for every record. [`JsonSink`] is the default sink and
//! writes one JSON object per entry.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use libdd_structured_log::{Attr, Context, Handler, HandlerOptions, Logger};
//!
//! let logger = Logger::new(Handler::with_default_sink(HandlerOptions::default()));
//! let requests = logger.with_group("req").with(&[Attr::new("id", 42)]);
//! requests.info(&Context::background(), "request done", [Attr::new("status", 200)]);
//! // {"level":"INFO","time":"...","msg":"request done","req":{"id":42,"status":200}}
//! ```

pub mod assemble;
pub mod context;
pub mod encode;
pub mod field;
pub mod handler;
pub mod json;
pub mod level;
pub mod logger;
pub mod merge;
pub mod record;
pub mod sink;
pub mod value;
pub mod writers;

pub use assemble::assemble;
pub use context::Context;
pub use encode::encode;
pub use field::{Field, FieldType, MapObjectEncoder, ObjectEncoder, ObjectMarshaler};
pub use handler::{Handler, HandlerError, HandlerOptions, RecordHandler};
pub use json::{default_sink, JsonSink, JsonSinkConfig, SinkTarget};
pub use level::{Level, LevelVar, Leveler, ParseLevelError};
pub use logger::Logger;
pub use merge::merge_at_path;
pub use record::{Record, Source};
pub use sink::{CheckedEntry, Entry, MemorySink, Sink, SinkError, SinkLevel};
pub use value::{AnyValue, Attr, LazyValueError, LogValuer, Value, ValueKind};
pub use writers::{FileConfig, StdTarget};
