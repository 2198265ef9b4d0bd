// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Default sink writing one JSON object per entry.

use crate::field::{rfc3339_nanos, Field, MapObjectEncoder};
use crate::sink::{CheckedEntry, Entry, Sink, SinkError, SinkLevel};
use crate::writers::{FileConfig, RotatingFileWriter, StdTarget, StdWriter};
use serde_json::Value as JsonValue;
use std::env;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Environment variable overriding the minimum level of
/// [`JsonSinkConfig::from_env`].
pub const LOG_LEVEL_ENV: &str = "DD_LOG_LEVEL";

/// Where a [`JsonSink`] writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    /// Standard output or standard error.
    Std(StdTarget),
    /// A file, optionally rotated.
    File(FileConfig),
}

/// Configuration of a [`JsonSink`].
///
/// The defaults write `INFO` and above to stderr using the keys `time`,
/// `level`, `msg` and `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSinkConfig {
    /// Output destination.
    pub target: SinkTarget,
    /// Minimum level written.
    pub level: SinkLevel,
    /// Key of the entry time.
    pub time_key: String,
    /// Key of the entry level.
    pub level_key: String,
    /// Key of the message.
    pub message_key: String,
    /// Key of the call site.
    pub caller_key: String,
}

impl Default for JsonSinkConfig {
    fn default() -> Self {
        Self {
            target: SinkTarget::Std(StdTarget::Err),
            level: SinkLevel::Info,
            time_key: "time".to_owned(),
            level_key: "level".to_owned(),
            message_key: "msg".to_owned(),
            caller_key: "source".to_owned(),
        }
    }
}

impl JsonSinkConfig {
    /// Defaults, with the level taken from `DD_LOG_LEVEL` when it is set.
    pub fn from_env() -> Result<Self, SinkError> {
        let mut config = Self::default();
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            config.level = level.trim().parse()?;
        }
        Ok(config)
    }
}

/// Writes entries as JSON lines.
///
/// Each line starts with the level, time, source (when known) and message,
/// followed by the fields in order. Namespace fields open nested objects that
/// hold every later field of the entry.
pub struct JsonSink {
    level: SinkLevel,
    keys: JsonSinkConfig,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonSink {
    /// Builds a sink writing to the target named in `config`.
    pub fn new(config: JsonSinkConfig) -> io::Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            SinkTarget::Std(target) => Box::new(StdWriter::new(*target)),
            SinkTarget::File(file) => Box::new(RotatingFileWriter::new(file)?),
        };
        Ok(Self::with_writer(writer, config))
    }

    /// Builds a sink writing to `writer`; `config.target` is ignored.
    pub fn with_writer(writer: impl Write + Send + 'static, config: JsonSinkConfig) -> Self {
        Self {
            level: config.level,
            keys: config,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Serializes one entry as a JSON line.
    ///
    /// The header members are written first and the root-level fields after
    /// them, so a field named like a header key appears twice instead of
    /// replacing it.
    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Vec<u8>, SinkError> {
        let mut line = vec![b'{'];
        let mut header = vec![
            (&self.keys.level_key, JsonValue::from(entry.level.as_str())),
            (&self.keys.time_key, JsonValue::from(rfc3339_nanos(entry.time))),
        ];
        if let Some(caller) = &entry.caller {
            header.push((&self.keys.caller_key, JsonValue::from(caller.to_string())));
        }
        header.push((&self.keys.message_key, JsonValue::from(entry.message.as_str())));
        for (key, value) in &header {
            write_member(&mut line, key, value)?;
        }
        for (key, value) in &MapObjectEncoder::encode_fields(fields) {
            write_member(&mut line, key, value)?;
        }
        line.extend_from_slice(b"}\n");
        Ok(line)
    }
}

fn write_member(line: &mut Vec<u8>, key: &str, value: &JsonValue) -> Result<(), SinkError> {
    if line.len() > 1 {
        line.push(b',');
    }
    serde_json::to_writer(&mut *line, key).map_err(|e| SinkError::Encode(e.to_string()))?;
    line.push(b':');
    serde_json::to_writer(&mut *line, value).map_err(|e| SinkError::Encode(e.to_string()))
}

impl Sink for JsonSink {
    fn check(&self, entry: Entry) -> Option<CheckedEntry> {
        (entry.level >= self.level).then(|| CheckedEntry::new(entry))
    }

    fn write(&self, entry: CheckedEntry, fields: &[Field]) -> Result<(), SinkError> {
        let line = self.encode_entry(entry.entry(), fields)?;
        self.writer
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .write_all(&line)?;
        Ok(())
    }

    fn sync(&self) -> Result<(), SinkError> {
        self.writer.lock().map_err(|_| SinkError::Poisoned)?.flush()?;
        Ok(())
    }
}

/// JSON lines on stderr, `INFO` and above.
pub fn default_sink() -> Arc<dyn Sink> {
    Arc::new(JsonSink::with_writer(
        StdWriter::new(StdTarget::Err),
        JsonSinkConfig::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use crate::record::Source;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    /// Shared buffer so tests can read what the sink wrote.
    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn raw(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }

        fn lines(&self) -> Vec<JsonValue> {
            self.raw()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn entry(level: SinkLevel, caller: Option<Source>) -> Entry {
        Entry {
            level,
            time: DateTime::parse_from_rfc3339("2024-05-01T10:00:00.123456789Z")
                .unwrap()
                .with_timezone(&Utc),
            message: "request done".to_owned(),
            caller,
        }
    }

    #[test]
    fn writes_header_then_fields() {
        let buffer = Buffer::default();
        let sink = JsonSink::with_writer(buffer.clone(), JsonSinkConfig::default());
        let caller = Source {
            file: "src/main.rs".to_owned(),
            line: 12,
            column: 5,
        };
        let checked = sink.check(entry(SinkLevel::Warn, Some(caller))).unwrap();
        let fields = [
            Field::namespace("req"),
            Field::new("id", FieldType::I64(42)),
            Field::new("status", FieldType::U64(200)),
        ];
        sink.write(checked, &fields).unwrap();
        sink.sync().unwrap();

        let lines = buffer.lines();
        assert_eq!(
            lines,
            [json!({
                "level": "WARN",
                "time": "2024-05-01T10:00:00.123456789Z",
                "source": "src/main.rs:12",
                "msg": "request done",
                "req": {"id": 42, "status": 200},
            })]
        );
        let keys: Vec<_> = lines[0].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["level", "time", "source", "msg", "req"]);
    }

    #[test]
    fn fields_never_replace_header_members() {
        let buffer = Buffer::default();
        let sink = JsonSink::with_writer(buffer.clone(), JsonSinkConfig::default());
        let checked = sink.check(entry(SinkLevel::Error, None)).unwrap();
        let fields = [
            Field::new("msg", FieldType::Str("user".to_owned())),
            Field::new("level", FieldType::Str("x".to_owned())),
        ];
        sink.write(checked, &fields).unwrap();

        assert_eq!(
            buffer.raw(),
            concat!(
                r#"{"level":"ERROR","time":"2024-05-01T10:00:00.123456789Z","#,
                r#""msg":"request done","msg":"user","level":"x"}"#,
                "\n"
            )
        );
    }

    #[test]
    fn custom_keys_and_level() {
        let buffer = Buffer::default();
        let config = JsonSinkConfig {
            level: SinkLevel::Error,
            message_key: "message".to_owned(),
            level_key: "severity".to_owned(),
            ..Default::default()
        };
        let sink = JsonSink::with_writer(buffer.clone(), config);
        assert!(sink.check(entry(SinkLevel::Warn, None)).is_none());

        let checked = sink.check(entry(SinkLevel::Error, None)).unwrap();
        sink.write(checked, &[]).unwrap();
        let line = &buffer.lines()[0];
        assert_eq!(line["severity"], "ERROR");
        assert_eq!(line["message"], "request done");
        assert!(line.get("source").is_none());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn file_target() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sink.log");
        let sink = JsonSink::new(JsonSinkConfig {
            target: SinkTarget::File(FileConfig {
                path: path.clone(),
                max_size_bytes: 0,
                max_files: 0,
            }),
            ..Default::default()
        })
        .unwrap();

        let checked = sink.check(entry(SinkLevel::Info, None)).unwrap();
        sink.write(checked, &[Field::new("ok", FieldType::Bool(true))])
            .unwrap();
        sink.sync().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let line: JsonValue = serde_json::from_str(content.trim_end()).unwrap();
        assert_eq!(line["ok"], true);
    }

    #[test]
    fn from_env_reads_level() {
        // Only this test touches the variable.
        env::set_var(LOG_LEVEL_ENV, "debug");
        let config = JsonSinkConfig::from_env();
        env::set_var(LOG_LEVEL_ENV, "chatty");
        let invalid = JsonSinkConfig::from_env();
        env::remove_var(LOG_LEVEL_ENV);

        assert_eq!(config.unwrap().level, SinkLevel::Debug);
        assert!(matches!(invalid, Err(SinkError::InvalidLevel(_))));
        assert_eq!(JsonSinkConfig::from_env().unwrap(), JsonSinkConfig::default());
    }
}
