// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Flat field model understood by sinks.
//!
//! A sink receives an ordered list of [`Field`]s. A [`FieldType::Namespace`]
//! field scopes every field written after it, until the next namespace or the
//! end of the entry. Nested structure inside a single field is expressed with
//! [`FieldType::Object`], whose content is produced by an [`ObjectMarshaler`]
//! during the sink's encoding pass.

use crate::value::AnyValue;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Receiver of named, typed values.
pub trait ObjectEncoder {
    /// Adds a boolean.
    fn add_bool(&mut self, key: &str, value: bool);
    /// Adds a signed integer.
    fn add_i64(&mut self, key: &str, value: i64);
    /// Adds an unsigned integer.
    fn add_u64(&mut self, key: &str, value: u64);
    /// Adds a float; non-finite values are allowed.
    fn add_f64(&mut self, key: &str, value: f64);
    /// Adds a string.
    fn add_str(&mut self, key: &str, value: &str);
    /// Adds an elapsed time.
    fn add_duration(&mut self, key: &str, value: Duration);
    /// Adds a point in time.
    fn add_time(&mut self, key: &str, value: DateTime<Utc>);
    /// Opaque value with no native representation in the encoder.
    fn add_reflected(&mut self, key: &str, value: &dyn fmt::Debug);
    /// Adds a nested object filled by `value`.
    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler);
    /// Scopes all subsequently added values under `key`.
    fn open_namespace(&mut self, key: &str);
}

/// Writes the content of an object field into an encoder.
pub trait ObjectMarshaler: Send + Sync {
    /// Adds the object's members to `enc`.
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder);
}

impl fmt::Debug for dyn ObjectMarshaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ObjectMarshaler")
    }
}

/// Payload of a [`Field`].
#[derive(Clone, Debug)]
pub enum FieldType {
    /// Opens a scope named after the field key.
    Namespace,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    I64(i64),
    /// Unsigned integer.
    U64(u64),
    /// Floating point number.
    F64(f64),
    /// String.
    Str(String),
    /// Elapsed time.
    Duration(Duration),
    /// Point in time.
    Time(DateTime<Utc>),
    /// Opaque value.
    Any(AnyValue),
    /// Nested object written by a marshaler.
    Object(Arc<dyn ObjectMarshaler>),
}

/// One entry of the flat field stream handed to a sink.
#[derive(Clone, Debug)]
pub struct Field {
    /// Field name, or namespace name.
    pub key: String,
    /// Payload.
    pub ty: FieldType,
}

impl Field {
    /// A field named `key`.
    pub fn new(key: impl Into<String>, ty: FieldType) -> Self {
        Self {
            key: key.into(),
            ty,
        }
    }

    /// A namespace marker.
    pub fn namespace(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Namespace)
    }

    /// Whether this field is a namespace marker.
    pub fn is_namespace(&self) -> bool {
        matches!(self.ty, FieldType::Namespace)
    }

    /// Writes this field into `enc`.
    pub fn add_to(&self, enc: &mut dyn ObjectEncoder) {
        let key = self.key.as_str();
        match &self.ty {
            FieldType::Namespace => enc.open_namespace(key),
            FieldType::Bool(v) => enc.add_bool(key, *v),
            FieldType::I64(v) => enc.add_i64(key, *v),
            FieldType::U64(v) => enc.add_u64(key, *v),
            FieldType::F64(v) => enc.add_f64(key, *v),
            FieldType::Str(v) => enc.add_str(key, v),
            FieldType::Duration(v) => enc.add_duration(key, *v),
            FieldType::Time(v) => enc.add_time(key, *v),
            FieldType::Any(v) => enc.add_reflected(key, v.as_debug()),
            FieldType::Object(v) => enc.add_object(key, v.as_ref()),
        }
    }
}

/// [`ObjectEncoder`] building a JSON object in memory.
///
/// Durations are written as integer nanoseconds and timestamps as RFC 3339
/// strings with nanosecond precision. Opaque values use their `Debug` output.
/// A key written twice in the same scope keeps its first position and the
/// last value.
#[derive(Debug, Default)]
pub struct MapObjectEncoder {
    /// Open scopes; the first entry is the root object.
    scopes: Vec<(String, Map<String, JsonValue>)>,
}

impl MapObjectEncoder {
    /// An encoder with an empty root object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `fields` in order into a fresh object.
    pub fn encode_fields(fields: &[Field]) -> Map<String, JsonValue> {
        let mut enc = Self::new();
        for field in fields {
            field.add_to(&mut enc);
        }
        enc.into_map()
    }

    /// Closes all open namespaces and returns the root object.
    pub fn into_map(mut self) -> Map<String, JsonValue> {
        let Some((mut key, mut closed)) = self.scopes.pop() else {
            return Map::new();
        };
        // Each scope is stored in its parent under its own key.
        while let Some((parent_key, mut parent)) = self.scopes.pop() {
            parent.insert(key, JsonValue::Object(closed));
            key = parent_key;
            closed = parent;
        }
        closed
    }

    fn insert(&mut self, key: &str, value: JsonValue) {
        if self.scopes.is_empty() {
            self.scopes.push((String::new(), Map::new()));
        }
        if let Some((_, map)) = self.scopes.last_mut() {
            map.insert(key.to_owned(), value);
        }
    }
}

fn duration_nanos(value: Duration) -> i64 {
    i64::try_from(value.as_nanos()).unwrap_or(i64::MAX)
}

fn float_value(value: f64) -> JsonValue {
    match Number::from_f64(value) {
        Some(n) => JsonValue::Number(n),
        None if value.is_nan() => JsonValue::String("NaN".to_owned()),
        None if value.is_sign_positive() => JsonValue::String("+Inf".to_owned()),
        None => JsonValue::String("-Inf".to_owned()),
    }
}

pub(crate) fn rfc3339_nanos(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

impl ObjectEncoder for MapObjectEncoder {
    fn add_bool(&mut self, key: &str, value: bool) {
        self.insert(key, JsonValue::Bool(value));
    }

    fn add_i64(&mut self, key: &str, value: i64) {
        self.insert(key, value.into());
    }

    fn add_u64(&mut self, key: &str, value: u64) {
        self.insert(key, value.into());
    }

    fn add_f64(&mut self, key: &str, value: f64) {
        self.insert(key, float_value(value));
    }

    fn add_str(&mut self, key: &str, value: &str) {
        self.insert(key, JsonValue::String(value.to_owned()));
    }

    fn add_duration(&mut self, key: &str, value: Duration) {
        self.insert(key, duration_nanos(value).into());
    }

    fn add_time(&mut self, key: &str, value: DateTime<Utc>) {
        self.insert(key, JsonValue::String(rfc3339_nanos(value)));
    }

    fn add_reflected(&mut self, key: &str, value: &dyn fmt::Debug) {
        self.insert(key, JsonValue::String(format!("{value:?}")));
    }

    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) {
        let mut nested = MapObjectEncoder::new();
        value.marshal_log_object(&mut nested);
        self.insert(key, JsonValue::Object(nested.into_map()));
    }

    fn open_namespace(&mut self, key: &str) {
        if self.scopes.is_empty() {
            self.scopes.push((String::new(), Map::new()));
        }
        self.scopes.push((key.to_owned(), Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Pair;

    impl ObjectMarshaler for Pair {
        fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) {
            enc.add_str("left", "l");
            enc.add_u64("right", 2);
        }
    }

    #[test]
    fn namespaces_scope_following_fields() {
        let fields = [
            Field::new("top", FieldType::Bool(true)),
            Field::namespace("a"),
            Field::new("x", FieldType::I64(-1)),
            Field::namespace("b"),
            Field::new("y", FieldType::Str("z".to_owned())),
        ];
        let map = MapObjectEncoder::encode_fields(&fields);
        assert_eq!(
            JsonValue::Object(map),
            json!({"top": true, "a": {"x": -1, "b": {"y": "z"}}})
        );
    }

    #[test]
    fn closed_scopes_keep_their_own_keys() {
        let mut enc = MapObjectEncoder::new();
        enc.open_namespace("outer");
        enc.add_i64("a", 1);
        enc.open_namespace("inner");
        enc.open_namespace("leaf");
        enc.add_bool("b", false);
        assert_eq!(
            JsonValue::Object(enc.into_map()),
            json!({"outer": {"a": 1, "inner": {"leaf": {"b": false}}}})
        );
    }

    #[test]
    fn empty_namespace_is_kept() {
        let map = MapObjectEncoder::encode_fields(&[Field::namespace("empty")]);
        assert_eq!(JsonValue::Object(map), json!({"empty": {}}));
    }

    #[test]
    fn objects_and_special_values() {
        let time = DateTime::parse_from_rfc3339("2024-05-01T10:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let fields = [
            Field::new("pair", FieldType::Object(Arc::new(Pair))),
            Field::new("nan", FieldType::F64(f64::NAN)),
            Field::new("inf", FieldType::F64(f64::NEG_INFINITY)),
            Field::new("elapsed", FieldType::Duration(Duration::from_millis(3))),
            Field::new("at", FieldType::Time(time)),
            Field::new("opaque", FieldType::Any(AnyValue::new(vec![1, 2]))),
        ];
        let map = MapObjectEncoder::encode_fields(&fields);
        assert_eq!(
            JsonValue::Object(map),
            json!({
                "pair": {"left": "l", "right": 2},
                "nan": "NaN",
                "inf": "-Inf",
                "elapsed": 3_000_000,
                "at": "2024-05-01T10:00:00.500000000Z",
                "opaque": "[1, 2]",
            })
        );
    }

    #[test]
    fn key_order_is_preserved() {
        let fields = [
            Field::new("b", FieldType::U64(1)),
            Field::new("a", FieldType::U64(2)),
        ];
        let map = MapObjectEncoder::encode_fields(&fields);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
