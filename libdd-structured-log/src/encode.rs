// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Conversion of a single attribute into a sink field.

use crate::field::{Field, FieldType, ObjectEncoder, ObjectMarshaler};
use crate::value::{Attr, Value};
use std::sync::Arc;

/// Encodes `attr` as a field.
///
/// Lazy values are resolved first (see [`Value::resolve`]). Groups become
/// object fields whose children are encoded, with this same function, when
/// the sink walks the object. Tombstone children of a group are skipped.
pub fn encode(attr: &Attr) -> Field {
    Field::new(attr.key.as_str(), field_type(&attr.value))
}

fn field_type(value: &Value) -> FieldType {
    match value {
        Value::Any(v) => FieldType::Any(v.clone()),
        Value::Bool(v) => FieldType::Bool(*v),
        Value::Duration(v) => FieldType::Duration(*v),
        Value::F64(v) => FieldType::F64(*v),
        Value::I64(v) => FieldType::I64(*v),
        Value::Str(v) => FieldType::Str(v.clone()),
        Value::Time(v) => FieldType::Time(*v),
        Value::U64(v) => FieldType::U64(*v),
        Value::Group(attrs) => FieldType::Object(Arc::new(GroupMarshaler {
            attrs: Arc::clone(attrs),
        })),
        Value::Lazy(_) => match value.clone().resolve() {
            // `resolve` never returns a lazy value.
            Value::Lazy(_) => FieldType::Any(Default::default()),
            resolved => field_type(&resolved),
        },
    }
}

struct GroupMarshaler {
    attrs: Arc<[Attr]>,
}

impl ObjectMarshaler for GroupMarshaler {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) {
        for attr in self.attrs.iter().filter(|attr| !attr.is_tombstone()) {
            encode(attr).add_to(enc);
        }
    }
}
