// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Attribute and value model of the logging front end.
//!
//! An [`Attr`] pairs a key with a [`Value`]. Groups are attributes whose value
//! is [`Value::Group`]; nesting is expressed by groups containing groups.

use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Maximum number of lazy layers resolved for a single value.
pub const MAX_LAZY_DEPTH: usize = 100;

/// A value computed only when the attribute holding it is encoded.
///
/// Closures returning a [`Value`] implement this trait.
pub trait LogValuer: Send + Sync {
    /// Computes the value. May itself return a lazy value.
    fn log_value(&self) -> Value;
}

impl<F> LogValuer for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn log_value(&self) -> Value {
        self()
    }
}

impl fmt::Debug for dyn LogValuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogValuer")
    }
}

/// Opaque value, rendered by the sink through its `Debug` representation.
#[derive(Clone)]
pub struct AnyValue(Arc<dyn fmt::Debug + Send + Sync>);

impl AnyValue {
    /// Wraps `value`.
    pub fn new<T>(value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(value))
    }

    /// The wrapped value.
    pub fn as_debug(&self) -> &(dyn fmt::Debug + Send + Sync) {
        &*self.0
    }

    fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for AnyValue {
    fn default() -> Self {
        Self::new(())
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Discriminant of a [`Value`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Any`].
    Any,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Duration`].
    Duration,
    /// [`Value::F64`].
    F64,
    /// [`Value::I64`].
    I64,
    /// [`Value::Str`].
    Str,
    /// [`Value::Time`].
    Time,
    /// [`Value::U64`].
    U64,
    /// [`Value::Group`].
    Group,
    /// [`Value::Lazy`].
    Lazy,
}

/// Typed value of an attribute.
#[derive(Clone, Debug)]
pub enum Value {
    /// Opaque value without a native encoding.
    Any(AnyValue),
    /// Boolean.
    Bool(bool),
    /// Elapsed time.
    Duration(Duration),
    /// Floating point number.
    F64(f64),
    /// Signed integer.
    I64(i64),
    /// String.
    Str(String),
    /// Point in time.
    Time(DateTime<Utc>),
    /// Unsigned integer.
    U64(u64),
    /// Ordered children of a group. Keys are unique by convention only.
    Group(Arc<[Attr]>),
    /// Deferred computation, resolved at encode time.
    Lazy(Arc<dyn LogValuer>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Any(AnyValue::default())
    }
}

impl Value {
    /// Opaque value rendered through its `Debug` output.
    pub fn any<T>(value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        Value::Any(AnyValue::new(value))
    }

    /// Group holding `attrs` in order.
    pub fn group(attrs: impl IntoIterator<Item = Attr>) -> Self {
        Value::Group(attrs.into_iter().collect())
    }

    /// Value computed by `valuer` when encoded.
    pub fn lazy(valuer: impl LogValuer + 'static) -> Self {
        Value::Lazy(Arc::new(valuer))
    }

    /// Discriminant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Any(_) => ValueKind::Any,
            Value::Bool(_) => ValueKind::Bool,
            Value::Duration(_) => ValueKind::Duration,
            Value::F64(_) => ValueKind::F64,
            Value::I64(_) => ValueKind::I64,
            Value::Str(_) => ValueKind::Str,
            Value::Time(_) => ValueKind::Time,
            Value::U64(_) => ValueKind::U64,
            Value::Group(_) => ValueKind::Group,
            Value::Lazy(_) => ValueKind::Lazy,
        }
    }

    /// Children of a group value, `None` for every other kind.
    pub fn as_group(&self) -> Option<&[Attr]> {
        match self {
            Value::Group(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Resolves lazy layers until a concrete value is reached.
    ///
    /// At most [`MAX_LAZY_DEPTH`] layers are evaluated. A chain that is still
    /// lazy after that, or a computation that panics, resolves to an opaque
    /// `!ERROR:` marker instead. Only the top level is resolved: lazy values
    /// nested in groups are resolved when the group itself is encoded.
    pub fn resolve(self) -> Value {
        let mut value = self;
        for _ in 0..MAX_LAZY_DEPTH {
            let Value::Lazy(valuer) = value else {
                return value;
            };
            value = match panic::catch_unwind(AssertUnwindSafe(|| valuer.log_value())) {
                Ok(resolved) => resolved,
                Err(payload) => {
                    return LazyValueError::Panicked(panic_message(payload.as_ref())).into_value()
                }
            };
        }
        match value {
            Value::Lazy(_) => LazyValueError::TooDeep {
                depth: MAX_LAZY_DEPTH,
            }
            .into_value(),
            resolved => resolved,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Structural equality. Opaque and lazy values compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Any(a), Value::Any(b)) => a.ptr_eq(b),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::Group(a), Value::Group(b)) => a == b,
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Failure to resolve a lazy value. Only the affected field is replaced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LazyValueError {
    /// The chain was still lazy after `depth` layers.
    #[error("lazy value still unresolved after {depth} layers")]
    TooDeep {
        /// Number of layers evaluated.
        depth: usize,
    },
    /// A computation panicked with the given message.
    #[error("lazy value panicked: {0}")]
    Panicked(String),
}

impl LazyValueError {
    fn into_value(self) -> Value {
        tracing::warn!(error = %self, "Failed to resolve lazy log value");
        Value::any(ErrorMarker(self))
    }
}

struct ErrorMarker(LazyValueError);

impl fmt::Debug for ErrorMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!ERROR:{}", self.0)
    }
}

/// A key paired with a [`Value`].
///
/// An attribute with an empty key is a tombstone and is never emitted.
/// [`Attr::default`], the zero attribute, has an empty key, so "empty key" and
/// "equal to the zero attribute" are the same condition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attr {
    /// Attribute name. Empty for tombstones.
    pub key: String,
    /// Attribute value.
    pub value: Value,
}

impl Attr {
    /// An attribute converting `value` with [`Value::from`].
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A group attribute, see [`Value::group`].
    pub fn group(key: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) -> Self {
        Self::new(key, Value::group(attrs))
    }

    /// A lazy attribute, see [`Value::lazy`].
    pub fn lazy(key: impl Into<String>, valuer: impl LogValuer + 'static) -> Self {
        Self::new(key, Value::lazy(valuer))
    }

    /// An opaque attribute, see [`Value::any`].
    pub fn any<T>(key: impl Into<String>, value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        Self::new(key, Value::any(value))
    }

    /// Whether this attribute is skipped everywhere.
    pub fn is_tombstone(&self) -> bool {
        self.key.is_empty()
    }

    /// Children of this attribute if it is a group keyed `name`.
    pub fn group_named(&self, name: &str) -> Option<&[Attr]> {
        if self.key == name {
            self.value.as_group()
        } else {
            None
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i8 => I64,
    i16 => I64,
    i32 => I64,
    i64 => I64,
    u8 => U64,
    u16 => U64,
    u32 => U64,
    u64 => U64,
    f32 => F64,
    f64 => F64,
    String => Str,
    &str => Str,
    Duration => Duration,
    DateTime<Utc> => Time,
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::U64(value as u64)
    }
}

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Value::I64(value as i64)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(attrs: Vec<Attr>) -> Self {
        Value::Group(attrs.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_attr_is_tombstone() {
        assert!(Attr::default().is_tombstone());
        assert!(Attr::new("", 1).is_tombstone());
        assert!(!Attr::new("k", Value::default()).is_tombstone());
    }

    #[test]
    fn kinds_follow_conversions() {
        assert_eq!(Value::from(true).kind(), ValueKind::Bool);
        assert_eq!(Value::from(-3i32).kind(), ValueKind::I64);
        assert_eq!(Value::from(3u32).kind(), ValueKind::U64);
        assert_eq!(Value::from(1.5f32).kind(), ValueKind::F64);
        assert_eq!(Value::from("s").kind(), ValueKind::Str);
        assert_eq!(Value::from(Duration::from_secs(1)).kind(), ValueKind::Duration);
        assert_eq!(Value::from(Utc::now()).kind(), ValueKind::Time);
        assert_eq!(Value::from(vec![Attr::new("a", 1)]).kind(), ValueKind::Group);
        assert_eq!(Value::lazy(|| Value::from(1)).kind(), ValueKind::Lazy);
        assert_eq!(Value::default().kind(), ValueKind::Any);
    }

    #[test]
    fn resolve_walks_chained_lazy_values() {
        let value = Value::lazy(|| Value::lazy(|| Value::lazy(|| Value::from("done"))));
        assert_eq!(value.resolve(), Value::Str("done".to_owned()));
    }

    #[test]
    fn resolve_leaves_concrete_values_untouched() {
        assert_eq!(Value::from(7u64).resolve(), Value::U64(7));
    }

    struct Forever;

    impl LogValuer for Forever {
        fn log_value(&self) -> Value {
            Value::lazy(Forever)
        }
    }

    #[test]
    fn resolve_bounds_endless_chains() {
        let resolved = Value::lazy(Forever).resolve();
        let Value::Any(marker) = resolved else {
            panic!("expected an error marker, got {resolved:?}");
        };
        assert_eq!(
            format!("{marker:?}"),
            "!ERROR:lazy value still unresolved after 100 layers"
        );
    }

    #[test]
    fn resolve_accepts_exactly_max_depth_layers() {
        fn chain(depth: usize) -> Value {
            if depth == 0 {
                Value::from(1)
            } else {
                Value::lazy(move || chain(depth - 1))
            }
        }
        assert_eq!(chain(MAX_LAZY_DEPTH).resolve(), Value::I64(1));
    }

    #[test]
    fn resolve_turns_panics_into_markers() {
        let resolved = Value::lazy(|| -> Value { panic!("boom") }).resolve();
        assert_eq!(format!("{resolved:?}"), "Any(!ERROR:lazy value panicked: boom)");
    }

    #[test]
    fn group_named_requires_group_kind() {
        let group = Attr::group("req", [Attr::new("id", 1)]);
        assert_eq!(group.group_named("req").map(<[Attr]>::len), Some(1));
        assert!(group.group_named("other").is_none());
        assert!(Attr::new("req", 1).group_named("req").is_none());
    }
}
