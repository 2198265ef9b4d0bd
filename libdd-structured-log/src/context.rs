// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Values carried along with a log call.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Request-scoped values passed along with every log call.
///
/// Values are keyed by type; storing a second value of the same type replaces
/// the first in the derived context only.
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Context {
    /// An empty context.
    pub fn background() -> Self {
        Self::default()
    }

    /// A copy of this context that also holds `value`.
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut values = HashMap::clone(&self.values);
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self {
            values: Arc::new(values),
        }
    }

    /// The value of type `T`, if one was stored.
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values.len())
            .finish()
    }
}
