// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Insertion of attributes under a group path.

use crate::value::{Attr, Value};

/// Returns a copy of `base` with `new_attrs` appended, in order, to the group
/// reached by following `path`.
///
/// Missing groups along the path are created and appended at their level. When
/// several groups at one level share the wanted name, only the first one is
/// descended into. `base` itself is never modified, so lists shared by other
/// handlers stay valid.
pub fn merge_at_path<S: AsRef<str>>(path: &[S], base: &[Attr], new_attrs: &[Attr]) -> Vec<Attr> {
    let Some((head, rest)) = path.split_first() else {
        let mut merged = Vec::with_capacity(base.len() + new_attrs.len());
        merged.extend_from_slice(base);
        merged.extend_from_slice(new_attrs);
        return merged;
    };
    let name = head.as_ref();

    let mut merged = base.to_vec();
    match base
        .iter()
        .position(|attr| attr.group_named(name).is_some())
    {
        Some(index) => {
            let children = base[index].value.as_group().unwrap_or_default();
            merged[index].value = Value::from(merge_at_path(rest, children, new_attrs));
        }
        None => merged.push(Attr::new(name, merge_at_path(rest, &[], new_attrs))),
    }
    merged
}
