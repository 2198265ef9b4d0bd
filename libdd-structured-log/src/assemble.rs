// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Flattening of a handler's attribute tree into an ordered field stream.

use crate::context::Context;
use crate::encode::encode;
use crate::field::Field;
use crate::record::Record;
use crate::value::Attr;

/// Rewrites an attribute before it is encoded. Receives the names of the
/// groups enclosing the attribute. Returning a tombstone drops the attribute.
pub type ReplaceAttr<'a> = &'a (dyn Fn(&[String], Attr) -> Attr + Send + Sync);

/// Extracts extra attributes from the context of a call.
pub type AttrsFromCtx<'a> = &'a (dyn Fn(&Context) -> Vec<Attr> + Send + Sync);

/// Produces the fields of one log call.
///
/// Every group in `groups` opens a namespace, followed by the stored
/// attributes of that group. A stored child group that is itself the next
/// path segment is not emitted in place; its attributes follow the next
/// namespace instead. Ungrouped stored attributes are emitted only when no
/// group is open. The record's attributes come next, then those extracted
/// from `ctx`.
///
/// Tombstones are skipped before and after `replace`, whatever their source.
pub fn assemble(
    ctx: &Context,
    groups: &[String],
    stored: &[Attr],
    replace: ReplaceAttr<'_>,
    attrs_from_ctx: Option<AttrsFromCtx<'_>>,
    record: &Record,
) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut traversed: Vec<String> = Vec::with_capacity(groups.len());
    let mut working: Vec<&Attr> = stored.iter().collect();

    if !groups.is_empty() {
        for (i, name) in groups.iter().enumerate() {
            traversed.push(name.clone());
            fields.push(Field::namespace(name.as_str()));

            let Some(children) = working
                .iter()
                .copied()
                .find_map(|attr| attr.group_named(name))
            else {
                continue;
            };

            let next = groups.get(i + 1);
            for child in children {
                if child.is_tombstone() {
                    continue;
                }
                if next.is_some_and(|next| child.group_named(next).is_some()) {
                    working.insert(0, child);
                    continue;
                }
                push_field(&mut fields, &traversed, child, replace);
            }
        }

        working.clear();
    }

    for attr in working {
        push_field(&mut fields, &traversed, attr, replace);
    }

    for attr in record.attrs() {
        push_field(&mut fields, &traversed, attr, replace);
    }

    if let Some(attrs_from_ctx) = attrs_from_ctx {
        for attr in &attrs_from_ctx(ctx) {
            push_field(&mut fields, &traversed, attr, replace);
        }
    }

    fields
}

fn push_field(fields: &mut Vec<Field>, groups: &[String], attr: &Attr, replace: ReplaceAttr<'_>) {
    if attr.is_tombstone() {
        return;
    }
    let attr = replace(groups, attr.clone());
    if attr.is_tombstone() {
        return;
    }
    fields.push(encode(&attr));
}
