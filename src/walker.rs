//! Schema-driven traversal over card records.
//!
//! Every operation here is written once against [`Translatable`] and driven
//! only by the record's [`Schema`]: a record is walked field by field in
//! declaration order, nested records and record lists are recursed into,
//! and text leaves are either inspected or rewritten.
//!
//! Independent branches (sibling fields, sibling list elements) run
//! concurrently inside the caller's task. All branches of a record are
//! joined in one place; when one fails, its siblings are still
//! driven to completion and their results discarded, and the first failure
//! in declaration order is returned. Leaves already rewritten stay
//! rewritten.

use crate::card::{FieldMut, FieldRef, FieldSlots, Presence, Schema, Translatable};
use crate::error::WalkError;
use futures::future::{self, BoxFuture, FutureExt, join_all};
use std::future::Future;

/// One pending piece of a traversal.
pub type Branch<'a, E> = BoxFuture<'a, Result<(), E>>;

impl WalkError {
    fn missing(schema: &Schema, field: &str) -> Self {
        WalkError::MissingField {
            record: schema.record,
            field: field.to_string(),
        }
    }

    fn shape(schema: &Schema, field: &str, found: &'static str) -> Self {
        WalkError::Shape {
            record: schema.record,
            field: field.to_string(),
            found,
        }
    }
}

/// Reads a field by name.
///
/// Never returns [`FieldRef::Opaque`]: a field that isn't text or records is
/// a shape error.
pub fn read<'a>(record: &'a dyn Translatable, name: &str) -> Result<FieldRef<'a>, WalkError> {
    let schema = record.schema();
    let value = record
        .fields()
        .into_iter()
        .find(|(field, _)| *field == name)
        .and_then(|(_, value)| value)
        .ok_or_else(|| WalkError::missing(schema, name))?;

    match value {
        FieldRef::Opaque(found) => Err(WalkError::shape(schema, name, found)),
        value => Ok(value),
    }
}

/// Visits every declared field name in the tree.
///
/// The callback receives field names, not text: a nested record field is
/// recursed into and then reported by its own name.
pub fn visit<'a, F, Fut, E>(record: &'a dyn Translatable, callback: &'a F) -> Branch<'a, E>
where
    F: Fn(&'static str) -> Fut + Sync,
    Fut: Future<Output = Result<(), E>> + Send + 'a,
    E: From<WalkError> + Send + 'a,
{
    match visit_branches(record, callback) {
        Ok(branches) => join_branches(branches).boxed(),
        Err(err) => future::ready(Err(E::from(err))).boxed(),
    }
}

fn visit_branches<'a, F, Fut, E>(
    record: &'a dyn Translatable,
    callback: &'a F,
) -> Result<Vec<Branch<'a, E>>, WalkError>
where
    F: Fn(&'static str) -> Fut + Sync,
    Fut: Future<Output = Result<(), E>> + Send + 'a,
    E: From<WalkError> + Send + 'a,
{
    let schema = record.schema();
    let mut branches = Vec::new();

    for (name, value) in resolve(schema, record.fields())? {
        match value {
            Some(FieldRef::Node(child)) => branches.push(visit(child, callback)),
            Some(FieldRef::NodeList(children)) => {
                branches.extend(children.into_iter().map(|child| visit(child, callback)));
            }
            Some(FieldRef::Opaque(found)) => return Err(WalkError::shape(schema, name, found)),
            Some(FieldRef::Leaf(_)) | Some(FieldRef::LeafList(_)) | None => {}
        }
        branches.push(callback(name).boxed());
    }

    Ok(branches)
}

/// Rewrites every translatable text leaf in the tree with `callback`.
///
/// Blank strings, blank list elements and empty lists are never passed to
/// the callback. List elements are written back to their own positions.
pub fn replace<'a, F, Fut, E>(record: &'a mut dyn Translatable, callback: &'a F) -> Branch<'a, E>
where
    F: Fn(String) -> Fut + Sync,
    Fut: Future<Output = Result<String, E>> + Send + 'a,
    E: From<WalkError> + Send + 'a,
{
    match replace_branches(record, callback) {
        Ok(branches) => join_branches(branches).boxed(),
        Err(err) => future::ready(Err(E::from(err))).boxed(),
    }
}

fn replace_branches<'a, F, Fut, E>(
    record: &'a mut dyn Translatable,
    callback: &'a F,
) -> Result<Vec<Branch<'a, E>>, WalkError>
where
    F: Fn(String) -> Fut + Sync,
    Fut: Future<Output = Result<String, E>> + Send + 'a,
    E: From<WalkError> + Send + 'a,
{
    let schema = record.schema();
    let mut branches = Vec::new();

    for (name, value) in resolve(schema, record.fields_mut())? {
        match value {
            Some(FieldMut::Node(child)) => branches.push(replace(child, callback)),
            Some(FieldMut::Leaf(text)) => branches.extend(replace_leaf(text, callback)),
            Some(FieldMut::NodeList(children)) => {
                branches.extend(children.into_iter().map(|child| replace(child, callback)));
            }
            Some(FieldMut::LeafList(items)) => {
                branches.extend(items.into_iter().filter_map(|item| replace_leaf(item, callback)));
            }
            Some(FieldMut::Opaque(found)) => return Err(WalkError::shape(schema, name, found)),
            None => {}
        }
    }

    Ok(branches)
}

fn replace_leaf<'a, F, Fut, E>(slot: &'a mut String, callback: &'a F) -> Option<Branch<'a, E>>
where
    F: Fn(String) -> Fut + Sync,
    Fut: Future<Output = Result<String, E>> + Send + 'a,
    E: Send + 'a,
{
    if slot.trim().is_empty() {
        return None;
    }

    let text = slot.clone();
    Some(
        async move {
            *slot = callback(text).await?;
            Ok::<(), E>(())
        }
        .boxed(),
    )
}

/// Pairs each declared field with the record's value for it, in
/// declaration order. Absent optional fields come back as `None`.
fn resolve<V>(
    schema: &'static Schema,
    mut slots: FieldSlots<V>,
) -> Result<Vec<(&'static str, Option<V>)>, WalkError> {
    schema
        .fields
        .iter()
        .map(|decl| {
            let index = slots
                .iter()
                .position(|(name, _)| *name == decl.name)
                .ok_or_else(|| WalkError::missing(schema, decl.name))?;
            let (_, value) = slots.swap_remove(index);

            if value.is_none() && decl.presence == Presence::Required {
                return Err(WalkError::missing(schema, decl.name));
            }
            Ok((decl.name, value))
        })
        .collect()
}

/// Joins sibling branches.
///
/// Fan-out is unbounded here; callers that need a ceiling on in-flight
/// work apply it inside their callback.
async fn join_branches<E>(branches: Vec<Branch<'_, E>>) -> Result<(), E> {
    join_all(branches).await.into_iter().collect()
}

/// Tree operations available on every record type.
pub trait TreeWalk: Translatable + Sized {
    /// See [`read`].
    fn read_field(&self, name: &str) -> Result<FieldRef<'_>, WalkError> {
        read(self, name)
    }

    /// See [`visit`].
    fn visit_fields<'a, F, Fut, E>(&'a self, callback: &'a F) -> Branch<'a, E>
    where
        F: Fn(&'static str) -> Fut + Sync,
        Fut: Future<Output = Result<(), E>> + Send + 'a,
        E: From<WalkError> + Send + 'a,
    {
        visit(self, callback)
    }

    /// See [`replace`].
    fn replace_leaves<'a, F, Fut, E>(&'a mut self, callback: &'a F) -> Branch<'a, E>
    where
        F: Fn(String) -> Fut + Sync,
        Fut: Future<Output = Result<String, E>> + Send + 'a,
        E: From<WalkError> + Send + 'a,
    {
        replace(self, callback)
    }
}

impl<T: Translatable> TreeWalk for T {}
