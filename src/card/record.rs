//! The translatable-record capability shared by every card variant.
//!
//! A record exposes its fields as borrowed, typed views and points at a
//! static [`Schema`] naming which of those fields carry translatable text.
//! The walker only ever sees these two things, so adding a new document
//! shape means writing a schema and the two accessors below.

use std::fmt;

/// Whether a declared field must be present on every instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// One declared translatable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub presence: Presence,
}

impl FieldDecl {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            presence: Presence::Required,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            presence: Presence::Optional,
        }
    }
}

/// Per-variant schema metadata, declared once as a `static`.
#[derive(Debug)]
pub struct Schema {
    /// Record name used in error messages.
    pub record: &'static str,
    /// Translatable fields, in traversal order.
    pub fields: &'static [FieldDecl],
}

impl Schema {
    /// Iterates the declared field names in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }
}

/// Read-only view of a record field.
#[derive(Debug)]
pub enum FieldRef<'a> {
    Leaf(&'a str),
    Node(&'a dyn Translatable),
    LeafList(&'a [String]),
    NodeList(Vec<&'a dyn Translatable>),
    /// Anything else (flags, numbers, maps); the payload names the kind.
    Opaque(&'static str),
}

impl<'a> FieldRef<'a> {
    /// Returns the text when this is a single leaf.
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            FieldRef::Leaf(text) => Some(*text),
            _ => None,
        }
    }
}

/// Mutable view of a record field.
pub enum FieldMut<'a> {
    Leaf(&'a mut String),
    Node(&'a mut dyn Translatable),
    LeafList(&'a mut [String]),
    NodeList(Vec<&'a mut dyn Translatable>),
    Opaque(&'static str),
}

/// Every field a record exposes, by name. `None` marks an absent optional
/// value.
pub type FieldSlots<V> = Vec<(&'static str, Option<V>)>;

/// A node in the card tree.
pub trait Translatable: fmt::Debug + Send + Sync {
    /// Schema for this record's variant.
    fn schema(&self) -> &'static Schema;

    /// Borrows all fields of the record.
    fn fields(&self) -> FieldSlots<FieldRef<'_>>;

    /// Mutably borrows all fields of the record at once, so that sibling
    /// fields can be rewritten concurrently.
    fn fields_mut(&mut self) -> FieldSlots<FieldMut<'_>>;
}

pub(crate) fn node_refs<T: Translatable>(items: &[T]) -> Vec<&dyn Translatable> {
    items.iter().map(|item| item as &dyn Translatable).collect()
}

pub(crate) fn node_muts<T: Translatable>(items: &mut [T]) -> Vec<&mut dyn Translatable> {
    items
        .iter_mut()
        .map(|item| item as &mut dyn Translatable)
        .collect()
}
