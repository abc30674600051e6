//! Lore book ("character book") and its entries.

use super::record::{
    FieldDecl, FieldMut, FieldRef, FieldSlots, Schema, Translatable, node_muts, node_refs,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub static BOOK_SCHEMA: Schema = Schema {
    record: "CharacterBook",
    fields: &[
        FieldDecl::optional("name"),
        FieldDecl::optional("description"),
        FieldDecl::required("entries"),
    ],
};

pub static ENTRY_SCHEMA: Schema = Schema {
    record: "CharacterBookEntry",
    fields: &[
        FieldDecl::required("keys"),
        FieldDecl::optional("secondary_keys"),
        FieldDecl::required("content"),
    ],
};

/// Where an entry is inserted relative to the character definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPosition {
    BeforeChar,
    AfterChar,
}

/// A lore book embedded in a V2 card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_depth: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive_scanning: Option<bool>,
    pub extensions: Map<String, Value>,
    pub entries: Vec<CharacterBookEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One lore entry: trigger keys plus the text injected when they match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterBookEntry {
    pub keys: Vec<String>,
    pub content: String,
    pub extensions: Map<String, Value>,
    pub enabled: bool,
    pub insertion_order: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<EntryPosition>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Translatable for CharacterBook {
    fn schema(&self) -> &'static Schema {
        &BOOK_SCHEMA
    }

    fn fields(&self) -> FieldSlots<FieldRef<'_>> {
        vec![
            ("name", self.name.as_deref().map(FieldRef::Leaf)),
            ("description", self.description.as_deref().map(FieldRef::Leaf)),
            ("scan_depth", self.scan_depth.as_ref().map(|_| FieldRef::Opaque("number"))),
            ("token_budget", self.token_budget.as_ref().map(|_| FieldRef::Opaque("number"))),
            (
                "recursive_scanning",
                self.recursive_scanning.map(|_| FieldRef::Opaque("boolean")),
            ),
            ("extensions", Some(FieldRef::Opaque("map"))),
            ("entries", Some(FieldRef::NodeList(node_refs(&self.entries)))),
        ]
    }

    fn fields_mut(&mut self) -> FieldSlots<FieldMut<'_>> {
        vec![
            ("name", self.name.as_mut().map(FieldMut::Leaf)),
            ("description", self.description.as_mut().map(FieldMut::Leaf)),
            ("scan_depth", self.scan_depth.as_ref().map(|_| FieldMut::Opaque("number"))),
            ("token_budget", self.token_budget.as_ref().map(|_| FieldMut::Opaque("number"))),
            (
                "recursive_scanning",
                self.recursive_scanning.map(|_| FieldMut::Opaque("boolean")),
            ),
            ("extensions", Some(FieldMut::Opaque("map"))),
            ("entries", Some(FieldMut::NodeList(node_muts(&mut self.entries)))),
        ]
    }
}

impl Translatable for CharacterBookEntry {
    fn schema(&self) -> &'static Schema {
        &ENTRY_SCHEMA
    }

    fn fields(&self) -> FieldSlots<FieldRef<'_>> {
        vec![
            ("keys", Some(FieldRef::LeafList(&self.keys))),
            ("content", Some(FieldRef::Leaf(&self.content))),
            ("extensions", Some(FieldRef::Opaque("map"))),
            ("enabled", Some(FieldRef::Opaque("boolean"))),
            ("insertion_order", Some(FieldRef::Opaque("number"))),
            ("name", self.name.as_deref().map(FieldRef::Leaf)),
            ("comment", self.comment.as_deref().map(FieldRef::Leaf)),
            ("secondary_keys", self.secondary_keys.as_deref().map(FieldRef::LeafList)),
        ]
    }

    fn fields_mut(&mut self) -> FieldSlots<FieldMut<'_>> {
        vec![
            ("keys", Some(FieldMut::LeafList(&mut self.keys))),
            ("content", Some(FieldMut::Leaf(&mut self.content))),
            ("extensions", Some(FieldMut::Opaque("map"))),
            ("enabled", Some(FieldMut::Opaque("boolean"))),
            ("insertion_order", Some(FieldMut::Opaque("number"))),
            ("name", self.name.as_mut().map(FieldMut::Leaf)),
            ("comment", self.comment.as_mut().map(FieldMut::Leaf)),
            (
                "secondary_keys",
                self.secondary_keys.as_deref_mut().map(FieldMut::LeafList),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::fixtures;

    fn book() -> CharacterBook {
        serde_json::from_value(fixtures::v2()["data"]["character_book"].clone()).unwrap()
    }

    #[test]
    fn test_book_builds_one_entry_per_input() {
        let book = book();
        assert_eq!(book.name.as_deref(), Some("Aria's World"));
        assert_eq!(book.entries.len(), 2);
        assert_eq!(book.entries[0].position, Some(EntryPosition::BeforeChar));
        assert_eq!(book.entries[1].secondary_keys, None);
    }

    #[test]
    fn test_numbers_keep_their_form() {
        let book = book();
        let raw = fixtures::v2()["data"]["character_book"].clone();
        assert_eq!(serde_json::to_value(&book).unwrap(), raw);
        assert_eq!(
            serde_json::to_string(&book.entries[0].insertion_order).unwrap(),
            "100"
        );
    }

    #[test]
    fn test_optional_fields_absent_when_unset() {
        let book = book();
        let fields = book.entries[1].fields();
        let secondary = fields
            .iter()
            .find(|(name, _)| *name == "secondary_keys")
            .map(|(_, value)| value.is_none());
        assert_eq!(secondary, Some(true));
    }
}
