//! Character card V2: a versioned envelope around the card data.

use super::lorebook::CharacterBook;
use super::record::{FieldDecl, FieldMut, FieldRef, FieldSlots, Schema, Translatable};
use super::{layout, validate};
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Spec identifier carried by every V2 card.
pub const SPEC_NAME: &str = "chara_card_v2";

/// The only V2 spec version we know how to read.
pub const SPEC_VERSION: &str = "2.0";

pub static CARD_SCHEMA: Schema = Schema {
    record: "CharacterCardV2",
    fields: &[FieldDecl::required("data")],
};

// creator_notes is left out on purpose: it talks to the person importing
// the card, not to the model.
pub static DATA_SCHEMA: Schema = Schema {
    record: "CharacterCardV2Data",
    fields: &[
        FieldDecl::required("name"),
        FieldDecl::required("description"),
        FieldDecl::required("personality"),
        FieldDecl::required("scenario"),
        FieldDecl::required("first_mes"),
        FieldDecl::required("mes_example"),
        FieldDecl::required("system_prompt"),
        FieldDecl::required("post_history_instructions"),
        FieldDecl::required("alternate_greetings"),
        FieldDecl::optional("character_book"),
    ],
};

/// A V2 character card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterCardV2 {
    pub spec: String,
    pub spec_version: String,
    pub data: CharacterCardV2Data,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// The document this card was read from.
    #[serde(skip)]
    layout: Option<Value>,
}

/// Everything a V2 card says about the character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterCardV2Data {
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub first_mes: String,
    pub mes_example: String,
    pub creator_notes: String,
    pub system_prompt: String,
    pub post_history_instructions: String,
    pub alternate_greetings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_book: Option<CharacterBook>,
    pub tags: Vec<String>,
    pub creator: String,
    pub character_version: String,
    pub extensions: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CharacterCardV2 {
    /// Wraps card data in a current-version envelope.
    pub fn new(data: CharacterCardV2Data) -> Self {
        Self {
            spec: SPEC_NAME.to_string(),
            spec_version: SPEC_VERSION.to_string(),
            data,
            extra: Map::new(),
            layout: None,
        }
    }

    /// Validates a raw document and builds an owned card, including its
    /// lore book and entries.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let violations = validate::card_v2(&value);
        if !violations.is_empty() {
            return Err(SchemaError::Invalid {
                record: CARD_SCHEMA.record,
                violations,
            });
        }

        let layout = value.clone();
        let mut card: Self = serde_json::from_value(value).map_err(|e| SchemaError::Invalid {
            record: CARD_SCHEMA.record,
            violations: vec![e.to_string()],
        })?;
        card.layout = Some(layout);
        Ok(card)
    }

    /// Serializes the card with the key order and explicit nulls of the
    /// document it was read from.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        layout::emit(self, self.layout.as_ref())
    }
}

impl Translatable for CharacterCardV2 {
    fn schema(&self) -> &'static Schema {
        &CARD_SCHEMA
    }

    fn fields(&self) -> FieldSlots<FieldRef<'_>> {
        vec![
            ("spec", Some(FieldRef::Leaf(&self.spec))),
            ("spec_version", Some(FieldRef::Leaf(&self.spec_version))),
            ("data", Some(FieldRef::Node(&self.data))),
        ]
    }

    fn fields_mut(&mut self) -> FieldSlots<FieldMut<'_>> {
        vec![
            ("spec", Some(FieldMut::Leaf(&mut self.spec))),
            ("spec_version", Some(FieldMut::Leaf(&mut self.spec_version))),
            ("data", Some(FieldMut::Node(&mut self.data))),
        ]
    }
}

impl Translatable for CharacterCardV2Data {
    fn schema(&self) -> &'static Schema {
        &DATA_SCHEMA
    }

    fn fields(&self) -> FieldSlots<FieldRef<'_>> {
        vec![
            ("name", Some(FieldRef::Leaf(&self.name))),
            ("description", Some(FieldRef::Leaf(&self.description))),
            ("personality", Some(FieldRef::Leaf(&self.personality))),
            ("scenario", Some(FieldRef::Leaf(&self.scenario))),
            ("first_mes", Some(FieldRef::Leaf(&self.first_mes))),
            ("mes_example", Some(FieldRef::Leaf(&self.mes_example))),
            ("creator_notes", Some(FieldRef::Leaf(&self.creator_notes))),
            ("system_prompt", Some(FieldRef::Leaf(&self.system_prompt))),
            (
                "post_history_instructions",
                Some(FieldRef::Leaf(&self.post_history_instructions)),
            ),
            (
                "alternate_greetings",
                Some(FieldRef::LeafList(&self.alternate_greetings)),
            ),
            (
                "character_book",
                self.character_book
                    .as_ref()
                    .map(|book| FieldRef::Node(book)),
            ),
            ("tags", Some(FieldRef::LeafList(&self.tags))),
            ("creator", Some(FieldRef::Leaf(&self.creator))),
            ("character_version", Some(FieldRef::Leaf(&self.character_version))),
            ("extensions", Some(FieldRef::Opaque("map"))),
        ]
    }

    fn fields_mut(&mut self) -> FieldSlots<FieldMut<'_>> {
        vec![
            ("name", Some(FieldMut::Leaf(&mut self.name))),
            ("description", Some(FieldMut::Leaf(&mut self.description))),
            ("personality", Some(FieldMut::Leaf(&mut self.personality))),
            ("scenario", Some(FieldMut::Leaf(&mut self.scenario))),
            ("first_mes", Some(FieldMut::Leaf(&mut self.first_mes))),
            ("mes_example", Some(FieldMut::Leaf(&mut self.mes_example))),
            ("creator_notes", Some(FieldMut::Leaf(&mut self.creator_notes))),
            ("system_prompt", Some(FieldMut::Leaf(&mut self.system_prompt))),
            (
                "post_history_instructions",
                Some(FieldMut::Leaf(&mut self.post_history_instructions)),
            ),
            (
                "alternate_greetings",
                Some(FieldMut::LeafList(&mut self.alternate_greetings)),
            ),
            (
                "character_book",
                self.character_book
                    .as_mut()
                    .map(|book| FieldMut::Node(book)),
            ),
            ("tags", Some(FieldMut::LeafList(&mut self.tags))),
            ("creator", Some(FieldMut::Leaf(&mut self.creator))),
            (
                "character_version",
                Some(FieldMut::Leaf(&mut self.character_version)),
            ),
            ("extensions", Some(FieldMut::Opaque("map"))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::fixtures;

    #[test]
    fn test_from_value_builds_nested_records() {
        let card = CharacterCardV2::from_value(fixtures::v2()).unwrap();
        assert_eq!(card.spec, SPEC_NAME);
        assert_eq!(card.data.name, "Aria");
        assert_eq!(card.data.alternate_greetings.len(), 2);

        let book = card.data.character_book.as_ref().unwrap();
        assert_eq!(book.entries.len(), 2);
        assert_eq!(book.entries[1].comment.as_deref(), Some("location"));
    }

    #[test]
    fn test_from_value_without_book() {
        let card = CharacterCardV2::from_value(fixtures::v2_without_book()).unwrap();
        assert!(card.data.character_book.is_none());
    }

    #[test]
    fn test_round_trip_keeps_extensions() {
        let raw = fixtures::v2();
        let card = CharacterCardV2::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&card).unwrap(), raw);
    }

    #[test]
    fn test_from_value_reports_violations() {
        let mut raw = fixtures::v2();
        raw["data"]["tags"] = serde_json::json!("fantasy");

        let err = CharacterCardV2::from_value(raw).unwrap_err();
        assert!(err.to_string().contains("data.tags"));
    }

    #[test]
    fn test_creator_notes_not_declared() {
        assert!(!DATA_SCHEMA.names().any(|name| name == "creator_notes"));
        assert_eq!(DATA_SCHEMA.fields.len(), 10);
    }
}
