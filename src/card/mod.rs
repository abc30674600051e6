//! Character card documents.
//!
//! This module defines the record types for each supported card format,
//! the discriminator that decides which format a raw JSON document is in,
//! and the [`Card`] wrapper that the rest of the crate works with.

mod layout;
mod lorebook;
mod record;
mod v1;
mod v2;
mod validate;

#[cfg(test)]
pub(crate) mod fixtures;

pub use lorebook::{CharacterBook, CharacterBookEntry, EntryPosition};
pub use record::{FieldDecl, FieldMut, FieldRef, FieldSlots, Presence, Schema, Translatable};
pub use v1::CharacterCardV1;
pub use v2::{CharacterCardV2, CharacterCardV2Data, SPEC_NAME, SPEC_VERSION};

use crate::error::SchemaError;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::fmt;

/// Card format families the discriminator can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardVersion {
    V1,
    V2,
}

impl fmt::Display for CardVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardVersion::V1 => write!(f, "V1"),
            CardVersion::V2 => write!(f, "V2"),
        }
    }
}

/// Decides which card format a raw document is in.
///
/// Rules, checked in order:
/// 1. `spec` and `spec_version` both present: only `chara_card_v2` / `2.0`
///    is accepted.
/// 2. `name` and `description` both present: V1, unless the document also
///    has `entries`, which makes it a standalone lore book (not handled).
/// 3. Anything else is unrecognized.
pub fn classify(value: &Value) -> Result<CardVersion, SchemaError> {
    let Some(map) = value.as_object() else {
        return Err(SchemaError::Unrecognized);
    };

    if let (Some(spec), Some(version)) = (map.get("spec"), map.get("spec_version")) {
        return match (spec.as_str(), version.as_str()) {
            (Some(SPEC_NAME), Some(SPEC_VERSION)) => Ok(CardVersion::V2),
            _ => Err(SchemaError::UnsupportedSpec {
                spec: describe(spec),
                version: describe(version),
            }),
        };
    }

    if map.contains_key("name") && map.contains_key("description") {
        if map.contains_key("entries") {
            return Err(SchemaError::Unimplemented("lore book as a top-level document"));
        }
        return Ok(CardVersion::V1);
    }

    Err(SchemaError::Unrecognized)
}

fn describe(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

/// A loaded card of any supported format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Card {
    V1(CharacterCardV1),
    V2(CharacterCardV2),
}

impl Card {
    /// Classifies, validates and builds a card from raw JSON.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match classify(&value)? {
            CardVersion::V1 => CharacterCardV1::from_value(value).map(Card::V1),
            CardVersion::V2 => CharacterCardV2::from_value(value).map(Card::V2),
        }
    }

    pub fn version(&self) -> CardVersion {
        match self {
            Card::V1(_) => CardVersion::V1,
            Card::V2(_) => CardVersion::V2,
        }
    }

    /// The character's name, whatever the format.
    pub fn name(&self) -> &str {
        match self {
            Card::V1(card) => &card.name,
            Card::V2(card) => &card.data.name,
        }
    }

    /// Serializes the card. A card loaded from JSON keeps that document's
    /// key order and explicit nulls.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Card::V1(card) => card.to_value(),
            Card::V2(card) => card.to_value(),
        }
    }

    /// Serializes the card as JSON indented with four spaces.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        self.to_value()?.serialize(&mut serializer)?;
        buffer.push(b'\n');
        Ok(buffer)
    }

    fn inner(&self) -> &dyn Translatable {
        match self {
            Card::V1(card) => card,
            Card::V2(card) => card,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Translatable {
        match self {
            Card::V1(card) => card,
            Card::V2(card) => card,
        }
    }
}

impl Translatable for Card {
    fn schema(&self) -> &'static Schema {
        self.inner().schema()
    }

    fn fields(&self) -> FieldSlots<FieldRef<'_>> {
        self.inner().fields()
    }

    fn fields_mut(&mut self) -> FieldSlots<FieldMut<'_>> {
        self.inner_mut().fields_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_v1() {
        assert_eq!(classify(&json!({"name": "A", "description": "B"})).unwrap(), CardVersion::V1);
        assert_eq!(classify(&fixtures::v1()).unwrap(), CardVersion::V1);
    }

    #[test]
    fn test_classify_v2() {
        assert_eq!(classify(&fixtures::v2()).unwrap(), CardVersion::V2);
        assert_eq!(
            classify(&json!({"spec": "chara_card_v2", "spec_version": "2.0", "data": {}})).unwrap(),
            CardVersion::V2
        );
    }

    #[test]
    fn test_classify_unknown_spec() {
        let err = classify(&json!({"spec": "chara_card_v3", "spec_version": "3.0"})).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedSpec { ref spec, ref version }
                if spec == "chara_card_v3" && version == "3.0"
        ));

        let err = classify(&json!({"spec": "chara_card_v2", "spec_version": 2})).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedSpec { .. }));
    }

    #[test]
    fn test_classify_spec_wins_over_v1_fields() {
        let doc = json!({"spec": "x", "spec_version": "1", "name": "A", "description": "B"});
        assert!(matches!(classify(&doc), Err(SchemaError::UnsupportedSpec { .. })));
    }

    #[test]
    fn test_classify_lore_book_unimplemented() {
        let doc = json!({"name": "World", "description": "Lore", "entries": []});
        assert!(matches!(classify(&doc), Err(SchemaError::Unimplemented(_))));
    }

    #[test]
    fn test_classify_unrecognized() {
        assert!(matches!(classify(&json!({"spec": "x"})), Err(SchemaError::Unrecognized)));
        assert!(matches!(classify(&json!({"name": "A"})), Err(SchemaError::Unrecognized)));
        assert!(matches!(classify(&json!("card")), Err(SchemaError::Unrecognized)));
    }

    #[test]
    fn test_from_value_picks_variant() {
        let v1 = Card::from_value(fixtures::v1()).unwrap();
        assert_eq!(v1.version(), CardVersion::V1);
        assert_eq!(v1.schema().record, "CharacterCardV1");

        let v2 = Card::from_value(fixtures::v2()).unwrap();
        assert_eq!(v2.version(), CardVersion::V2);
        assert_eq!(v2.name(), "Aria");
        assert_eq!(v2.schema().record, "CharacterCardV2");
    }

    #[test]
    fn test_from_value_classified_but_invalid() {
        let err = Card::from_value(json!({"name": "A", "description": "B"})).unwrap_err();
        assert!(matches!(err, SchemaError::Invalid { record: "CharacterCardV1", .. }));
    }

    #[test]
    fn test_json_output_is_untagged() {
        let card = Card::from_value(fixtures::v2()).unwrap();
        assert_eq!(card.to_value().unwrap(), fixtures::v2());

        let text = String::from_utf8(card.to_json_bytes().unwrap()).unwrap();
        assert!(text.starts_with("{\n    \"spec\": \"chara_card_v2\""));
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed, fixtures::v2());
    }

    #[test]
    fn test_v1_output_keeps_input_key_order() {
        let raw = json!({
            "avatar": "none",
            "name": "A",
            "description": "B",
            "personality": "C",
            "first_mes": "D",
            "mes_example": "E",
            "scenario": "F",
            "create_date": "x"
        });

        let card = Card::from_value(raw.clone()).unwrap();
        assert_eq!(
            serde_json::to_string(&card.to_value().unwrap()).unwrap(),
            serde_json::to_string(&raw).unwrap()
        );
    }

    #[test]
    fn test_v2_output_keeps_mirrored_fields_first() {
        let mut raw = json!({"name": "Aria", "description": "A bard.", "first_mes": "Hi"});
        if let (Some(map), Some(card)) = (raw.as_object_mut(), fixtures::v2().as_object()) {
            map.extend(card.clone());
        }

        let card = Card::from_value(raw.clone()).unwrap();
        assert_eq!(card.version(), CardVersion::V2);

        let text = String::from_utf8(card.to_json_bytes().unwrap()).unwrap();
        let expected = {
            let mut buffer = Vec::new();
            let mut serializer = serde_json::Serializer::with_formatter(
                &mut buffer,
                PrettyFormatter::with_indent(b"    "),
            );
            raw.serialize(&mut serializer).unwrap();
            buffer.push(b'\n');
            String::from_utf8(buffer).unwrap()
        };
        assert_eq!(text, expected);
        assert!(text.starts_with("{\n    \"name\": \"Aria\""));
    }

    #[test]
    fn test_output_keeps_explicit_nulls() {
        let mut raw = fixtures::v2();
        raw["data"]["character_book"]["scan_depth"] = Value::Null;
        raw["data"]["character_book"]["entries"][1]["name"] = Value::Null;

        let card = Card::from_value(raw.clone()).unwrap();
        let Card::V2(inner) = &card else {
            panic!("expected a V2 card");
        };
        let book = inner.data.character_book.as_ref().unwrap();
        assert_eq!(book.scan_depth, None);
        assert_eq!(book.entries[1].name, None);

        let output = card.to_value().unwrap();
        assert_eq!(output, raw);
        assert_eq!(
            serde_json::to_string(&output).unwrap(),
            serde_json::to_string(&raw).unwrap()
        );
    }

    #[test]
    fn test_null_book_survives() {
        let mut raw = fixtures::v2();
        raw["data"]["character_book"] = Value::Null;

        let card = Card::from_value(raw.clone()).unwrap();
        assert_eq!(card.to_value().unwrap(), raw);
    }

    #[test]
    fn test_built_cards_serialize_in_struct_order() {
        let card = Card::V1(CharacterCardV1::new("a", "b", "c", "d", "e", "f"));
        let text = serde_json::to_string(&card.to_value().unwrap()).unwrap();
        assert!(text.starts_with(r#"{"name":"a","description":"b""#));
    }
}
