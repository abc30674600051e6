//! Character card V1: six flat text fields.

use super::record::{FieldDecl, FieldMut, FieldRef, FieldSlots, Schema, Translatable};
use super::{layout, validate};
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub static SCHEMA: Schema = Schema {
    record: "CharacterCardV1",
    fields: &[
        FieldDecl::required("name"),
        FieldDecl::required("description"),
        FieldDecl::required("personality"),
        FieldDecl::required("scenario"),
        FieldDecl::required("first_mes"),
        FieldDecl::required("mes_example"),
    ],
};

/// A V1 character card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterCardV1 {
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub first_mes: String,
    pub mes_example: String,

    /// Keys outside the V1 format, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// The document this card was read from.
    #[serde(skip)]
    layout: Option<Value>,
}

impl CharacterCardV1 {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        personality: impl Into<String>,
        scenario: impl Into<String>,
        first_mes: impl Into<String>,
        mes_example: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            personality: personality.into(),
            scenario: scenario.into(),
            first_mes: first_mes.into(),
            mes_example: mes_example.into(),
            extra: Map::new(),
            layout: None,
        }
    }

    /// Validates a raw document and builds an owned card from it.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let violations = validate::card_v1(&value);
        if !violations.is_empty() {
            return Err(SchemaError::Invalid {
                record: SCHEMA.record,
                violations,
            });
        }

        let layout = value.clone();
        let mut card: Self = serde_json::from_value(value).map_err(|e| SchemaError::Invalid {
            record: SCHEMA.record,
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

impl Translatable for CharacterCardV1 {
    fn schema(&self) -> &'static Schema {
        &SCHEMA
    }

    fn fields(&self) -> FieldSlots<FieldRef<'_>> {
        vec![
            ("name", Some(FieldRef::Leaf(&self.name))),
            ("description", Some(FieldRef::Leaf(&self.description))),
            ("personality", Some(FieldRef::Leaf(&self.personality))),
            ("scenario", Some(FieldRef::Leaf(&self.scenario))),
            ("first_mes", Some(FieldRef::Leaf(&self.first_mes))),
            ("mes_example", Some(FieldRef::Leaf(&self.mes_example))),
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
        ]
    }
}
