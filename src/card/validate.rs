//! Structural validation of raw card documents.
//!
//! Each check collects every violation it finds instead of stopping at the
//! first one, so a broken card can be fixed in one pass.

use serde_json::{Map, Value};

/// Text fields shared by V1 cards and V2 card data.
pub(crate) const BASE_TEXT_FIELDS: [&str; 6] = [
    "name",
    "description",
    "personality",
    "scenario",
    "first_mes",
    "mes_example",
];

const ENTRY_POSITIONS: [&str; 2] = ["before_char", "after_char"];

/// Expected JSON kind of a field.
#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    Flag,
    Number,
    Object,
    TextList,
    List,
}

impl Kind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Kind::Text => value.is_string(),
            Kind::Flag => value.is_boolean(),
            Kind::Number => value.is_number(),
            Kind::Object => value.is_object(),
            Kind::TextList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Kind::List => value.is_array(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Kind::Text => "a string",
            Kind::Flag => "a boolean",
            Kind::Number => "a number",
            Kind::Object => "an object",
            Kind::TextList => "a list of strings",
            Kind::List => "a list",
        }
    }
}

/// Names the JSON kind of a value for messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn object<'v>(
    value: &'v Value,
    path: &str,
    violations: &mut Vec<String>,
) -> Option<&'v Map<String, Value>> {
    let map = value.as_object();
    if map.is_none() {
        let at = if path.is_empty() { "document" } else { path };
        violations.push(format!("{}: expected an object, found {}", at, json_kind(value)));
    }
    map
}

fn check<'v>(
    value: &'v Value,
    kind: Kind,
    path: String,
    violations: &mut Vec<String>,
) -> Option<&'v Value> {
    if kind.matches(value) {
        Some(value)
    } else {
        violations.push(format!(
            "{}: expected {}, found {}",
            path,
            kind.describe(),
            json_kind(value)
        ));
        None
    }
}

fn require<'v>(
    map: &'v Map<String, Value>,
    path: &str,
    key: &str,
    kind: Kind,
    violations: &mut Vec<String>,
) -> Option<&'v Value> {
    let field_path = child_path(path, key);
    match map.get(key) {
        Some(value) => check(value, kind, field_path, violations),
        None => {
            violations.push(format!("{}: missing required field", field_path));
            None
        }
    }
}

// Null is accepted for optional fields and reads back as absent.
fn optional<'v>(
    map: &'v Map<String, Value>,
    path: &str,
    key: &str,
    kind: Kind,
    violations: &mut Vec<String>,
) -> Option<&'v Value> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => check(value, kind, child_path(path, key), violations),
    }
}

/// Validates a V1 card, returning every violation found.
pub(crate) fn card_v1(value: &Value) -> Vec<String> {
    let mut violations = Vec::new();
    if let Some(map) = object(value, "", &mut violations) {
        for key in BASE_TEXT_FIELDS {
            require(map, "", key, Kind::Text, &mut violations);
        }
    }
    violations
}

/// Validates a V2 card envelope and everything under it.
pub(crate) fn card_v2(value: &Value) -> Vec<String> {
    let mut violations = Vec::new();
    if let Some(map) = object(value, "", &mut violations) {
        require(map, "", "spec", Kind::Text, &mut violations);
        require(map, "", "spec_version", Kind::Text, &mut violations);
        if let Some(data) = require(map, "", "data", Kind::Object, &mut violations) {
            card_v2_data(data, "data", &mut violations);
        }
    }
    violations
}

fn card_v2_data(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = object(value, path, violations) else {
        return;
    };

    let text_fields = BASE_TEXT_FIELDS.into_iter().chain([
        "creator_notes",
        "system_prompt",
        "post_history_instructions",
        "creator",
        "character_version",
    ]);
    for key in text_fields {
        require(map, path, key, Kind::Text, violations);
    }
    require(map, path, "alternate_greetings", Kind::TextList, violations);
    require(map, path, "tags", Kind::TextList, violations);
    require(map, path, "extensions", Kind::Object, violations);

    if let Some(book) = optional(map, path, "character_book", Kind::Object, violations) {
        lore_book(book, &child_path(path, "character_book"), violations);
    }
}

fn lore_book(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = object(value, path, violations) else {
        return;
    };

    optional(map, path, "name", Kind::Text, violations);
    optional(map, path, "description", Kind::Text, violations);
    optional(map, path, "scan_depth", Kind::Number, violations);
    optional(map, path, "token_budget", Kind::Number, violations);
    optional(map, path, "recursive_scanning", Kind::Flag, violations);
    require(map, path, "extensions", Kind::Object, violations);

    if let Some(entries) = require(map, path, "entries", Kind::List, violations)
        .and_then(Value::as_array)
    {
        for (i, entry) in entries.iter().enumerate() {
            lore_entry(entry, &format!("{}.entries[{}]", path, i), violations);
        }
    }
}

fn lore_entry(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = object(value, path, violations) else {
        return;
    };

    require(map, path, "keys", Kind::TextList, violations);
    require(map, path, "content", Kind::Text, violations);
    require(map, path, "extensions", Kind::Object, violations);
    require(map, path, "enabled", Kind::Flag, violations);
    require(map, path, "insertion_order", Kind::Number, violations);

    optional(map, path, "case_sensitive", Kind::Flag, violations);
    optional(map, path, "name", Kind::Text, violations);
    optional(map, path, "priority", Kind::Number, violations);
    optional(map, path, "id", Kind::Number, violations);
    optional(map, path, "comment", Kind::Text, violations);
    optional(map, path, "selective", Kind::Flag, violations);
    optional(map, path, "secondary_keys", Kind::TextList, violations);
    optional(map, path, "constant", Kind::Flag, violations);

    let position = optional(map, path, "position", Kind::Text, violations).and_then(Value::as_str);
    if let Some(position) = position.filter(|position| !ENTRY_POSITIONS.contains(position)) {
        violations.push(format!(
            "{}.position: expected one of {}, found '{}'",
            path,
            ENTRY_POSITIONS.join(", "),
            position
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::fixtures;
    use serde_json::json;

    #[test]
    fn test_valid_v1_has_no_violations() {
        assert!(card_v1(&fixtures::v1()).is_empty());
    }

    #[test]
    fn test_v1_lists_every_violation() {
        let violations = card_v1(&json!({
            "name": "Aria",
            "description": 42,
            "scenario": "A tavern",
        }));

        assert_eq!(violations.len(), 4);
        assert!(violations.contains(&"description: expected a string, found number".to_string()));
        assert!(violations.contains(&"personality: missing required field".to_string()));
        assert!(violations.contains(&"first_mes: missing required field".to_string()));
        assert!(violations.contains(&"mes_example: missing required field".to_string()));
    }

    #[test]
    fn test_non_object_document() {
        let violations = card_v1(&json!(["not", "a", "card"]));
        assert_eq!(violations, vec!["document: expected an object, found array"]);
    }

    #[test]
    fn test_valid_v2_has_no_violations() {
        assert!(card_v2(&fixtures::v2()).is_empty());
        assert!(card_v2(&fixtures::v2_without_book()).is_empty());
    }

    #[test]
    fn test_v2_null_book_is_absent() {
        let mut card = fixtures::v2();
        card["data"]["character_book"] = Value::Null;
        assert!(card_v2(&card).is_empty());
    }

    #[test]
    fn test_v2_nested_violations_carry_paths() {
        let mut card = fixtures::v2();
        card["data"]["alternate_greetings"] = json!(["hi", 3]);
        card["data"]["character_book"]["entries"][1]["keys"] = json!("sword");
        card["data"]["character_book"]["entries"][0]["position"] = json!("middle");

        let violations = card_v2(&card);
        assert_eq!(violations.len(), 3, "{:?}", violations);
        assert!(violations.contains(
            &"data.alternate_greetings: expected a list of strings, found array".to_string()
        ));
        assert!(violations.contains(
            &"data.character_book.entries[1].keys: expected a list of strings, found string"
                .to_string()
        ));
        assert!(violations.contains(
            &"data.character_book.entries[0].position: expected one of before_char, after_char, found 'middle'"
                .to_string()
        ));
    }

    #[test]
    fn test_v2_missing_data() {
        let violations = card_v2(&json!({"spec": "chara_card_v2", "spec_version": "2.0"}));
        assert_eq!(violations, vec!["data: missing required field"]);
    }
}
