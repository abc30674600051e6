//! Puts a card's output back into the shape it was read in.
//!
//! Records serialize their known fields in struct order and drop absent
//! optionals, so an explicit `null` would vanish and keys would move. The
//! loaded document is kept as a layout and the emitted value is merged
//! into it: keys come out in input order, keys the record did not emit
//! keep their input value, and new keys follow at the end.

use serde::Serialize;
use serde_json::{Map, Value};

/// Serializes `record`, merged into `layout` when there is one.
pub(crate) fn emit<T: Serialize>(
    record: &T,
    layout: Option<&Value>,
) -> Result<Value, serde_json::Error> {
    let emitted = serde_json::to_value(record)?;
    Ok(match layout {
        Some(layout) => restore(layout, emitted),
        None => emitted,
    })
}

pub(crate) fn restore(layout: &Value, emitted: Value) -> Value {
    match (layout, emitted) {
        (Value::Object(original), Value::Object(mut fresh)) => {
            let mut merged = Map::with_capacity(original.len().max(fresh.len()));
            for (key, before) in original {
                let value = match fresh.shift_remove(key) {
                    Some(after) => restore(before, after),
                    None => before.clone(),
                };
                merged.insert(key.clone(), value);
            }
            merged.extend(fresh);
            Value::Object(merged)
        }
        (Value::Array(original), Value::Array(fresh)) if original.len() == fresh.len() => {
            Value::Array(
                original
                    .iter()
                    .zip(fresh)
                    .map(|(before, after)| restore(before, after))
                    .collect(),
            )
        }
        (_, emitted) => emitted,
    }
}
