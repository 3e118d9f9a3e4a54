// src/domain/lenient.rs
//
// Field adapters for documents written by other clients. The store keeps no
// schema, so a field may be null, missing or of the wrong scalar type; these
// read such values as empty instead of failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Text field; `null` and non-scalars read as "".
pub fn string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(d)?
        .and_then(scalar_text)
        .unwrap_or_default())
}

/// Optional text field; `null` and non-scalars read as `None`.
pub fn opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(d)?.and_then(scalar_text))
}

/// Whole number stored either as a number or as numeric text (`"25"`).
pub fn opt_u32<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let n = match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(n.and_then(|n| u32::try_from(n).ok()))
}

/// Any field with a sensible empty value: anything that does not decode
/// reads as `T::default()`.
pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(Option::<Value>::deserialize(d)?
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}
