// src/domain/timestamp.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};

/// Normalizes a stored timestamp into a UTC date.
///
/// The store's native shape is `{"seconds": .., "nanoseconds": ..}` (exports
/// sometimes prefix the keys with `_`). Values that are already dates
/// (RFC 3339 or `YYYY-MM-DD` strings) pass through. Anything else is `None`.
pub fn normalize(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?).single()
        }
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// The store-native representation, used when writing new documents.
pub fn to_native(dt: DateTime<Utc>) -> Value {
    json!({
        "seconds": dt.timestamp(),
        "nanoseconds": dt.timestamp_subsec_nanos(),
    })
}

/// Sort key for creation times. Missing or unparseable dates sort as epoch 0.
pub fn millis_or_epoch(dt: Option<&DateTime<Utc>>) -> i64 {
    dt.map(DateTime::timestamp_millis).unwrap_or(0)
}

/// Serde adapter for optional date fields read from stored documents.
/// Never fails: anything that does not normalize deserializes to `None`.
pub mod lenient {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(d)?;
        Ok(raw.as_ref().and_then(normalize))
    }
}
