//! Field-level decoding for records read back from the remote store.
//!
//! The store owns the shape of its rows, so a field whose format drifts from
//! the typed model (a float where an integer was expected, a timestamp with no
//! offset, a number stored as text) decodes to the closest value or to its
//! default. One odd field never costs the whole record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{RecordId, RecordRef};

/// Text field. `null` and objects read as empty, scalars as their text.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Floating point field. Accepts numbers and numeric text.
pub(crate) fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_f64(&Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Integer field. Fractional values are rounded to the nearest integer.
pub(crate) fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| as_f64(&value).map(|n| n.round() as i64))
        .unwrap_or_default())
}

/// Timestamp field. Values without an offset are taken as UTC; anything
/// unreadable is `None`.
pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => parse_timestamp(&s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

/// Calendar date field. A full timestamp keeps its date part.
pub(crate) fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .or_else(|| parse_timestamp(&s).map(|ts| ts.date_naive())),
        _ => None,
    })
}

/// Reference field: bare id, numeric text or lookup object.
pub(crate) fn record_ref<'de, D>(deserializer: D) -> Result<Option<RecordRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => s.parse::<RecordId>().ok().map(RecordRef::Id),
        other => serde_json::from_value(other).ok(),
    })
}

/// Parses RFC 3339, then the offset-less forms the store also hands back.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
