//! Lenient numeric decoding for snapshot records.
//!
//! Records handed over by the external store are not guaranteed to be clean:
//! a quantity may arrive as `"12"`, `12.0`, `null` or `"n/a"`. These helpers
//! decode what can be read as a number and turn everything else into `None`,
//! so a single bad field degrades to "missing" instead of failing the whole
//! snapshot.
//!
//! Use with `#[serde(default, deserialize_with = "...")]`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Best-effort interpretation of a JSON value as an `i64`.
///
/// Floats are truncated toward zero. Non-finite or out-of-range values are `None`.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
        }
        _ => None,
    }
}

/// Best-effort interpretation of a JSON value as a `u64` (negative values are `None`).
pub fn value_as_u64(value: &Value) -> Option<u64> {
    value_as_i64(value).and_then(|v| u64::try_from(v).ok())
}

fn float_to_i64(f: f64) -> Option<i64> {
    if !f.is_finite() || f < i64::MIN as f64 || f > i64::MAX as f64 {
        return None;
    }
    Some(f.trunc() as i64)
}

/// Deserialize an optional `i64`, mapping malformed values to `None`.
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_i64))
}

/// Deserialize an optional `u64`, mapping malformed or negative values to `None`.
pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_u64))
}

/// Deserialize an optional value parsed from a string (e.g. an identifier),
/// mapping unparsable or non-string values to `None`.
pub fn opt_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: core::str::FromStr,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s.trim().parse::<T>().ok(),
        _ => None,
    })
}
