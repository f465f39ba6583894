//! Lenient field decoders
//!
//! Provider payloads are loosely typed: numbers arrive as strings, lists
//! contain junk entries, optional fields are `null`. These helpers turn
//! anything unreadable into "absent" instead of failing the whole listing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::trace;

/// Number, numeric string, or null
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

/// Token decimals - Curve sends them as strings ("18")
pub fn lenient_u8<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse::<u8>().ok(),
        _ => None,
    })
}

/// Non-empty string or absent
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// Keep every list entry that decodes, drop the rest
pub fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => decode_entries(items),
        _ => Vec::new(),
    })
}

/// Object of named numeric components -> (name, value) pairs in key order
pub fn named_numbers<'de, D>(deserializer: D) -> Result<Vec<(String, f64)>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(name, v)| value_as_f64(v).map(|n| (name.clone(), n)))
            .collect(),
        _ => Vec::new(),
    })
}

pub fn decode_entries<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if decoded.len() < total {
        trace!("Skipped {} undecodable entries", total - decoded.len());
    }
    decoded
}
