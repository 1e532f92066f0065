pub mod attempt;
pub mod exam;
pub mod result;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Backends disagree on whether identifiers are strings or numbers; accept
/// both and carry them as strings everywhere in the core.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_id))
}

pub(crate) fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
