use serde_json::{Map, Value};

/// The shapes a referenced entity can arrive in from the content backend.
/// Classification happens once; every caller goes through [`extract_relation_id`]
/// instead of probing fields ad hoc.
enum RelationShape<'a> {
    Absent,
    Scalar(String),
    Collection(&'a Vec<Value>),
    Entity(&'a Map<String, Value>),
}

fn classify(value: &Value) -> RelationShape<'_> {
    match value {
        Value::Null => RelationShape::Absent,
        Value::String(id) => RelationShape::Scalar(id.clone()),
        Value::Number(id) => RelationShape::Scalar(id.to_string()),
        Value::Array(items) => RelationShape::Collection(items),
        Value::Object(fields) => RelationShape::Entity(fields),
        Value::Bool(_) => RelationShape::Absent,
    }
}

/// Resolve a relation payload to a single scalar identifier.
///
/// Total over every supported shape: a bare id, a wrapped entity, a `data`
/// container, or a to-many collection (first member wins). Unrecognized
/// payloads yield `None`, never an error.
pub fn extract_relation_id(value: &Value) -> Option<String> {
    match classify(value) {
        RelationShape::Absent => None,
        RelationShape::Scalar(id) => Some(id),
        RelationShape::Collection(items) => items.first().and_then(extract_relation_id),
        RelationShape::Entity(fields) => {
            // Document ids take precedence over row ids for backends that carry both.
            if let Some(id) = fields.get("documentId").and_then(scalar_id) {
                return Some(id);
            }
            if let Some(id) = fields.get("id").and_then(scalar_id) {
                return Some(id);
            }
            fields.get("data").and_then(extract_relation_id)
        }
    }
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Flatten the `{data: {id, attributes: {…}}}` containers a content backend
/// wraps entities in, recursively, so downstream code sees one flat object
/// per entity regardless of how the payload was fetched.
pub fn normalize_entity(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(normalize_entity).collect()),
        Value::Object(fields) => {
            if let Some(data) = fields.get("data") {
                return normalize_entity(data);
            }

            if let Some(attributes) = fields.get("attributes") {
                let mut normalized = match normalize_entity(attributes) {
                    Value::Object(inner) => inner,
                    other => return other,
                };
                if let Some(id) = fields.get("id") {
                    normalized.insert("id".to_string(), id.clone());
                }
                return Value::Object(normalized);
            }

            let mut normalized = Map::with_capacity(fields.len());
            for (key, field) in fields {
                normalized.insert(key.clone(), normalize_entity(field));
            }
            Value::Object(normalized)
        }
        other => other.clone(),
    }
}
