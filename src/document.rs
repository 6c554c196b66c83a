//! Permissive accessors over the panel's JSON document.
//!
//! Every accessor returns `None` when the key is missing or holds a value of
//! the wrong JSON type. "Non-empty" accessors additionally treat `""` and `[]`
//! as missing.

use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

pub fn parse_document(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw)
}

/// A document is either one configuration item or an array of them.
pub fn document_items(doc: &Value) -> Vec<&Value> {
    match doc {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

pub fn get_object<'a>(obj: &'a Object, key: &str) -> Option<&'a Object> {
    obj.get(key).and_then(Value::as_object)
}

pub fn get_str<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

pub fn get_non_empty_str<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    get_str(obj, key).filter(|s| !s.is_empty())
}

pub fn get_bool(obj: &Object, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

pub fn get_non_empty_array<'a>(obj: &'a Object, key: &str) -> Option<&'a [Value]> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .filter(|items| !items.is_empty())
}

/// First element of a non-empty array, if that element is an object.
pub fn first_object<'a>(obj: &'a Object, key: &str) -> Option<&'a Object> {
    get_non_empty_array(obj, key)?.first()?.as_object()
}

/// Ports are usually numbers, but some panels emit them as strings. Zero is
/// treated as missing.
pub fn get_port(obj: &Object, key: &str) -> Option<u16> {
    let port = match obj.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    }?;
    (port != 0).then_some(port)
}
