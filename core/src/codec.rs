//! Ready-made codec hooks and form encoding.
//!
//! `json_encode` / `json_decode` can be registered directly on a
//! `ClientDefinition`. The form helpers back both querystring composition for
//! bodyless verbs and the pass-through body sent when no encoder is set.

use serde_json::Value;
use url::form_urlencoded;

use crate::error::CodecError;
use crate::multipart;

/// Encoder hook that serializes data as compact JSON.
pub fn json_encode(data: &Value) -> Result<String, CodecError> {
    Ok(serde_json::to_string(data)?)
}

/// Decoder hook that parses the response body as JSON.
///
/// An empty body decodes to `Value::Null` so bodiless responses such as
/// `204 No Content` do not fail.
pub fn json_decode(body: &str) -> Result<Value, CodecError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

/// Flatten a mapping into form pairs.
///
/// Nested objects become `key[sub]`, arrays become repeated `key[]`, `null`
/// becomes an empty value. Non-object data yields no pairs.
pub fn form_pairs(data: &Value) -> Vec<(String, String)> {
    leaves(data)
        .into_iter()
        .map(|(key, value)| (key, scalar_text(value)))
        .collect()
}

/// Flattened names and leaf values of a mapping. File values are leaves.
pub(crate) fn leaves(data: &Value) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    if let Value::Object(map) = data {
        for (key, value) in map {
            flatten_into(key.clone(), value, &mut out);
        }
    }
    out
}

fn flatten_into<'a>(key: String, value: &'a Value, out: &mut Vec<(String, &'a Value)>) {
    match value {
        Value::Object(map) if !multipart::is_file(value) => {
            for (sub, nested) in map {
                flatten_into(format!("{key}[{sub}]"), nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_into(format!("{key}[]"), item, out);
            }
        }
        leaf => out.push((key, leaf)),
    }
}

pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Encode pairs as `application/x-www-form-urlencoded`.
pub fn form_encode(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Querystring for a bodyless request, or `None` when nothing should be
/// appended. Absent, `null`, and empty data are all treated the same way.
pub(crate) fn querystring(data: Option<&Value>) -> Option<String> {
    match data? {
        Value::Null => None,
        Value::String(raw) if raw.is_empty() => None,
        Value::String(raw) => Some(raw.clone()),
        Value::Object(map) if map.is_empty() => None,
        object @ Value::Object(_) => {
            let pairs = form_pairs(object);
            if pairs.is_empty() {
                None
            } else {
                Some(form_encode(&pairs))
            }
        }
        other => Some(other.to_string()),
    }
}

/// Append a querystring to a path, using `&` when the path already has one.
/// The query goes before any `#fragment`.
pub(crate) fn append_query(path: &str, query: &str) -> String {
    let (base, fragment) = match path.find('#') {
        Some(at) => path.split_at(at),
        None => (path, ""),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{query}{fragment}")
}
