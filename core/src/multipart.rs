//! File-bearing request data and its `multipart/form-data` rendering.
//!
//! # Design
//! Request data is a `serde_json::Value`, so a file is carried as a tagged
//! object, `{"$file": {"filename", "content_type", "content"}}`, with the
//! bytes base64-encoded. `file_part` and `file_from_path` build that value.
//! When a mapping containing one reaches a definition without an encoder, it
//! is sent as a `Multipart` body instead of a urlencoded form.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};

use crate::codec;
use crate::error::CodecError;

/// Tag key marking a file value inside request data.
pub const FILE_KEY: &str = "$file";

/// A file value for request data.
pub fn file_part(filename: &str, content_type: &str, contents: &[u8]) -> Value {
    let mut file = Map::new();
    file.insert("filename".to_string(), Value::from(filename));
    file.insert("content_type".to_string(), Value::from(content_type));
    file.insert(
        "content".to_string(),
        Value::from(general_purpose::STANDARD.encode(contents)),
    );
    let mut tagged = Map::new();
    tagged.insert(FILE_KEY.to_string(), Value::Object(file));
    Value::Object(tagged)
}

/// Read a file from disk into a file value, guessing its content type from
/// the extension.
pub fn file_from_path(path: impl AsRef<Path>) -> io::Result<Value> {
    let path = path.as_ref();
    let contents = fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(file_part(&filename, content_type.as_ref(), &contents))
}

pub(crate) fn is_file(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.len() == 1 && map.get(FILE_KEY).is_some_and(Value::is_object),
        _ => false,
    }
}

/// One section of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A `multipart/form-data` body with its boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    boundary: String,
    parts: Vec<Part>,
}

impl Multipart {
    /// Picks a boundary that does not occur in any part.
    pub fn new(parts: Vec<Part>) -> Self {
        let mut boundary = next_boundary();
        while parts
            .iter()
            .any(|part| contains(&part.data, boundary.as_bytes()))
        {
            boundary = next_boundary();
        }
        Self { boundary, parts }
    }

    /// Build the body for file-bearing mapping data. Returns `None` when the
    /// data holds no file value.
    pub fn from_value(data: &Value) -> Result<Option<Self>, CodecError> {
        let leaves = codec::leaves(data);
        if !leaves.iter().any(|(_, value)| is_file(value)) {
            return Ok(None);
        }
        let parts = leaves
            .into_iter()
            .map(|(name, value)| {
                if is_file(value) {
                    file_section(name, &value[FILE_KEY])
                } else {
                    Ok(Part {
                        name,
                        filename: None,
                        content_type: None,
                        data: codec::scalar_text(value).into_bytes(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Self::new(parts)))
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", escape(&part.name));
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", escape(filename)));
            }
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

fn file_section(name: String, file: &Value) -> Result<Part, CodecError> {
    let content = file["content"]
        .as_str()
        .ok_or_else(|| CodecError::new(format!("file value `{name}` has no content")))?;
    let data = general_purpose::STANDARD
        .decode(content)
        .map_err(|e| CodecError {
            message: format!("file value `{name}` is not valid base64: {e}"),
            source: Some(Box::new(e)),
        })?;
    Ok(Part {
        filename: file["filename"].as_str().map(str::to_string),
        content_type: file["content_type"].as_str().map(str::to_string),
        name,
        data,
    })
}

fn next_boundary() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos())
        .unwrap_or_default();
    let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("harness-boundary-{nanos:08x}{sequence:08x}")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

// Quotes and line breaks in names are percent-escaped, as browsers do.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn plain_mappings_are_not_multipart() {
        assert_eq!(Multipart::from_value(&json!({"a": 1})).unwrap(), None);
        assert_eq!(Multipart::from_value(&json!("text")).unwrap(), None);
    }

    #[test]
    fn file_values_become_file_parts() {
        let data = json!({
            "title": "notes",
            "upload": file_part("notes.txt", "text/plain", b"hello"),
        });
        let form = Multipart::from_value(&data).unwrap().unwrap();

        assert_eq!(
            form.parts(),
            &[
                Part {
                    name: "title".to_string(),
                    filename: None,
                    content_type: None,
                    data: b"notes".to_vec(),
                },
                Part {
                    name: "upload".to_string(),
                    filename: Some("notes.txt".to_string()),
                    content_type: Some("text/plain".to_string()),
                    data: b"hello".to_vec(),
                },
            ]
        );
    }

    #[test]
    fn files_in_lists_use_bracket_names() {
        let data = json!({"files": [file_part("a.bin", "application/octet-stream", &[0, 1])]});
        let form = Multipart::from_value(&data).unwrap().unwrap();
        assert_eq!(form.parts()[0].name, "files[]");
        assert_eq!(form.parts()[0].data, vec![0, 1]);
    }

    #[test]
    fn renders_form_data_sections() {
        let form = Multipart {
            boundary: "XYZ".to_string(),
            parts: vec![
                Part {
                    name: "title".to_string(),
                    filename: None,
                    content_type: None,
                    data: b"notes".to_vec(),
                },
                Part {
                    name: "upload".to_string(),
                    filename: Some("a\"b.txt".to_string()),
                    content_type: Some("text/plain".to_string()),
                    data: b"hi".to_vec(),
                },
            ],
        };

        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\r\nnotes\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"upload\"; filename=\"a%22b.txt\"\r\n\
            Content-Type: text/plain\r\n\r\nhi\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(form.to_bytes()).unwrap(), expected);
        assert_eq!(form.content_type(), "multipart/form-data; boundary=XYZ");
    }

    #[test]
    fn boundary_never_occurs_in_part_data() {
        let form = Multipart::new(vec![Part {
            name: "f".to_string(),
            filename: None,
            content_type: None,
            data: b"harness-boundary-".to_vec(),
        }]);
        assert!(!contains(&form.parts()[0].data, form.boundary().as_bytes()));
        assert_ne!(Multipart::new(Vec::new()).boundary(), form.boundary());
    }

    #[test]
    fn bad_base64_is_a_codec_error() {
        let data = json!({"upload": {"$file": {"filename": "x", "content": "***"}}});
        let err = Multipart::from_value(&data).unwrap_err();
        assert!(err.message.contains("upload"));
        assert!(err.source.is_some());
    }

    #[test]
    fn file_from_path_reads_bytes_and_guesses_type() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"from disk").unwrap();

        let value = file_from_path(file.path()).unwrap();
        let form = Multipart::from_value(&json!({"upload": value})).unwrap().unwrap();
        let part = &form.parts()[0];

        assert_eq!(part.data, b"from disk");
        assert_eq!(part.content_type.as_deref(), Some("text/plain"));
        let expected_name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(part.filename.as_deref(), Some(expected_name.as_str()));
    }
}
