//! HTTP request and response types passed across the transport boundary.
//!
//! # Design
//! These types describe a single exchange as plain data. `Client` builds an
//! `HttpRequest` for every call and hands it to a `Transport`, which answers
//! with an `HttpResponse` or a `TransportError`. All fields are owned so a
//! request can be recorded, cloned, or moved to another thread freely.

use std::fmt;

use crate::multipart::Multipart;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion-ordered header list with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header. A replaced header keeps its position but
    /// takes the spelling of the new name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns a copy of `self` with every header in `overlay` applied on top.
    pub fn merged_with(&self, overlay: &Headers) -> Headers {
        let mut merged = self.clone();
        for (name, value) in overlay.iter() {
            merged.insert(name, value);
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Text produced by an encoder, or raw text passed through unchanged.
    Text(String),
    /// Key/value pairs the transport sends as a urlencoded form.
    Form(Vec<(String, String)>),
    /// Text and file parts the transport sends as `multipart/form-data`.
    Multipart(Multipart),
}

impl RequestBody {
    /// The body as it goes on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            RequestBody::Multipart(form) => form.to_bytes(),
            other => other.to_text().into_bytes(),
        }
    }

    /// The wire body as text. Multipart file bytes that are not UTF-8 are
    /// replaced lossily.
    pub fn to_text(&self) -> String {
        match self {
            RequestBody::Text(text) => text.clone(),
            RequestBody::Form(pairs) => crate::codec::form_encode(pairs),
            RequestBody::Multipart(form) => String::from_utf8_lossy(&form.to_bytes()).into_owned(),
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<RequestBody>,
}

/// An HTTP response described as plain data.
///
/// Only successful (2xx/3xx) exchanges reach the client as a response;
/// anything else comes back from the transport as a `TransportError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}
