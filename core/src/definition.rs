//! Shared, per-client-type configuration: codec hooks and default headers.
//!
//! # Design
//! A `ClientDefinition` is populated once at startup and then wrapped in an
//! `Arc`, after which every `Client` built from it reads it without locking.
//! Hooks are stored as plain function values and invoked at request time.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::codec;
use crate::error::CodecError;
use crate::http::{Headers, RequestBody};
use crate::multipart::Multipart;

/// Encoder hook: turns request data into body text.
pub type Encoder = Arc<dyn Fn(&Value) -> Result<String, CodecError> + Send + Sync>;

/// Decoder hook: turns response body text into data.
pub type Decoder = Arc<dyn Fn(&str) -> Result<Value, CodecError> + Send + Sync>;

/// Codecs and static headers shared by every client of one kind.
#[derive(Clone, Default)]
pub struct ClientDefinition {
    encoder: Option<Encoder>,
    decoder: Option<Decoder>,
    headers: Headers,
}

impl ClientDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// A definition that speaks JSON both ways and advertises it in headers.
    pub fn json() -> Self {
        let mut definition = Self::new();
        definition
            .register_encoder(codec::json_encode)
            .register_decoder(codec::json_decode)
            .set_header("Accept", "application/json")
            .set_header("Content-Type", "application/json");
        definition
    }

    pub fn register_encoder<F>(&mut self, encoder: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<String, CodecError> + Send + Sync + 'static,
    {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    pub fn register_decoder<F>(&mut self, decoder: F) -> &mut Self
    where
        F: Fn(&str) -> Result<Value, CodecError> + Send + Sync + 'static,
    {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Add a default header, replacing any earlier value for the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Encode request data into a body.
    ///
    /// Absent data (`None`) never reaches the encoder and yields no body. A
    /// registered encoder receives every present value, `null` included.
    ///
    /// Without an encoder, `null` also yields no body, the same as it adds no
    /// querystring to GET and DELETE. Strings are sent verbatim. Mappings are
    /// sent as form pairs, or as multipart when they hold a file value. Any
    /// other value is sent as its JSON text.
    pub fn encode(&self, data: Option<&Value>) -> Result<Option<RequestBody>, CodecError> {
        let Some(data) = data else {
            return Ok(None);
        };
        let body = match &self.encoder {
            Some(encoder) => RequestBody::Text(encoder(data)?),
            None => match data {
                Value::Null => return Ok(None),
                Value::String(text) => RequestBody::Text(text.clone()),
                Value::Object(_) => match Multipart::from_value(data)? {
                    Some(form) => RequestBody::Multipart(form),
                    None => RequestBody::Form(codec::form_pairs(data)),
                },
                other => RequestBody::Text(other.to_string()),
            },
        };
        Ok(Some(body))
    }

    /// Decode a response body. Without a decoder the text is returned as a
    /// JSON string value, unchanged.
    pub fn decode(&self, body: &str) -> Result<Value, CodecError> {
        match &self.decoder {
            Some(decoder) => decoder(body),
            None => Ok(Value::String(body.to_string())),
        }
    }
}

impl fmt::Debug for ClientDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientDefinition")
            .field("encoder", &self.encoder.is_some())
            .field("decoder", &self.decoder.is_some())
            .field("headers", &self.headers)
            .finish()
    }
}
