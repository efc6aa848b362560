//! Error types for the harness client.
//!
//! # Design
//! Every failure reported by a transport is translated into the single
//! `ClientError::UnexpectedResponse` variant. Its message carries the
//! transport's description followed by the raw response body, and the
//! original `TransportError` stays reachable through `source()`. Codec
//! failures are not translated; they surface as `ClientError::Codec`
//! exactly as the hook produced them.

use thiserror::Error;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A failure reported by a `Transport`.
///
/// Produced for non-success statuses (4xx/5xx) and for failures that never
/// produced a response at all (connection refused, timeouts, bad TLS).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Human-readable description, e.g. `500 Internal Server Error`.
    pub message: String,
    /// Status code, when the server answered.
    pub status: Option<u16>,
    /// Raw response body, when the server answered.
    pub body: Option<String>,
    #[source]
    pub source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
            source: None,
        }
    }

    /// A failure for a response that arrived with a non-success status.
    pub fn status(status: u16, reason: &str, body: impl Into<String>) -> Self {
        let message = if reason.is_empty() {
            status.to_string()
        } else {
            format!("{status} {reason}")
        };
        Self {
            message,
            status: Some(status),
            body: Some(body.into()),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Failure raised by an encoder or decoder hook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CodecError {
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Errors returned by `Client` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport reported a failure. Always a translation of the
    /// underlying `TransportError`, which is kept as the source.
    #[error("{message}")]
    UnexpectedResponse {
        message: String,
        #[source]
        source: TransportError,
    },

    /// An encoder or decoder hook failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The request path could not be resolved against the base host.
    #[error("invalid request path `{path}`: {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl ClientError {
    pub(crate) fn unexpected_response(source: TransportError) -> Self {
        let message = match source.body.as_deref() {
            Some(body) if !body.is_empty() => format!("{}\n{}", source.message, body),
            _ => source.message.clone(),
        };
        ClientError::UnexpectedResponse { message, source }
    }

    /// Status code of the failed response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::UnexpectedResponse { source, .. } => source.status,
            _ => None,
        }
    }

    /// Raw body of the failed response, if the server answered.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ClientError::UnexpectedResponse { source, .. } => source.body.as_deref(),
            _ => None,
        }
    }
}

/// Errors raised while building a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} has invalid value `{value}`")]
    InvalidVar { name: &'static str, value: String },

    #[error("invalid base host `{value}`: {reason}")]
    InvalidBaseHost { value: String, reason: String },

    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}
