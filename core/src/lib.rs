//! Configurable HTTP client for driving a web service under test.
//!
//! # Overview
//! A `ClientDefinition` declares, once, how a family of clients encodes
//! request data, decodes response bodies, and which headers it always
//! sends. A `Client` binds a shared definition to a base host and an injected
//! `Transport`, and exposes `get`, `post`, `put`, `delete`, and the generic
//! `request`.
//!
//! # Design
//! - Data is `serde_json::Value`; absent data is `None` and is never encoded.
//! - Bodyless verbs (GET, DELETE) carry their data in the querystring.
//! - Without an encoder, mappings holding `file_part` values are sent as
//!   `multipart/form-data`.
//! - Call-site headers override definition headers of the same name.
//! - Every transport failure surfaces as `ClientError::UnexpectedResponse`,
//!   carrying the failure message and response body, with the original
//!   `TransportError` as its source. One attempt per call, no retries.
//! - The transport owns redirects, timeouts, and connection reuse;
//!   `UreqTransport` is the blocking implementation shipped here.

pub mod client;
pub mod codec;
pub mod config;
pub mod definition;
pub mod error;
pub mod http;
pub mod multipart;
pub mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use definition::{ClientDefinition, Decoder, Encoder};
pub use error::{ClientError, CodecError, ConfigError, TransportError};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use multipart::{file_from_path, file_part, Multipart, Part};
pub use transport::{Transport, UreqTransport};
