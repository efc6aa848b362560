//! Request pipeline for a client bound to a base host and a transport.
//!
//! # Design
//! `Client` holds no mutable state. Every call runs the same linear
//! sequence: encode the data, merge headers, resolve the URL, transmit once,
//! then either decode the body or translate the transport failure into
//! `ClientError::UnexpectedResponse`. There is no retry and no fallback.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::codec;
use crate::config::ClientConfig;
use crate::definition::ClientDefinition;
use crate::error::ClientError;
use crate::http::{Headers, HttpMethod, HttpRequest};
use crate::transport::Transport;

/// A client instance: a shared definition, a base host, and a transport.
#[derive(Debug, Clone)]
pub struct Client<T> {
    definition: Arc<ClientDefinition>,
    base_host: Url,
    transport: T,
}

impl<T: Transport> Client<T> {
    pub fn new(definition: Arc<ClientDefinition>, config: &ClientConfig, transport: T) -> Self {
        Self {
            definition,
            base_host: config.base_host.clone(),
            transport,
        }
    }

    /// GET with `data` appended to `path` as a querystring.
    pub fn get(&self, path: &str, data: Option<&Value>, headers: Option<&Headers>) -> Result<Value, ClientError> {
        self.request(HttpMethod::Get, &with_query(path, data), None, headers)
    }

    /// DELETE with `data` appended to `path` as a querystring.
    pub fn delete(&self, path: &str, data: Option<&Value>, headers: Option<&Headers>) -> Result<Value, ClientError> {
        self.request(HttpMethod::Delete, &with_query(path, data), None, headers)
    }

    pub fn post(&self, path: &str, data: Option<&Value>, headers: Option<&Headers>) -> Result<Value, ClientError> {
        self.request(HttpMethod::Post, path, data, headers)
    }

    pub fn put(&self, path: &str, data: Option<&Value>, headers: Option<&Headers>) -> Result<Value, ClientError> {
        self.request(HttpMethod::Put, path, data, headers)
    }

    /// Run the full pipeline for one request.
    ///
    /// `data` is encoded into the body as is, whatever the method; use the
    /// verb helpers for querystring handling.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        data: Option<&Value>,
        headers: Option<&Headers>,
    ) -> Result<Value, ClientError> {
        let body = self.definition.encode(data)?;
        let headers = match headers {
            Some(call) if !call.is_empty() => self.definition.headers().merged_with(call),
            _ => self.definition.headers().clone(),
        };
        let url = self.resolve(path)?;

        debug!(%method, %url, has_body = body.is_some(), "sending request");
        let request = HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        };
        let response = self.transport.send(request).map_err(|e| {
            warn!(%method, path, error = %e, status = ?e.status, "transport failure");
            ClientError::unexpected_response(e)
        })?;
        debug!(%method, path, status = response.status, "response received");

        Ok(self.definition.decode(&response.body)?)
    }

    /// Join `path` onto the base host. Absolute URLs replace the base.
    pub fn resolve(&self, path: &str) -> Result<Url, ClientError> {
        self.base_host.join(path).map_err(|source| ClientError::InvalidUrl {
            path: path.to_string(),
            source,
        })
    }
}

fn with_query(path: &str, data: Option<&Value>) -> String {
    match codec::querystring(data) {
        Some(query) => codec::append_query(path, &query),
        None => path.to_string(),
    }
}
