//! The transport capability and its ureq-backed implementation.
//!
//! # Design
//! `Client` never touches the network itself. It hands a fully resolved
//! `HttpRequest` to a `Transport` and gets back either an `HttpResponse`
//! (2xx/3xx) or a `TransportError`. Redirect following, timeouts, TLS, and
//! connection reuse are all the transport's business. Tests inject a
//! recording fake; production code uses `UreqTransport`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::RequestBuilder;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse, RequestBody};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Performs one HTTP exchange.
///
/// Implementations must be safe to call from several threads at once.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking transport over a shared `ureq::Agent`.
///
/// Follows redirects up to the configured limit (a `303 See Other` is
/// re-issued as GET); past the limit the last 3xx is returned as the
/// response. Statuses of 400 and above are reported as `TransportError`
/// with the body attached.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::build(10, None, None)
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::build(config.max_redirects, config.timeout(), Some(config.user_agent.as_str()))
    }

    fn build(max_redirects: u32, timeout: Option<Duration>, user_agent: Option<&str>) -> Self {
        let mut builder = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(max_redirects)
            .max_redirects_will_error(false)
            .timeout_global(timeout);
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent);
        }
        Self {
            agent: builder.build().new_agent(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        // A multipart body always carries its own boundary in the content type.
        let payload = body.map(|body| {
            match &body {
                RequestBody::Form(_) if !headers.contains("content-type") => {
                    headers.insert("Content-Type", FORM_CONTENT_TYPE);
                }
                RequestBody::Multipart(form) => headers.insert("Content-Type", form.content_type()),
                _ => {}
            }
            body.to_bytes()
        });

        trace!(%method, %url, "ureq dispatch");
        let url = url.as_str();
        let result = match method {
            HttpMethod::Get => without_body(self.agent.get(url), &headers, payload),
            HttpMethod::Delete => without_body(self.agent.delete(url), &headers, payload),
            HttpMethod::Head => without_body(self.agent.head(url), &headers, payload),
            HttpMethod::Options => without_body(self.agent.options(url), &headers, payload),
            HttpMethod::Post => with_body(self.agent.post(url), &headers, payload),
            HttpMethod::Put => with_body(self.agent.put(url), &headers, payload),
            HttpMethod::Patch => with_body(self.agent.patch(url), &headers, payload),
        };
        let mut response =
            result.map_err(|e| TransportError::new(e.to_string()).with_source(e))?;

        let status = response.status();
        let response_headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::new(format!("failed to read response body: {e}")).with_source(e))?;

        if status.is_client_error() || status.is_server_error() {
            return Err(TransportError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                text,
            ));
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers: response_headers,
            body: text,
        })
    }
}

fn apply_headers<B>(mut builder: RequestBuilder<B>, headers: &Headers) -> RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

fn without_body(
    builder: RequestBuilder<WithoutBody>,
    headers: &Headers,
    payload: Option<Vec<u8>>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = apply_headers(builder, headers);
    match payload {
        None => builder.call(),
        Some(bytes) => builder.force_send_body().send(&bytes[..]),
    }
}

fn with_body(
    builder: RequestBuilder<WithBody>,
    headers: &Headers,
    payload: Option<Vec<u8>>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = apply_headers(builder, headers);
    match payload {
        None => builder.send_empty(),
        Some(bytes) => builder.send(&bytes[..]),
    }
}
