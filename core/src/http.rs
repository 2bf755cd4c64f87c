//! HTTP transport types and the network seam.
//!
//! # Design
//! Requests are described as plain data. The client decides every header
//! (auth, conditional cache token, connection policy) while building an
//! `HttpRequest`, then hands it to a `Transport`, which only moves bytes.
//! `UreqTransport` is the production transport; tests substitute their own.
//!
//! Response bodies stay streaming. `ResponseBody` owns the byte source and
//! releases it when consumed by a decode or when dropped, so every exit path
//! of the executor releases the body exactly once.

use std::fmt;
use std::io::{self, Read};
use std::time::Duration;

pub const HEADER_REQUEST_ID: &str = "X-Request-ID";
pub const HEADER_VERSION_ID: &str = "X-Version-ID";
pub const HEADER_ETAG_SERVER: &str = "ETag";
pub const HEADER_ETAG_CLIENT: &str = "If-None-Match";
pub const HEADER_AUTH: &str = "Authorization";
pub const HEADER_TOKEN: &str = "Token";
pub const HEADER_CONNECTION: &str = "Connection";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_USER_AGENT: &str = "User-Agent";

/// Error produced by a transport when no response was obtained at all.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Number of headers named `name`, ignoring case.
    pub fn header_count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .count()
    }
}

/// A response as returned by a `Transport`: status, headers and a body that
/// has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Owned, single-use response body.
///
/// Reading consumes the value; dropping it unread releases the underlying
/// connection resource.
pub struct ResponseBody {
    reader: Box<dyn Read>,
}

impl ResponseBody {
    pub fn new(reader: impl Read + 'static) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    pub fn empty() -> Self {
        Self::new(io::empty())
    }

    pub fn from_string(body: impl Into<String>) -> Self {
        Self::new(io::Cursor::new(body.into().into_bytes()))
    }

    /// Read the remaining bytes as UTF-8 text and release the source.
    pub fn read_to_string(mut self) -> io::Result<String> {
        let mut text = String::new();
        self.reader.read_to_string(&mut text)?;
        Ok(text)
    }

    /// Hand out the byte source for a streaming decode. The source is
    /// released when the returned reader is dropped.
    pub fn into_reader(self) -> Box<dyn Read> {
        self.reader
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseBody { .. }")
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Executes one request and returns the server's answer, whatever its status.
///
/// Implementations must not treat non-2xx statuses as errors; only failures
/// that prevent obtaining a response at all are reported as `Err`.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a reusable ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let response = match (method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(&url), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(&url), &headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(&url), &headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(&url), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(&url), &headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(&url), &headers).send_empty(),
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = ResponseBody::new(response.into_body().into_reader());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
