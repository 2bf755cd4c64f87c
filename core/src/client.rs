//! The client handle and the request executor.
//!
//! # Design
//! Every resource operation goes through one path:
//! `build_request` (pure: url, auth, cache token, connection policy) →
//! `Transport::send` (one network attempt, no retry) → `classify` (304,
//! failure, success) → `decode_into` (typed payload or decode ambiguity).
//!
//! Response bodies are owned values. The 304 and failure branches consume or
//! drop the body before returning; on success the body moves into the
//! decoder, which drops it when done. Nothing here can leak a body.
//!
//! The credential is the only mutable state. `login*` and `logout` take
//! `&mut self`; everything else takes `&self`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::codec;
use crate::config::{ClientConfig, DecodeMode};
use crate::error::ClientError;
use crate::http::{
    find_header, HttpMethod, HttpRequest, ResponseBody, Transport, UreqTransport, HEADER_AUTH,
    HEADER_CONNECTION, HEADER_CONTENT_TYPE, HEADER_ETAG_CLIENT, HEADER_USER_AGENT,
};
use crate::response::{ApiResponse, ApiResult, Response};
use crate::routes::API_URL_SUFFIX;
use crate::session::{AuthKind, Session};

/// A successful exchange before typed decoding.
///
/// `body` is `None` for 304 Not Modified.
#[derive(Debug)]
pub struct Exchange {
    pub response: Response,
    pub headers: Vec<(String, String)>,
    pub body: Option<ResponseBody>,
}

impl Exchange {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Blocking client for the v4 API of one server.
pub struct Client {
    url: String,
    api_url: String,
    transport: Arc<dyn Transport>,
    session: Session,
    decode_mode: DecodeMode,
    user_agent: String,
}

impl Client {
    /// Client for `url` (e.g. `http://localhost:8065`) over the default
    /// ureq transport.
    pub fn new(url: &str) -> Self {
        Self::from_config(&ClientConfig::new(url))
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let transport = Arc::new(UreqTransport::new(config.timeout));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let url = config.url.trim_end_matches('/').to_string();
        Self {
            api_url: format!("{url}{API_URL_SUFFIX}"),
            url,
            transport,
            session: Session::default(),
            decode_mode: config.decode_mode,
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn decode_mode(&self) -> DecodeMode {
        self.decode_mode
    }

    pub fn set_decode_mode(&mut self, decode_mode: DecodeMode) {
        self.decode_mode = decode_mode;
    }

    /// Use an OAuth access token for subsequent requests.
    pub fn set_oauth_token(&mut self, token: &str) {
        self.session.set(token, AuthKind::OAuth);
    }

    pub fn clear_oauth_token(&mut self) {
        self.session.clear();
    }

    pub(crate) fn set_bearer_token(&mut self, token: &str) {
        self.session.set(token, AuthKind::Bearer);
    }

    pub(crate) fn clear_session(&mut self) {
        self.session.clear();
    }

    /// Describe the request for `method path` without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        etag: &str,
    ) -> HttpRequest {
        let mut headers = vec![
            (HEADER_CONNECTION.to_string(), "close".to_string()),
            (HEADER_USER_AGENT.to_string(), self.user_agent.clone()),
        ];
        if body.is_some() {
            headers.push((HEADER_CONTENT_TYPE.to_string(), "application/json".to_string()));
        }
        if !etag.is_empty() {
            headers.push((HEADER_ETAG_CLIENT.to_string(), etag.to_string()));
        }
        if let Some(authorization) = self.session.authorization() {
            headers.push((HEADER_AUTH.to_string(), authorization));
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.api_url),
            headers,
            body,
        }
    }

    /// Perform one request and classify the outcome.
    ///
    /// - transport failure → `ClientError::Transport`, no status code
    /// - 304 → `Exchange` without body; the body is released unread
    /// - status ≥ 300 → `ClientError::Application` with the decoded `AppError`
    /// - otherwise → `Exchange` carrying the undecoded body
    pub fn do_api_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        etag: &str,
    ) -> Result<Exchange, ClientError> {
        let request = self.build_request(method, path, body, etag);
        let url = request.url.clone();
        debug!(%method, %url, "sending api request");

        let http = self.transport.send(request).map_err(|source| {
            warn!(%method, %url, error = %source, "api request did not reach the server");
            ClientError::Transport {
                url: url.clone(),
                source,
            }
        })?;

        let mut response = Response::from_http(&http);
        debug!(
            %method,
            %url,
            status = response.status_code,
            request_id = %response.request_id,
            "received api response"
        );

        match http.status {
            304 => {
                drop(http.body);
                Ok(Exchange {
                    response,
                    headers: http.headers,
                    body: None,
                })
            }
            status if status >= 300 => {
                let mut error = codec::decode_app_error(http.body);
                if error.status_code == 0 {
                    error.status_code = status;
                }
                response.error = Some(error);
                Err(ClientError::Application(Box::new(response)))
            }
            _ => Ok(Exchange {
                response,
                headers: http.headers,
                body: Some(http.body),
            }),
        }
    }

    pub fn do_api_get(&self, path: &str, etag: &str) -> Result<Exchange, ClientError> {
        self.do_api_request(HttpMethod::Get, path, None, etag)
    }

    pub fn do_api_post(&self, path: &str, data: Option<String>) -> Result<Exchange, ClientError> {
        self.do_api_request(HttpMethod::Post, path, data, "")
    }

    pub fn do_api_put(&self, path: &str, data: String) -> Result<Exchange, ClientError> {
        self.do_api_request(HttpMethod::Put, path, Some(data), "")
    }

    pub fn do_api_delete(&self, path: &str) -> Result<Exchange, ClientError> {
        self.do_api_request(HttpMethod::Delete, path, None, "")
    }

    /// Decode the exchange body as `T`, honoring the decode mode.
    pub(crate) fn decode_into<T>(&self, exchange: Exchange) -> ApiResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let Exchange { response, body, .. } = exchange;
        let Some(body) = body else {
            return Ok(ApiResponse::not_modified(response));
        };
        match codec::decode(body) {
            Ok(data) => Ok(ApiResponse::new(data, response)),
            Err(source) => match self.decode_mode {
                DecodeMode::Strict => Err(ClientError::DecodeAmbiguity {
                    response: Box::new(response),
                    source,
                }),
                DecodeMode::Lenient => {
                    warn!(
                        status = response.status_code,
                        request_id = %response.request_id,
                        error = %source,
                        "response body did not match the expected shape; using zero value"
                    );
                    Ok(ApiResponse::new(T::default(), response))
                }
            },
        }
    }

    /// Decode the `{"status":"OK"}` acknowledgement.
    pub(crate) fn decode_status_ok(&self, exchange: Exchange) -> ApiResult<bool> {
        Ok(self
            .decode_into::<std::collections::BTreeMap<String, String>>(exchange)?
            .map(|map| codec::is_status_ok(&map)))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url)
            .field("api_url", &self.api_url)
            .field("session", &self.session)
            .field("decode_mode", &self.decode_mode)
            .finish_non_exhaustive()
    }
}
