//! Error types for the collaboration API client.
//!
//! # Design
//! Three things can go wrong with one request, and callers need to tell them
//! apart without parsing messages:
//! - the request never reached the server (`Transport`, no status code),
//! - the server answered with a non-2xx, non-304 status and an `AppError`
//!   body (`Application`),
//! - the server answered 2xx but the body did not have the expected shape
//!   (`DecodeAmbiguity`, only raised in strict decode mode).
//!
//! `ClientError::id` gives a stable identifier for every case. Only the id is
//! meant for branching; messages are for humans.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::TransportError;
use crate::response::Response;

pub const CONNECTING_ERROR_ID: &str = "model.client.connecting.app_error";
pub const DECODE_ERROR_ID: &str = "model.client.decode.app_error";
pub const DECODE_JSON_ERROR_ID: &str = "model.utils.decode_json.app_error";

/// Structured error body sent by the server on failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{id}: {message}")]
#[serde(default)]
pub struct AppError {
    /// Stable identifier, safe for programmatic branching.
    pub id: String,
    pub message: String,
    #[serde(rename = "detailed_error", alias = "detail_message")]
    pub detailed_error: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub status_code: u16,
    #[serde(rename = "where", skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_oauth: bool,
}

fn is_zero(value: &u16) -> bool {
    *value == 0
}

impl AppError {
    pub fn new(
        location: impl Into<String>,
        id: impl Into<String>,
        detailed_error: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            message: id.clone(),
            id,
            detailed_error: detailed_error.into(),
            location: location.into(),
            ..Self::default()
        }
    }
}

/// Errors returned by `Client` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was obtained: DNS failure, refused connection, timeout.
    #[error("unable to reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The server rejected the request. `Response::error` is always set.
    #[error("request failed with status {}: {}", .0.status_code, .0.error_id())]
    Application(Box<Response>),

    /// A success response whose body did not match the expected shape.
    #[error("response with status {} did not match the expected shape: {source}", .response.status_code)]
    DecodeAmbiguity {
        response: Box<Response>,
        #[source]
        source: serde_json::Error,
    },

    /// The request payload could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ClientError {
    /// Stable identifier for this failure.
    pub fn id(&self) -> &str {
        match self {
            ClientError::Transport { .. } => CONNECTING_ERROR_ID,
            ClientError::Application(response) => response.error_id(),
            ClientError::DecodeAmbiguity { .. } => DECODE_ERROR_ID,
            ClientError::Encode(_) => DECODE_JSON_ERROR_ID,
        }
    }

    /// HTTP status of the response, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        self.response().map(|response| response.status_code)
    }

    /// Response metadata, absent for transport and encode failures.
    pub fn response(&self) -> Option<&Response> {
        match self {
            ClientError::Application(response) => Some(response),
            ClientError::DecodeAmbiguity { response, .. } => Some(response),
            ClientError::Transport { .. } | ClientError::Encode(_) => None,
        }
    }

    /// The server's structured error, for application failures.
    pub fn app_error(&self) -> Option<&AppError> {
        match self {
            ClientError::Application(response) => response.error.as_ref(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }
}
