//! Credential held by a client between calls.
//!
//! Login stores a bearer token, logout clears it, and every request reads it
//! to build the single `Authorization` header. There is no locking; the
//! owning `Client` requires `&mut self` for the mutating operations.

use std::fmt;

use crate::http::HEADER_TOKEN;

pub const HEADER_BEARER: &str = "Bearer";

/// How the credential is presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthKind {
    #[default]
    Bearer,
    /// OAuth-style access token.
    OAuth,
}

impl AuthKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthKind::Bearer => HEADER_BEARER,
            AuthKind::OAuth => HEADER_TOKEN,
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: String,
    kind: AuthKind,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn kind(&self) -> AuthKind {
        self.kind
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    pub(crate) fn set(&mut self, token: impl Into<String>, kind: AuthKind) {
        self.token = token.into();
        self.kind = kind;
    }

    pub(crate) fn clear(&mut self) {
        self.token.clear();
        self.kind = AuthKind::Bearer;
    }

    /// `"{kind} {token}"`, or `None` when no credential is held.
    pub fn authorization(&self) -> Option<String> {
        self.is_authenticated()
            .then(|| format!("{} {}", self.kind, self.token))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("kind", &self.kind)
            .finish()
    }
}
