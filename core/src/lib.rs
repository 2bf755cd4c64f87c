//! Typed blocking client for the v4 HTTP API of a collaboration server.
//!
//! # Overview
//! Every resource operation (users, teams, channels, posts) is expressed the
//! same way: build a route, encode the body, run it through the request
//! executor, decode the typed result. Callers get either an `ApiResponse<T>`
//! (typed payload plus the server's response metadata) or a `ClientError`
//! telling transport failures, server-side errors and undecodable bodies
//! apart.
//!
//! # Design
//! - `Client` owns the base URLs, a reusable `Transport` and the current
//!   credential. Login and logout need `&mut self`; nothing else mutates.
//! - Requests are plain data (`HttpRequest`) so header handling is testable
//!   without a network; `UreqTransport` does the real I/O.
//! - No retries anywhere. One call, one attempt.
//! - Conditional requests are pass-through: supply the `etag` from a previous
//!   response and a 304 comes back as `data: None`.
//! - DTOs are defined independently from the mock-server crate; the
//!   end-to-end tests catch schema drift.

pub mod channels;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod posts;
pub mod response;
pub mod routes;
pub mod session;
pub mod teams;
pub mod types;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{Client, Exchange};
pub use config::{ClientConfig, ConfigError, DecodeMode};
pub use error::{AppError, ClientError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody, Transport, UreqTransport};
pub use response::{ApiResponse, ApiResult, Response};
pub use session::{AuthKind, Session};
pub use types::{
    Channel, ChannelMember, ChannelMembers, ChannelType, Post, PostList, Team, TeamMember,
    TeamType, User,
};
