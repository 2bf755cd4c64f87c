//! In-memory stand-in for the collaboration server's v4 API.
//!
//! Implements the slice of the API the client library talks to: users and
//! sessions, teams, channels and posts. Enough of the real server's
//! behavior is reproduced for end-to-end tests to be meaningful: session
//! tokens in the `Token` header, `ETag`/`If-None-Match` handling, sanitized
//! users and structured error bodies with stable ids.
//!
//! State lives in a single `RwLock`ed `Store`; nothing is persisted.

pub mod error;
pub mod fixture;
pub mod handlers;
pub mod model;
pub mod store;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use handlers::{channels, posts, teams, users};
use store::{new_id, Db, Store};

pub use fixture::TestServer;

pub const API_PREFIX: &str = "/api/v4";
pub const SERVER_VERSION: &str = "4.0.0.mock";

/// Router over a fresh, empty store.
pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Store::default())))
}

/// Router over a shared store, so callers can seed or inspect state.
pub fn app_with(db: Db) -> Router {
    let api = Router::new()
        .route("/users", get(users::get_users).post(users::create_user))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/ids", post(users::get_users_by_ids))
        .route("/users/username/{username}", get(users::get_user_by_username))
        .route("/users/email/{email}", get(users::get_user_by_email))
        .route("/users/password/reset", post(users::reset_password))
        .route("/users/password/reset/send", post(users::send_password_reset))
        .route(
            "/users/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{user_id}/password", put(users::update_password))
        .route("/users/{user_id}/roles", put(users::update_roles))
        .route("/users/{user_id}/teams", get(teams::get_teams_for_user))
        .route(
            "/users/{user_id}/teams/{team_id}/channels/members",
            get(channels::get_channel_members_for_user),
        )
        .route("/teams", post(teams::create_team))
        .route("/teams/{team_id}", get(teams::get_team))
        .route("/teams/{team_id}/members/{user_id}", get(teams::get_team_member))
        .route("/channels", post(channels::create_channel))
        .route("/channels/direct", post(channels::create_direct_channel))
        .route("/channels/{channel_id}/members", get(channels::get_channel_members))
        .route(
            "/channels/{channel_id}/members/{user_id}",
            get(channels::get_channel_member),
        )
        .route("/channels/{channel_id}/posts", get(posts::get_posts_for_channel))
        .route("/posts", post(posts::create_post))
        .route("/posts/{post_id}", get(posts::get_post))
        .route("/posts/{post_id}/thread", get(posts::get_post_thread))
        .with_state(db);

    Router::new()
        .nest(API_PREFIX, api)
        .layer(middleware::map_response(stamp_headers))
}

/// Every answer carries a request id and the server version.
async fn stamp_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&new_id()) {
        headers.insert("x-request-id", value);
    }
    headers.insert("x-version-id", HeaderValue::from_static(SERVER_VERSION));
    response
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}
