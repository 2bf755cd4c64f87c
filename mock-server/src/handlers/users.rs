use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::info;

use super::{conditional, created, current_user, page, parse_body, status_ok, HEADER_TOKEN};
use crate::error::*;
use crate::model::{
    ListQuery, LoginBody, PasswordBody, ResetBody, ResetSendBody, RolesBody, User,
    ROLE_SYSTEM_ADMIN, ROLE_SYSTEM_USER,
};
use crate::store::{new_id, Db, Store};

const MIN_PASSWORD_LEN: usize = 5;

fn check_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(
            INVALID_PASSWORD,
            format!("Your password must contain at least {MIN_PASSWORD_LEN} characters."),
        ));
    }
    Ok(())
}

/// Requester must be `user_id` or a system admin.
fn require_self_or_admin(store: &Store, requester: &str, user_id: &str) -> ApiResult<()> {
    if requester == user_id || store.is_admin(requester) {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

fn missing_user() -> ApiError {
    ApiError::not_found(USER_MISSING, "We couldn't find an existing account matching your criteria.")
}

pub async fn login(State(db): State<Db>, body: Bytes) -> ApiResult<Response> {
    let input: LoginBody = parse_body(&body)?;
    if input.ldap_only == "true" {
        return Err(ApiError::new(
            StatusCode::NOT_IMPLEMENTED,
            LDAP_UNAVAILABLE,
            "LDAP is not available on this server",
        ));
    }

    let mut store = db.write().await;
    let user = if input.id.is_empty() {
        store.find_user_by_login(&input.login_id)
    } else {
        store.users.get(&input.id)
    }
    .filter(|u| u.delete_at == 0 && u.password == input.password)
    .cloned()
    .ok_or_else(|| {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            INVALID_CREDENTIALS,
            "Enter a valid email or username and/or password.",
        )
    })?;

    let token = new_id();
    store.sessions.insert(token.clone(), user.id.clone());
    info!(user_id = %user.id, device = %input.device_id, "session created");

    let mut response = Json(user.sanitized()).into_response();
    if let Ok(value) = HeaderValue::from_str(&token) {
        response.headers_mut().insert(HEADER_TOKEN, value);
    }
    Ok(response)
}

pub async fn logout(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    current_user(&store, &headers)?;
    if let Some(token) = super::auth_token(&headers) {
        store.sessions.remove(token);
    }
    Ok(status_ok())
}

pub async fn create_user(
    State(db): State<Db>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<User>)> {
    let input: User = parse_body(&body)?;
    if !input.id.is_empty() {
        return Err(ApiError::bad_request(USER_EXISTING, "Must call update for existing user"));
    }
    let email = input.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::bad_request(INVALID_EMAIL, "Invalid email"));
    }
    let username = input.username.trim().to_lowercase();
    if username.is_empty() || username.contains(char::is_whitespace) {
        return Err(ApiError::bad_request(INVALID_USERNAME, "Invalid username"));
    }
    check_password(&input.password)?;

    let mut store = db.write().await;
    if store.find_user_by_email(&email).is_some() {
        return Err(ApiError::bad_request(EMAIL_EXISTS, "An account with that email already exists."));
    }
    if store.find_user_by_username(&username).is_some() {
        return Err(ApiError::bad_request(USERNAME_EXISTS, "An account with that username already exists."));
    }

    let now = store.tick();
    let user = User {
        id: new_id(),
        create_at: now,
        update_at: now,
        delete_at: 0,
        username,
        email,
        email_verified: false,
        roles: ROLE_SYSTEM_USER.to_string(),
        auth_data: None,
        mfa_active: false,
        mfa_secret: String::new(),
        last_password_update: now,
        ..input
    };
    store.users.insert(user.id.clone(), user.clone());
    info!(user_id = %user.id, username = %user.username, "user created");
    Ok(created(user.sanitized()))
}

pub async fn get_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let store = db.read().await;
    current_user(&store, &headers)?;
    let user = store.users.get(&user_id).ok_or_else(missing_user)?;
    Ok(conditional(&headers, user.etag(), &user.sanitized()))
}

pub async fn get_user_by_username(
    State(db): State<Db>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let store = db.read().await;
    current_user(&store, &headers)?;
    let user = store
        .find_user_by_username(&username.to_lowercase())
        .ok_or_else(missing_user)?;
    Ok(conditional(&headers, user.etag(), &user.sanitized()))
}

pub async fn get_user_by_email(
    State(db): State<Db>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let store = db.read().await;
    current_user(&store, &headers)?;
    let user = store.find_user_by_email(&email).ok_or_else(missing_user)?;
    Ok(conditional(&headers, user.etag(), &user.sanitized()))
}

pub async fn get_users(
    State(db): State<Db>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<User>>> {
    let store = db.read().await;
    current_user(&store, &headers)?;

    let mut ids: Vec<String> = match (&query.in_team, &query.in_channel) {
        (_, Some(channel_id)) => store.channel_member_ids(channel_id),
        (Some(team_id), None) => store.team_member_ids(team_id),
        (None, None) => store.users.keys().cloned().collect(),
    };
    if let Some(channel_id) = &query.not_in_channel {
        let members = store.channel_member_ids(channel_id);
        ids.retain(|id| !members.contains(id));
    }

    let mut users: Vec<User> = ids
        .iter()
        .filter_map(|id| store.users.get(id))
        .map(User::sanitized)
        .collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    let (offset, limit) = query.window();
    Ok(Json(page(&users, offset, limit)))
}

pub async fn get_users_by_ids(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Vec<User>>> {
    let ids: Vec<String> = parse_body(&body)?;
    if ids.is_empty() {
        return Err(ApiError::invalid_body("user_ids"));
    }
    let store = db.read().await;
    current_user(&store, &headers)?;
    let users = ids
        .iter()
        .filter_map(|id| store.users.get(id))
        .map(User::sanitized)
        .collect();
    Ok(Json(users))
}

pub async fn update_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<User>> {
    let input: User = parse_body(&body)?;
    if input.id != user_id {
        return Err(ApiError::invalid_body("user"));
    }
    let mut store = db.write().await;
    let requester = current_user(&store, &headers)?;
    require_self_or_admin(&store, &requester, &user_id)?;
    let now = store.tick();
    let user = store.users.get_mut(&user_id).ok_or_else(missing_user)?;

    if !input.username.is_empty() {
        user.username = input.username.to_lowercase();
    }
    if !input.email.is_empty() {
        user.email = input.email.to_lowercase();
    }
    user.nickname = input.nickname;
    user.first_name = input.first_name;
    user.last_name = input.last_name;
    user.position = input.position;
    user.locale = input.locale;
    user.props = input.props;
    user.notify_props = input.notify_props;
    user.update_at = now;
    Ok(Json(user.sanitized()))
}

pub async fn update_password(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let input: PasswordBody = parse_body(&body)?;
    let mut store = db.write().await;
    let requester = current_user(&store, &headers)?;
    require_self_or_admin(&store, &requester, &user_id)?;
    let acting_as_admin = requester != user_id;
    check_password(&input.new_password)?;

    let now = store.tick();
    let user = store.users.get_mut(&user_id).ok_or_else(missing_user)?;
    if !acting_as_admin && user.password != input.current_password {
        return Err(ApiError::bad_request(
            INCORRECT_PASSWORD,
            "The \"Current Password\" you entered is incorrect.",
        ));
    }
    user.password = input.new_password;
    user.last_password_update = now;
    user.update_at = now;
    Ok(status_ok())
}

pub async fn update_roles(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let input: RolesBody = parse_body(&body)?;
    let mut store = db.write().await;
    let requester = current_user(&store, &headers)?;
    if !store.is_admin(&requester) {
        return Err(ApiError::forbidden());
    }
    let valid = input
        .roles
        .split_whitespace()
        .all(|role| role == ROLE_SYSTEM_USER || role == ROLE_SYSTEM_ADMIN);
    if !valid || input.roles.trim().is_empty() {
        return Err(ApiError::bad_request(INVALID_ROLE, "Invalid role"));
    }
    let now = store.tick();
    let user = store.users.get_mut(&user_id).ok_or_else(missing_user)?;
    user.roles = input.roles.split_whitespace().collect::<Vec<_>>().join(" ");
    user.update_at = now;
    Ok(status_ok())
}

pub async fn delete_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let requester = current_user(&store, &headers)?;
    require_self_or_admin(&store, &requester, &user_id)?;
    let now = store.tick();
    let user = store.users.get_mut(&user_id).ok_or_else(missing_user)?;
    user.delete_at = now;
    user.update_at = now;
    store.revoke_sessions(&user_id);
    info!(%user_id, "user deactivated");
    Ok(status_ok())
}

pub async fn send_password_reset(State(db): State<Db>, body: Bytes) -> ApiResult<Json<Value>> {
    let input: ResetSendBody = parse_body(&body)?;
    if input.email.trim().is_empty() {
        return Err(ApiError::invalid_body("email"));
    }
    let mut store = db.write().await;
    let user_id = store.find_user_by_email(&input.email).map(|u| u.id.clone());
    if let Some(user_id) = user_id {
        store.reset_codes.insert(new_id(), user_id);
    }
    Ok(status_ok())
}

pub async fn reset_password(State(db): State<Db>, body: Bytes) -> ApiResult<Json<Value>> {
    let input: ResetBody = parse_body(&body)?;
    let mut store = db.write().await;
    let user_id = store.reset_codes.get(&input.code).cloned().ok_or_else(|| {
        ApiError::bad_request(INVALID_RESET_LINK, "The reset link provided is invalid")
    })?;
    check_password(&input.new_password)?;
    store.reset_codes.remove(&input.code);
    let now = store.tick();
    let user = store.users.get_mut(&user_id).ok_or_else(missing_user)?;
    user.password = input.new_password;
    user.last_password_update = now;
    user.update_at = now;
    Ok(status_ok())
}
