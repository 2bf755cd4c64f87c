//! Structured error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub const INVALID_BODY: &str = "api.context.invalid_body_param.app_error";
pub const SESSION_EXPIRED: &str = "api.context.session_expired.app_error";
pub const PERMISSIONS: &str = "api.context.permissions.app_error";
pub const INVALID_CREDENTIALS: &str = "api.user.login.invalid_credentials";
pub const LDAP_UNAVAILABLE: &str = "api.user.login_ldap.not_available.app_error";
pub const USER_MISSING: &str = "store.sql_user.missing_account.const";
pub const USER_EXISTING: &str = "store.sql_user.save.existing.app_error";
pub const EMAIL_EXISTS: &str = "store.sql_user.save.email_exists.app_error";
pub const USERNAME_EXISTS: &str = "store.sql_user.save.username_exists.app_error";
pub const INVALID_EMAIL: &str = "model.user.is_valid.email.app_error";
pub const INVALID_USERNAME: &str = "model.user.is_valid.username.app_error";
pub const INVALID_PASSWORD: &str = "model.user.is_valid.pwd_length.app_error";
pub const INCORRECT_PASSWORD: &str = "api.user.update_password.incorrect.app_error";
pub const INVALID_ROLE: &str = "api.user.update_roles.invalid_role.app_error";
pub const INVALID_RESET_LINK: &str = "api.user.reset_password.invalid_link.app_error";
pub const TEAM_MISSING: &str = "store.sql_team.get.find.app_error";
pub const TEAM_EXISTS: &str = "store.sql_team.save.domain_exists.app_error";
pub const INVALID_TEAM_NAME: &str = "model.team.is_valid.name.app_error";
pub const TEAM_MEMBER_MISSING: &str = "store.sql_team.get_member.missing.app_error";
pub const CHANNEL_MISSING: &str = "store.sql_channel.get.existing.app_error";
pub const CHANNEL_EXISTS: &str = "store.sql_channel.save_channel.exists.app_error";
pub const INVALID_CHANNEL_NAME: &str = "model.channel.is_valid.name.app_error";
pub const DIRECT_VIA_CREATE: &str = "api.channel.create_channel.direct_channel.app_error";
pub const CHANNEL_MEMBER_MISSING: &str = "store.sql_channel.get_member.missing.app_error";
pub const POST_MISSING: &str = "store.sql_post.get.app_error";
pub const INVALID_ROOT: &str = "api.post.create_post.root_id.app_error";

/// An error answer: status plus a stable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub id: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, id: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            id,
            message: message.into(),
        }
    }

    pub fn bad_request(id: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, id, message)
    }

    pub fn invalid_body(detail: impl Into<String>) -> Self {
        Self::bad_request(INVALID_BODY, detail)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            SESSION_EXPIRED,
            "Invalid or expired session, please login again.",
        )
    }

    pub fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            PERMISSIONS,
            "You do not have the appropriate permissions",
        )
    }

    pub fn not_found(id: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, id, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "id": self.id,
            "message": self.message,
            "detailed_error": "",
            "status_code": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
