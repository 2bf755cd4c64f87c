//! Request handlers, grouped by resource.

pub mod channels;
pub mod posts;
pub mod teams;
pub mod users;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::store::Store;

pub const HEADER_TOKEN: &str = "token";

/// Token from `Authorization: Bearer <t>` or `Authorization: Token <t>`.
pub fn auth_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (kind, token) = value.split_once(' ')?;
    let known = kind.eq_ignore_ascii_case("bearer") || kind.eq_ignore_ascii_case("token");
    (known && !token.is_empty()).then_some(token)
}

/// Id of the user owning the request's session.
pub fn current_user(store: &Store, headers: &HeaderMap) -> ApiResult<String> {
    auth_token(headers)
        .and_then(|token| store.session_user(token))
        .map(|user| user.id.clone())
        .ok_or_else(ApiError::unauthorized)
}

pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_body(e.to_string()))
}

/// 200 with the entity and its `ETag`, or 304 when the client already has
/// that version.
pub fn conditional<T: Serialize>(headers: &HeaderMap, etag: String, value: &T) -> Response {
    let matches = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    let mut response = if matches {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        Json(value).into_response()
    };
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

pub fn status_ok() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

pub fn created<T: Serialize>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(value))
}

pub fn page<T: Clone>(items: &[T], offset: usize, limit: usize) -> Vec<T> {
    items.iter().skip(offset).take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn auth_token_accepts_bearer_and_token_kinds() {
        assert_eq!(
            auth_token(&headers(&[(header::AUTHORIZATION, "Bearer abc")])),
            Some("abc")
        );
        assert_eq!(
            auth_token(&headers(&[(header::AUTHORIZATION, "token xyz")])),
            Some("xyz")
        );
        assert_eq!(auth_token(&headers(&[(header::AUTHORIZATION, "Basic abc")])), None);
        assert_eq!(auth_token(&HeaderMap::new()), None);
    }

    #[test]
    fn conditional_returns_not_modified_on_match() {
        let resp = conditional(
            &headers(&[(header::IF_NONE_MATCH, "u1.5")]),
            "u1.5".to_string(),
            &json!({}),
        );
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(resp.headers()[header::ETAG], "u1.5");

        let resp = conditional(&HeaderMap::new(), "u1.6".to_string(), &json!({}));
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn page_slices_items() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(page(&items, 2, 2), vec![3, 4]);
        assert!(page(&items, 10, 2).is_empty());
    }
}
