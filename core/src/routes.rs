//! Canonical API paths, relative to the versioned API root.
//!
//! Pure string builders. Ids are not validated; the server rejects bad ones.
//! Ids and query values are percent-encoded so every id reaches the server
//! intact. Sub-resource routes extend their parent route.

use url::form_urlencoded;

pub const API_URL_SUFFIX: &str = "/api/v4";

pub fn users() -> String {
    "/users".to_string()
}

pub fn user(user_id: &str) -> String {
    format!("{}/{}", users(), segment(user_id))
}

pub fn user_by_username(username: &str) -> String {
    format!("{}/username/{}", users(), segment(username))
}

pub fn user_by_email(email: &str) -> String {
    format!("{}/email/{}", users(), segment(email))
}

pub fn teams() -> String {
    "/teams".to_string()
}

pub fn team(team_id: &str) -> String {
    format!("{}/{}", teams(), segment(team_id))
}

pub fn team_member(team_id: &str, user_id: &str) -> String {
    format!("{}/members/{}", team(team_id), segment(user_id))
}

pub fn channels() -> String {
    "/channels".to_string()
}

pub fn channel(channel_id: &str) -> String {
    format!("{}/{}", channels(), segment(channel_id))
}

pub fn channel_members(channel_id: &str) -> String {
    format!("{}/members", channel(channel_id))
}

pub fn channel_member(channel_id: &str, user_id: &str) -> String {
    format!("{}/{}", channel_members(channel_id), segment(user_id))
}

pub fn posts() -> String {
    "/posts".to_string()
}

pub fn post(post_id: &str) -> String {
    format!("{}/{}", posts(), segment(post_id))
}

/// One path segment, percent-encoded. Spaces become `%20`, not `+`.
pub fn segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `?page=..&per_page=..` preceded by any extra `key=value` filters.
pub fn paged_query(filters: &[(&str, &str)], page: u32, per_page: u32) -> String {
    let mut query = form_urlencoded::Serializer::for_suffix(String::from("?"), 1);
    query.extend_pairs(filters.iter().copied());
    query
        .append_pair("page", &page.to_string())
        .append_pair("per_page", &per_page.to_string());
    query.finish()
}
