use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::info;

use super::{created, current_user, page, parse_body};
use crate::error::*;
use crate::model::{
    Channel, ChannelMember, ListQuery, CHANNEL_DIRECT, CHANNEL_OPEN, CHANNEL_PRIVATE,
    ROLE_CHANNEL_ADMIN, ROLE_CHANNEL_USER,
};
use crate::store::{new_id, Db, Store};

fn valid_name(name: &str) -> bool {
    (1..=64).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn missing_channel() -> ApiError {
    ApiError::not_found(CHANNEL_MISSING, "We couldn't find the existing channel")
}

/// Channel members and admins may read a channel's membership.
fn require_channel_access(store: &Store, channel_id: &str, requester: &str) -> ApiResult<()> {
    if !store.channels.contains_key(channel_id) {
        return Err(missing_channel());
    }
    if store.is_channel_member(channel_id, requester) || store.is_admin(requester) {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

pub async fn create_channel(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Channel>)> {
    let input: Channel = parse_body(&body)?;
    if !input.id.is_empty() {
        return Err(ApiError::invalid_body("channel.id"));
    }
    match input.channel_type.as_str() {
        CHANNEL_OPEN | CHANNEL_PRIVATE => {}
        _ => {
            return Err(ApiError::bad_request(
                DIRECT_VIA_CREATE,
                "Must use createDirectChannel API service for direct message channel creation",
            ))
        }
    }
    if !valid_name(&input.name) {
        return Err(ApiError::bad_request(INVALID_CHANNEL_NAME, "Invalid name"));
    }

    let mut store = db.write().await;
    let requester = current_user(&store, &headers)?;
    if !store.teams.contains_key(&input.team_id) {
        return Err(ApiError::not_found(TEAM_MISSING, "We couldn't find the existing team"));
    }
    if !store.is_team_member(&input.team_id, &requester) {
        return Err(ApiError::forbidden());
    }
    let duplicate = store
        .channels
        .values()
        .any(|c| c.team_id == input.team_id && c.name == input.name);
    if duplicate {
        return Err(ApiError::bad_request(
            CHANNEL_EXISTS,
            "A channel with that name already exists on the same team",
        ));
    }

    let now = store.tick();
    let channel = Channel {
        id: new_id(),
        create_at: now,
        update_at: now,
        delete_at: 0,
        last_post_at: 0,
        total_msg_count: 0,
        extra_update_at: now,
        creator_id: requester.clone(),
        ..input
    };
    store.channels.insert(channel.id.clone(), channel.clone());
    store.add_channel_member(
        &channel.id,
        &requester,
        &format!("{ROLE_CHANNEL_USER} {ROLE_CHANNEL_ADMIN}"),
    );
    info!(channel_id = %channel.id, name = %channel.name, "channel created");
    Ok(created(channel))
}

/// Direct channels are named after their two members, sorted, so the pair
/// maps to exactly one channel.
pub async fn create_direct_channel(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Channel>)> {
    let ids: Vec<String> = parse_body(&body)?;
    let mut store = db.write().await;
    let requester = current_user(&store, &headers)?;
    let [first, second] = ids.as_slice() else {
        return Err(ApiError::invalid_body("user_ids"));
    };
    if *first != requester && *second != requester && !store.is_admin(&requester) {
        return Err(ApiError::forbidden());
    }
    for id in [first, second] {
        if !store.users.contains_key(id) {
            return Err(ApiError::not_found(
                USER_MISSING,
                "We couldn't find an existing account matching your criteria.",
            ));
        }
    }

    let mut pair = [first.clone(), second.clone()];
    pair.sort();
    let name = pair.join("__");
    if let Some(existing) = store.channels.values().find(|c| c.name == name) {
        return Ok(created(existing.clone()));
    }

    let now = store.tick();
    let channel = Channel {
        id: new_id(),
        create_at: now,
        update_at: now,
        extra_update_at: now,
        channel_type: CHANNEL_DIRECT.to_string(),
        name,
        creator_id: requester,
        ..Channel::default()
    };
    store.channels.insert(channel.id.clone(), channel.clone());
    for id in &pair {
        store.add_channel_member(&channel.id, id, ROLE_CHANNEL_USER);
    }
    Ok(created(channel))
}

pub async fn get_channel_members(
    State(db): State<Db>,
    Path(channel_id): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ChannelMember>>> {
    let store = db.read().await;
    let requester = current_user(&store, &headers)?;
    require_channel_access(&store, &channel_id, &requester)?;
    let mut members: Vec<ChannelMember> = store
        .channel_members
        .values()
        .filter(|m| m.channel_id == channel_id)
        .cloned()
        .collect();
    members.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    let (offset, limit) = query.window();
    Ok(Json(page(&members, offset, limit)))
}

pub async fn get_channel_member(
    State(db): State<Db>,
    Path((channel_id, user_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<ChannelMember>> {
    let store = db.read().await;
    let requester = current_user(&store, &headers)?;
    require_channel_access(&store, &channel_id, &requester)?;
    store
        .channel_members
        .get(&(channel_id, user_id))
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(CHANNEL_MEMBER_MISSING, "We couldn't find the channel member")
        })
}

pub async fn get_channel_members_for_user(
    State(db): State<Db>,
    Path((user_id, team_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ChannelMember>>> {
    let store = db.read().await;
    let requester = current_user(&store, &headers)?;
    if requester != user_id && !store.is_admin(&requester) {
        return Err(ApiError::forbidden());
    }
    let mut members: Vec<ChannelMember> = store
        .channel_members
        .values()
        .filter(|m| {
            m.user_id == user_id
                && store
                    .channels
                    .get(&m.channel_id)
                    .is_some_and(|c| c.team_id == team_id)
        })
        .cloned()
        .collect();
    members.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
    Ok(Json(members))
}
