use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use tracing::debug;

use super::{conditional, created, current_user, page, parse_body};
use crate::error::*;
use crate::model::{ListQuery, Post, PostList};
use crate::store::{new_id, Db, Store};

fn missing_post() -> ApiError {
    ApiError::not_found(POST_MISSING, "Unable to get the post")
}

fn require_member(store: &Store, channel_id: &str, requester: &str) -> ApiResult<()> {
    if !store.channels.contains_key(channel_id) {
        return Err(ApiError::not_found(
            CHANNEL_MISSING,
            "We couldn't find the existing channel",
        ));
    }
    if store.is_channel_member(channel_id, requester) || store.is_admin(requester) {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

pub async fn create_post(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let input: Post = parse_body(&body)?;
    if !input.id.is_empty() {
        return Err(ApiError::invalid_body("post.id"));
    }
    if input.message.trim().is_empty() && input.file_ids.is_empty() {
        return Err(ApiError::invalid_body("post.message"));
    }

    let mut store = db.write().await;
    let requester = current_user(&store, &headers)?;
    require_member(&store, &input.channel_id, &requester)?;
    if !input.root_id.is_empty() {
        let root_ok = store
            .posts
            .get(&input.root_id)
            .is_some_and(|root| root.channel_id == input.channel_id && root.delete_at == 0);
        if !root_ok {
            return Err(ApiError::bad_request(
                INVALID_ROOT,
                "Invalid RootId parameter",
            ));
        }
    }

    let now = store.tick();
    let post = Post {
        id: new_id(),
        create_at: now,
        update_at: now,
        delete_at: 0,
        user_id: requester,
        ..input
    };
    if let Some(channel) = store.channels.get_mut(&post.channel_id) {
        channel.last_post_at = now;
        channel.total_msg_count += 1;
    }
    store.posts.insert(post.id.clone(), post.clone());
    debug!(post_id = %post.id, channel_id = %post.channel_id, "post created");
    Ok(created(post))
}

pub async fn get_post(
    State(db): State<Db>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let store = db.read().await;
    let requester = current_user(&store, &headers)?;
    let post = store
        .posts
        .get(&post_id)
        .filter(|p| p.delete_at == 0)
        .ok_or_else(missing_post)?;
    require_member(&store, &post.channel_id, &requester)?;
    Ok(conditional(&headers, post.etag(), post))
}

/// The root post and every reply to it.
pub async fn get_post_thread(
    State(db): State<Db>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<PostList>> {
    let store = db.read().await;
    let requester = current_user(&store, &headers)?;
    let post = store
        .posts
        .get(&post_id)
        .filter(|p| p.delete_at == 0)
        .ok_or_else(missing_post)?;
    require_member(&store, &post.channel_id, &requester)?;
    let root = post.thread_root();
    let thread: Vec<Post> = store
        .posts
        .values()
        .filter(|p| p.delete_at == 0 && p.thread_root() == root)
        .cloned()
        .collect();
    Ok(Json(PostList::from_posts(thread)))
}

pub async fn get_posts_for_channel(
    State(db): State<Db>,
    Path(channel_id): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<PostList>> {
    let store = db.read().await;
    let requester = current_user(&store, &headers)?;
    require_member(&store, &channel_id, &requester)?;
    let mut posts: Vec<Post> = store
        .posts
        .values()
        .filter(|p| p.channel_id == channel_id && p.delete_at == 0)
        .cloned()
        .collect();
    posts.sort_by(|a, b| b.create_at.cmp(&a.create_at));
    let (offset, limit) = query.window();
    Ok(Json(PostList::from_posts(page(&posts, offset, limit))))
}
