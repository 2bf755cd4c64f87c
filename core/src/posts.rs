//! Post operations.

use crate::client::Client;
use crate::codec;
use crate::response::ApiResult;
use crate::routes;
use crate::types::{Post, PostList};

impl Client {
    pub fn create_post(&self, post: &Post) -> ApiResult<Post> {
        let exchange = self.do_api_post(&routes::posts(), Some(codec::encode(post)?))?;
        self.decode_into(exchange)
    }

    pub fn get_post(&self, post_id: &str, etag: &str) -> ApiResult<Post> {
        let exchange = self.do_api_get(&routes::post(post_id), etag)?;
        self.decode_into(exchange)
    }

    /// The post together with every other post in its thread.
    pub fn get_post_thread(&self, post_id: &str, etag: &str) -> ApiResult<PostList> {
        let path = format!("{}/thread", routes::post(post_id));
        let exchange = self.do_api_get(&path, etag)?;
        self.decode_into(exchange)
    }

    /// A page of a channel's posts, newest first.
    pub fn get_posts_for_channel(
        &self,
        channel_id: &str,
        page: u32,
        per_page: u32,
        etag: &str,
    ) -> ApiResult<PostList> {
        let path = format!("{}/posts", routes::channel(channel_id))
            + &routes::paged_query(&[], page, per_page);
        let exchange = self.do_api_get(&path, etag)?;
        self.decode_into(exchange)
    }
}
