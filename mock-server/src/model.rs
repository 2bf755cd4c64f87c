//! Wire records served by the mock server.
//!
//! Defined independently of the client crate so the end-to-end tests catch
//! schema drift between the two.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const ROLE_SYSTEM_USER: &str = "system_user";
pub const ROLE_SYSTEM_ADMIN: &str = "system_admin";
pub const ROLE_TEAM_USER: &str = "team_user";
pub const ROLE_TEAM_ADMIN: &str = "team_admin";
pub const ROLE_CHANNEL_USER: &str = "channel_user";
pub const ROLE_CHANNEL_ADMIN: &str = "channel_admin";

pub const CHANNEL_OPEN: &str = "O";
pub const CHANNEL_PRIVATE: &str = "P";
pub const CHANNEL_DIRECT: &str = "D";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_data: Option<String>,
    pub auth_service: String,
    pub email: String,
    pub email_verified: bool,
    pub nickname: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub roles: String,
    pub locale: String,
    pub props: HashMap<String, String>,
    pub notify_props: HashMap<String, String>,
    pub last_password_update: i64,
    pub mfa_active: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mfa_secret: String,
}

impl User {
    /// Copy safe to send to clients: no password, auth data or mfa secret.
    pub fn sanitized(&self) -> User {
        User {
            password: String::new(),
            auth_data: None,
            mfa_secret: String::new(),
            ..self.clone()
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.split_whitespace().any(|r| r == role)
    }

    pub fn etag(&self) -> String {
        format!("{}.{}", self.id, self.update_at)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    pub id: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
    pub display_name: String,
    pub name: String,
    pub description: String,
    pub email: String,
    #[serde(rename = "type")]
    pub team_type: String,
    pub company_name: String,
    pub allowed_domains: String,
    pub invite_id: String,
    pub allow_open_invite: bool,
}

impl Team {
    pub fn etag(&self) -> String {
        format!("{}.{}", self.id, self.update_at)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMember {
    pub team_id: String,
    pub user_id: String,
    pub roles: String,
    pub delete_at: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
    pub team_id: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    pub display_name: String,
    pub name: String,
    pub header: String,
    pub purpose: String,
    pub last_post_at: i64,
    pub total_msg_count: i64,
    pub extra_update_at: i64,
    pub creator_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMember {
    pub channel_id: String,
    pub user_id: String,
    pub roles: String,
    pub last_viewed_at: i64,
    pub msg_count: i64,
    pub mention_count: i64,
    pub notify_props: HashMap<String, String>,
    pub last_update_at: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
    pub user_id: String,
    pub channel_id: String,
    pub root_id: String,
    pub parent_id: String,
    pub original_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub props: HashMap<String, String>,
    pub hashtags: String,
    pub file_ids: Vec<String>,
    pub pending_post_id: String,
}

impl Post {
    pub fn etag(&self) -> String {
        format!("{}.{}", self.id, self.update_at)
    }

    /// Id of the thread root this post belongs to.
    pub fn thread_root(&self) -> &str {
        if self.root_id.is_empty() {
            &self.id
        } else {
            &self.root_id
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PostList {
    pub order: Vec<String>,
    pub posts: HashMap<String, Post>,
}

impl PostList {
    /// Newest first.
    pub fn from_posts(mut posts: Vec<Post>) -> Self {
        posts.sort_by(|a, b| b.create_at.cmp(&a.create_at));
        PostList {
            order: posts.iter().map(|p| p.id.clone()).collect(),
            posts: posts.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
    pub id: String,
    pub login_id: String,
    pub password: String,
    pub ldap_only: String,
    pub device_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordBody {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RolesBody {
    pub roles: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetSendBody {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetBody {
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub in_team: Option<String>,
    pub in_channel: Option<String>,
    pub not_in_channel: Option<String>,
}

pub const DEFAULT_PER_PAGE: usize = 60;
pub const MAX_PER_PAGE: usize = 200;

impl ListQuery {
    /// Offset and limit for the requested page.
    pub fn window(&self) -> (usize, usize) {
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        (self.page.unwrap_or(0).saturating_mul(per_page), per_page)
    }
}
