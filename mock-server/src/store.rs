//! In-memory state behind the mock server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{
    Channel, ChannelMember, Post, Team, TeamMember, User, ROLE_CHANNEL_USER, ROLE_SYSTEM_ADMIN,
    ROLE_TEAM_USER,
};

pub type Db = Arc<RwLock<Store>>;

pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Default)]
pub struct Store {
    pub users: HashMap<String, User>,
    /// token → user id
    pub sessions: HashMap<String, String>,
    pub teams: HashMap<String, Team>,
    /// (team id, user id) → member
    pub team_members: HashMap<(String, String), TeamMember>,
    pub channels: HashMap<String, Channel>,
    /// (channel id, user id) → member
    pub channel_members: HashMap<(String, String), ChannelMember>,
    pub posts: HashMap<String, Post>,
    /// recovery code → user id
    pub reset_codes: HashMap<String, String>,
    clock: i64,
}

/// Entities removed by `Store::purge_prefixed`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub users: usize,
    pub teams: usize,
    pub channels: usize,
}

impl Store {
    /// Millisecond timestamp, strictly increasing across calls so that every
    /// update changes the entity's etag.
    pub fn tick(&mut self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        self.clock = now.max(self.clock + 1);
        self.clock
    }

    pub fn session_user(&self, token: &str) -> Option<&User> {
        self.sessions
            .get(token)
            .and_then(|user_id| self.users.get(user_id))
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.users
            .get(user_id)
            .is_some_and(|u| u.has_role(ROLE_SYSTEM_ADMIN))
    }

    pub fn find_user_by_login(&self, login_id: &str) -> Option<&User> {
        let lowered = login_id.to_lowercase();
        self.users
            .values()
            .find(|u| u.email == lowered || u.username == lowered)
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<&User> {
        let lowered = email.to_lowercase();
        self.users.values().find(|u| u.email == lowered)
    }

    pub fn is_team_member(&self, team_id: &str, user_id: &str) -> bool {
        self.team_members
            .get(&(team_id.to_string(), user_id.to_string()))
            .is_some_and(|m| m.delete_at == 0)
    }

    pub fn is_channel_member(&self, channel_id: &str, user_id: &str) -> bool {
        self.channel_members
            .contains_key(&(channel_id.to_string(), user_id.to_string()))
    }

    pub fn add_team_member(&mut self, team_id: &str, user_id: &str, roles: &str) {
        self.team_members.insert(
            (team_id.to_string(), user_id.to_string()),
            TeamMember {
                team_id: team_id.to_string(),
                user_id: user_id.to_string(),
                roles: roles.to_string(),
                delete_at: 0,
            },
        );
    }

    pub fn add_channel_member(&mut self, channel_id: &str, user_id: &str, roles: &str) {
        let now = self.tick();
        self.channel_members.insert(
            (channel_id.to_string(), user_id.to_string()),
            ChannelMember {
                channel_id: channel_id.to_string(),
                user_id: user_id.to_string(),
                roles: roles.to_string(),
                last_update_at: now,
                ..ChannelMember::default()
            },
        );
    }

    /// Team member ids, in no particular order.
    pub fn team_member_ids(&self, team_id: &str) -> Vec<String> {
        self.team_members
            .values()
            .filter(|m| m.team_id == team_id && m.delete_at == 0)
            .map(|m| m.user_id.clone())
            .collect()
    }

    pub fn channel_member_ids(&self, channel_id: &str) -> Vec<String> {
        self.channel_members
            .values()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.user_id.clone())
            .collect()
    }

    /// Make `user_id` a plain member of `team_id`.
    pub fn link_user_to_team(&mut self, user_id: &str, team_id: &str) -> bool {
        if !self.users.contains_key(user_id) || !self.teams.contains_key(team_id) {
            return false;
        }
        if !self.is_team_member(team_id, user_id) {
            self.add_team_member(team_id, user_id, ROLE_TEAM_USER);
        }
        true
    }

    pub fn link_user_to_channel(&mut self, user_id: &str, channel_id: &str) -> bool {
        if !self.users.contains_key(user_id) || !self.channels.contains_key(channel_id) {
            return false;
        }
        if !self.is_channel_member(channel_id, user_id) {
            self.add_channel_member(channel_id, user_id, ROLE_CHANNEL_USER);
        }
        true
    }

    pub fn revoke_sessions(&mut self, user_id: &str) {
        self.sessions.retain(|_, owner| owner != user_id);
    }

    /// Permanently remove users whose username starts with `user_prefix`,
    /// teams whose name starts with `team_prefix`, channels whose name starts
    /// with `channel_prefix` or that belong to a removed team, and everything
    /// hanging off them.
    pub fn purge_prefixed(
        &mut self,
        user_prefix: &str,
        team_prefix: &str,
        channel_prefix: &str,
    ) -> PurgeReport {
        let users: Vec<String> = self
            .users
            .values()
            .filter(|u| u.username.starts_with(user_prefix))
            .map(|u| u.id.clone())
            .collect();
        let teams: Vec<String> = self
            .teams
            .values()
            .filter(|t| t.name.starts_with(team_prefix))
            .map(|t| t.id.clone())
            .collect();
        let channels: Vec<String> = self
            .channels
            .values()
            .filter(|c| c.name.starts_with(channel_prefix) || teams.contains(&c.team_id))
            .map(|c| c.id.clone())
            .collect();

        for id in &users {
            self.users.remove(id);
            self.revoke_sessions(id);
        }
        self.reset_codes.retain(|_, owner| !users.contains(owner));
        for id in &teams {
            self.teams.remove(id);
        }
        for id in &channels {
            self.channels.remove(id);
        }
        self.team_members
            .retain(|(team, user), _| !teams.contains(team) && !users.contains(user));
        self.channel_members
            .retain(|(channel, user), _| !channels.contains(channel) && !users.contains(user));
        self.posts
            .retain(|_, p| !channels.contains(&p.channel_id) && !users.contains(&p.user_id));

        PurgeReport {
            users: users.len(),
            teams: teams.len(),
            channels: channels.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(store: &mut Store, username: &str) -> String {
        let id = new_id();
        store.users.insert(
            id.clone(),
            User {
                id: id.clone(),
                username: username.to_string(),
                email: format!("{username}@example.com"),
                ..User::default()
            },
        );
        id
    }

    #[test]
    fn tick_is_strictly_increasing() {
        let mut store = Store::default();
        let a = store.tick();
        let b = store.tick();
        assert!(b > a);
    }

    #[test]
    fn login_lookup_matches_email_or_username() {
        let mut store = Store::default();
        let id = user(&mut store, "alice");
        assert_eq!(store.find_user_by_login("ALICE@example.com").unwrap().id, id);
        assert_eq!(store.find_user_by_login("alice").unwrap().id, id);
        assert!(store.find_user_by_login("bob").is_none());
    }

    #[test]
    fn purge_removes_prefixed_entities_and_dependents() {
        let mut store = Store::default();
        let fake = user(&mut store, "fakeuser1");
        let real = user(&mut store, "realuser");
        store.sessions.insert("tok".to_string(), fake.clone());
        store.teams.insert(
            "t1".to_string(),
            Team {
                id: "t1".to_string(),
                name: "faketeam1".to_string(),
                ..Team::default()
            },
        );
        store.channels.insert(
            "c1".to_string(),
            Channel {
                id: "c1".to_string(),
                team_id: "t1".to_string(),
                name: "town-square".to_string(),
                ..Channel::default()
            },
        );
        assert!(store.link_user_to_team(&real, "t1"));
        assert!(store.link_user_to_channel(&real, "c1"));

        let report = store.purge_prefixed("fakeuser", "faketeam", "fakechannel");
        assert_eq!(
            report,
            PurgeReport {
                users: 1,
                teams: 1,
                channels: 1
            }
        );
        assert!(store.users.contains_key(&real));
        assert!(store.sessions.is_empty());
        assert!(store.team_members.is_empty());
        assert!(store.channel_members.is_empty());
    }

    #[test]
    fn linking_requires_existing_entities() {
        let mut store = Store::default();
        let id = user(&mut store, "alice");
        assert!(!store.link_user_to_team(&id, "missing"));
        assert!(!store.link_user_to_channel("missing", "c1"));
    }
}
