//! Channel and channel membership operations.

use crate::client::Client;
use crate::codec;
use crate::response::ApiResult;
use crate::routes;
use crate::types::{Channel, ChannelMember, ChannelMembers};

impl Client {
    pub fn create_channel(&self, channel: &Channel) -> ApiResult<Channel> {
        let exchange = self.do_api_post(&routes::channels(), Some(codec::encode(channel)?))?;
        self.decode_into(exchange)
    }

    /// Create (or fetch the existing) direct message channel between two users.
    pub fn create_direct_channel(&self, user_id1: &str, user_id2: &str) -> ApiResult<Channel> {
        let pair = [user_id1.to_string(), user_id2.to_string()];
        let path = format!("{}/direct", routes::channels());
        let exchange = self.do_api_post(&path, Some(codec::encode_array(&pair)?))?;
        self.decode_into(exchange)
    }

    pub fn get_channel_members(
        &self,
        channel_id: &str,
        page: u32,
        per_page: u32,
        etag: &str,
    ) -> ApiResult<ChannelMembers> {
        let path = routes::channel_members(channel_id) + &routes::paged_query(&[], page, per_page);
        let exchange = self.do_api_get(&path, etag)?;
        self.decode_into(exchange)
    }

    pub fn get_channel_member(
        &self,
        channel_id: &str,
        user_id: &str,
        etag: &str,
    ) -> ApiResult<ChannelMember> {
        let exchange = self.do_api_get(&routes::channel_member(channel_id, user_id), etag)?;
        self.decode_into(exchange)
    }

    /// All channel memberships of a user on one team.
    pub fn get_channel_members_for_user(
        &self,
        user_id: &str,
        team_id: &str,
        etag: &str,
    ) -> ApiResult<ChannelMembers> {
        let path = format!(
            "{}/teams/{}/channels/members",
            routes::user(user_id),
            routes::segment(team_id)
        );
        let exchange = self.do_api_get(&path, etag)?;
        self.decode_into(exchange)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{fake_client, Canned};
    use crate::types::{Channel, ChannelType};

    #[test]
    fn create_channel_and_direct_channel() {
        let (client, transport) = fake_client(vec![
            Canned::new(201, r#"{"id":"c1","type":"P","team_id":"t1"}"#),
            Canned::new(201, r#"{"id":"c2","type":"D","name":"u1__u2"}"#),
        ]);
        let channel = Channel {
            team_id: "t1".to_string(),
            name: "fakechannel1".to_string(),
            channel_type: ChannelType::Private,
            ..Channel::default()
        };
        let created = client.create_channel(&channel).unwrap().data.unwrap();
        assert_eq!(created.channel_type, ChannelType::Private);
        assert!(transport.last_request().url.ends_with("/api/v4/channels"));

        let direct = client.create_direct_channel("u1", "u2").unwrap().data.unwrap();
        assert_eq!(direct.channel_type, ChannelType::Direct);
        let req = transport.last_request();
        assert!(req.url.ends_with("/channels/direct"));
        assert_eq!(req.body.as_deref(), Some(r#"["u1","u2"]"#));
    }

    #[test]
    fn membership_routes() {
        let (client, transport) = fake_client(vec![
            Canned::new(200, r#"[{"channel_id":"c1","user_id":"u1"}]"#),
            Canned::new(200, r#"{"channel_id":"c1","user_id":"u1","roles":"channel_user"}"#),
            Canned::new(200, r#"[]"#),
        ]);
        let members = client.get_channel_members("c1", 0, 60, "").unwrap();
        assert_eq!(members.data.unwrap().len(), 1);
        assert!(transport
            .last_request()
            .url
            .ends_with("/channels/c1/members?page=0&per_page=60"));

        let member = client.get_channel_member("c1", "u1", "").unwrap().data.unwrap();
        assert_eq!(member.roles, "channel_user");
        assert!(transport.last_request().url.ends_with("/channels/c1/members/u1"));

        client.get_channel_members_for_user("u1", "t1", "").unwrap();
        assert!(transport
            .last_request()
            .url
            .ends_with("/users/u1/teams/t1/channels/members"));
    }

    #[test]
    fn missing_channel_is_not_found() {
        let (client, _) = fake_client(vec![Canned::new(
            404,
            r#"{"id":"store.sql_channel.get.existing.app_error","message":"gone","status_code":404}"#,
        )]);
        let err = client.get_channel_member("nope", "u1", "").unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(err.app_error().is_some());
    }
}
