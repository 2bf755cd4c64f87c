//! Team operations.

use crate::client::Client;
use crate::codec;
use crate::response::ApiResult;
use crate::routes;
use crate::types::{Team, TeamMember};

impl Client {
    pub fn create_team(&self, team: &Team) -> ApiResult<Team> {
        let exchange = self.do_api_post(&routes::teams(), Some(codec::encode(team)?))?;
        self.decode_into(exchange)
    }

    pub fn get_team(&self, team_id: &str, etag: &str) -> ApiResult<Team> {
        let exchange = self.do_api_get(&routes::team(team_id), etag)?;
        self.decode_into(exchange)
    }

    /// Teams the user belongs to. Requires being that user or a system admin.
    pub fn get_teams_for_user(&self, user_id: &str, etag: &str) -> ApiResult<Vec<Team>> {
        let path = format!("{}/teams", routes::user(user_id));
        let exchange = self.do_api_get(&path, etag)?;
        self.decode_into(exchange)
    }

    pub fn get_team_member(&self, team_id: &str, user_id: &str, etag: &str) -> ApiResult<TeamMember> {
        let exchange = self.do_api_get(&routes::team_member(team_id, user_id), etag)?;
        self.decode_into(exchange)
    }
}
