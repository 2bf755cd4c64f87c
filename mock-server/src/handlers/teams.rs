use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use tracing::info;

use super::{conditional, created, current_user, parse_body};
use crate::error::*;
use crate::model::{Team, TeamMember, ROLE_TEAM_ADMIN, ROLE_TEAM_USER};
use crate::store::{new_id, Db};

const TEAM_OPEN: &str = "O";
const TEAM_INVITE: &str = "I";

fn valid_name(name: &str) -> bool {
    (2..=64).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn missing_team() -> ApiError {
    ApiError::not_found(TEAM_MISSING, "We couldn't find the existing team")
}

pub async fn create_team(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Team>)> {
    let input: Team = parse_body(&body)?;
    if !input.id.is_empty() {
        return Err(ApiError::invalid_body("team.id"));
    }
    if !valid_name(&input.name) {
        return Err(ApiError::bad_request(INVALID_TEAM_NAME, "Invalid name"));
    }
    if input.team_type != TEAM_OPEN && input.team_type != TEAM_INVITE {
        return Err(ApiError::invalid_body("team.type"));
    }

    let mut store = db.write().await;
    let requester = current_user(&store, &headers)?;
    if store.teams.values().any(|t| t.name == input.name) {
        return Err(ApiError::bad_request(
            TEAM_EXISTS,
            "A team with that name already exists",
        ));
    }

    let now = store.tick();
    let team = Team {
        id: new_id(),
        create_at: now,
        update_at: now,
        delete_at: 0,
        invite_id: new_id(),
        ..input
    };
    store.teams.insert(team.id.clone(), team.clone());
    store.add_team_member(
        &team.id,
        &requester,
        &format!("{ROLE_TEAM_USER} {ROLE_TEAM_ADMIN}"),
    );
    info!(team_id = %team.id, name = %team.name, "team created");
    Ok(created(team))
}

pub async fn get_team(
    State(db): State<Db>,
    Path(team_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let store = db.read().await;
    let requester = current_user(&store, &headers)?;
    let team = store.teams.get(&team_id).ok_or_else(missing_team)?;
    if !store.is_team_member(&team_id, &requester) && !store.is_admin(&requester) {
        return Err(ApiError::forbidden());
    }
    Ok(conditional(&headers, team.etag(), team))
}

pub async fn get_teams_for_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Team>>> {
    let store = db.read().await;
    let requester = current_user(&store, &headers)?;
    if requester != user_id && !store.is_admin(&requester) {
        return Err(ApiError::forbidden());
    }
    let mut teams: Vec<Team> = store
        .teams
        .values()
        .filter(|t| store.is_team_member(&t.id, &user_id))
        .cloned()
        .collect();
    teams.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(teams))
}

pub async fn get_team_member(
    State(db): State<Db>,
    Path((team_id, user_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<TeamMember>> {
    let store = db.read().await;
    let requester = current_user(&store, &headers)?;
    if !store.teams.contains_key(&team_id) {
        return Err(missing_team());
    }
    if !store.is_team_member(&team_id, &requester) && !store.is_admin(&requester) {
        return Err(ApiError::forbidden());
    }
    store
        .team_members
        .get(&(team_id, user_id))
        .filter(|m| m.delete_at == 0)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(TEAM_MEMBER_MISSING, "We couldn't find the team member")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_names_are_lowercase_slugs() {
        assert!(valid_name("faketeam-1"));
        assert!(!valid_name("Fake Team"));
        assert!(!valid_name("a"));
    }
}
