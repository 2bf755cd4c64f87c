//! JSON envelope encoding and decoding.
//!
//! Decoders take ownership of the `ResponseBody`, stream it through
//! `serde_json`, and drop the source before returning on every path.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, ClientError, DECODE_JSON_ERROR_ID};
use crate::http::ResponseBody;

pub const STATUS: &str = "status";
pub const STATUS_OK: &str = "OK";

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, ClientError> {
    serde_json::to_string(value).map_err(ClientError::Encode)
}

pub fn decode<T: DeserializeOwned>(body: ResponseBody) -> Result<T, serde_json::Error> {
    serde_json::from_reader(body.into_reader())
}

/// Decode a failure body. A body that is not an `AppError` still produces
/// one, carrying the raw text for diagnosis.
pub fn decode_app_error(body: ResponseBody) -> AppError {
    let text = match body.read_to_string() {
        Ok(text) => text,
        Err(err) => {
            return AppError::new("decode_app_error", DECODE_JSON_ERROR_ID, err.to_string())
        }
    };
    match serde_json::from_str::<AppError>(&text) {
        Ok(error) if !error.id.is_empty() => error,
        _ => AppError::new(
            "decode_app_error",
            DECODE_JSON_ERROR_ID,
            format!("body: {text}"),
        ),
    }
}

pub fn encode_map(map: &BTreeMap<String, String>) -> Result<String, ClientError> {
    encode(map)
}

pub fn decode_map(body: ResponseBody) -> Result<BTreeMap<String, String>, serde_json::Error> {
    decode(body)
}

pub fn encode_array(values: &[String]) -> Result<String, ClientError> {
    encode(values)
}

pub fn decode_array(body: ResponseBody) -> Result<Vec<String>, serde_json::Error> {
    decode(body)
}

/// True when the map is the standard `{"status":"OK"}` acknowledgement.
pub fn is_status_ok(map: &BTreeMap<String, String>) -> bool {
    map.get(STATUS).is_some_and(|status| status == STATUS_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TrackedBody;
    use crate::types::{
        Channel, ChannelMember, ChannelType, Post, PostList, Team, TeamMember, TeamType, User,
    };

    fn round_trip<T: Serialize + DeserializeOwned>(value: &T) -> T {
        decode(ResponseBody::from_string(encode(value).unwrap())).unwrap()
    }

    #[test]
    fn user_round_trips_including_empty_fields() {
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "a@b.com".to_string(),
            auth_data: Some(String::new()),
            ..User::default()
        };
        let text = encode(&user).unwrap();
        let back: User = decode(ResponseBody::from_string(text)).unwrap();
        assert_eq!(back, user);

        let empty = User::default();
        let back: User = decode(ResponseBody::from_string(encode(&empty).unwrap())).unwrap();
        assert_eq!(back, empty);
    }

    #[test]
    fn zero_valued_records_round_trip() {
        assert_eq!(round_trip(&Team::default()), Team::default());
        assert_eq!(round_trip(&TeamMember::default()), TeamMember::default());
        assert_eq!(round_trip(&Channel::default()), Channel::default());
        assert_eq!(round_trip(&ChannelMember::default()), ChannelMember::default());
        assert_eq!(round_trip(&Post::default()), Post::default());
        assert_eq!(round_trip(&PostList::default()), PostList::default());
    }

    #[test]
    fn populated_records_round_trip() {
        let team = Team {
            id: "t1".to_string(),
            name: "faketeam".to_string(),
            team_type: TeamType::Invite,
            allow_open_invite: true,
            ..Team::default()
        };
        assert_eq!(round_trip(&team), team);

        let channel = Channel {
            id: "c1".to_string(),
            team_id: "t1".to_string(),
            channel_type: ChannelType::Private,
            total_msg_count: 3,
            ..Channel::default()
        };
        assert_eq!(round_trip(&channel), channel);

        let mut member = ChannelMember {
            channel_id: "c1".to_string(),
            user_id: "u1".to_string(),
            roles: "channel_user".to_string(),
            ..ChannelMember::default()
        };
        member.notify_props.insert("desktop".to_string(), "all".to_string());
        assert_eq!(round_trip(&member), member);

        let post = Post {
            id: "p1".to_string(),
            root_id: "p0".to_string(),
            file_ids: vec!["f1".to_string()],
            ..Post::default()
        };
        assert_eq!(round_trip(&post), post);
    }

    #[test]
    fn channel_type_uses_wire_codes() {
        let channel = Channel {
            channel_type: ChannelType::Direct,
            ..Channel::default()
        };
        let value: serde_json::Value = serde_json::from_str(&encode(&channel).unwrap()).unwrap();
        assert_eq!(value["type"], "D");
    }

    #[test]
    fn post_list_round_trips() {
        let mut list = PostList::default();
        list.order.push("p1".to_string());
        list.posts.insert(
            "p1".to_string(),
            Post {
                id: "p1".to_string(),
                message: "hello".to_string(),
                ..Post::default()
            },
        );
        let back: PostList = decode(ResponseBody::from_string(encode(&list).unwrap())).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn mismatched_shape_is_an_error() {
        let result: Result<User, _> = decode(ResponseBody::from_string("[1,2,3]"));
        assert!(result.is_err());
    }

    #[test]
    fn decode_releases_body_on_success_and_failure() {
        let (body, released) = TrackedBody::new("{\"status\":\"OK\"}");
        let map = decode_map(body).unwrap();
        assert!(is_status_ok(&map));
        assert!(released.get());

        let (body, released) = TrackedBody::new("{\"status\":");
        assert!(decode_map(body).is_err());
        assert!(released.get());
    }

    #[test]
    fn app_error_from_valid_body() {
        let body = ResponseBody::from_string(
            r#"{"id":"api.context.permissions.app_error","message":"no","status_code":403}"#,
        );
        let err = decode_app_error(body);
        assert_eq!(err.id, "api.context.permissions.app_error");
        assert_eq!(err.status_code, 403);
    }

    #[test]
    fn app_error_from_garbage_body_keeps_text() {
        let (body, released) = TrackedBody::new("<html>bad gateway</html>");
        let err = decode_app_error(body);
        assert_eq!(err.id, DECODE_JSON_ERROR_ID);
        assert_eq!(err.detailed_error, "body: <html>bad gateway</html>");
        assert!(released.get());
    }

    #[test]
    fn map_and_array_helpers() {
        let mut map = BTreeMap::new();
        map.insert("login_id".to_string(), "alice".to_string());
        map.insert("password".to_string(), "pw".to_string());
        let text = encode_map(&map).unwrap();
        assert_eq!(text, r#"{"login_id":"alice","password":"pw"}"#);
        assert_eq!(decode_map(ResponseBody::from_string(text)).unwrap(), map);

        let ids = vec!["u1".to_string(), "u2".to_string()];
        let text = encode_array(&ids).unwrap();
        assert_eq!(text, r#"["u1","u2"]"#);
        assert_eq!(decode_array(ResponseBody::from_string(text)).unwrap(), ids);
    }

    #[test]
    fn status_ok_requires_exact_value() {
        let mut map = BTreeMap::new();
        assert!(!is_status_ok(&map));
        map.insert(STATUS.to_string(), "FAIL".to_string());
        assert!(!is_status_ok(&map));
        map.insert(STATUS.to_string(), STATUS_OK.to_string());
        assert!(is_status_ok(&map));
    }
}
