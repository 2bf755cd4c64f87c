//! Authentication and user operations.

use tracing::debug;

use crate::client::Client;
use crate::codec;
use crate::http::HEADER_TOKEN;
use crate::response::ApiResult;
use crate::routes;
use crate::types::{
    LoginRequest, PasswordReset, PasswordResetSend, PasswordUpdate, RolesUpdate, User,
};

impl Client {
    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    /// Log in by login id (username or email, depending on server
    /// configuration) and password.
    pub fn login(&mut self, login_id: &str, password: &str) -> ApiResult<User> {
        self.login_with(LoginRequest {
            login_id: Some(login_id.to_string()),
            password: password.to_string(),
            ..LoginRequest::default()
        })
    }

    pub fn login_by_id(&mut self, id: &str, password: &str) -> ApiResult<User> {
        self.login_with(LoginRequest {
            id: Some(id.to_string()),
            password: password.to_string(),
            ..LoginRequest::default()
        })
    }

    pub fn login_by_ldap(&mut self, login_id: &str, password: &str) -> ApiResult<User> {
        self.login_with(LoginRequest {
            login_id: Some(login_id.to_string()),
            password: password.to_string(),
            ldap_only: Some("true".to_string()),
            ..LoginRequest::default()
        })
    }

    /// Log in and attach `device_id` to the new session.
    pub fn login_with_device(
        &mut self,
        login_id: &str,
        password: &str,
        device_id: &str,
    ) -> ApiResult<User> {
        self.login_with(LoginRequest {
            login_id: Some(login_id.to_string()),
            password: password.to_string(),
            device_id: Some(device_id.to_string()),
            ..LoginRequest::default()
        })
    }

    fn login_with(&mut self, request: LoginRequest) -> ApiResult<User> {
        let path = format!("{}/login", routes::users());
        let exchange = self.do_api_post(&path, Some(codec::encode(&request)?))?;
        let token = exchange.header(HEADER_TOKEN).unwrap_or_default().to_string();
        self.set_bearer_token(&token);
        debug!(authenticated = !token.is_empty(), "login completed");
        self.decode_into(exchange)
    }

    /// End the current session. The local credential is cleared whatever the
    /// server answers.
    pub fn logout(&mut self) -> ApiResult<bool> {
        let path = format!("{}/logout", routes::users());
        let result = self.do_api_post(&path, None);
        self.clear_session();
        self.decode_status_ok(result?)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn create_user(&self, user: &User) -> ApiResult<User> {
        let exchange = self.do_api_post(&routes::users(), Some(codec::encode(user)?))?;
        self.decode_into(exchange)
    }

    pub fn get_user(&self, user_id: &str, etag: &str) -> ApiResult<User> {
        let exchange = self.do_api_get(&routes::user(user_id), etag)?;
        self.decode_into(exchange)
    }

    pub fn get_user_by_username(&self, username: &str, etag: &str) -> ApiResult<User> {
        let exchange = self.do_api_get(&routes::user_by_username(username), etag)?;
        self.decode_into(exchange)
    }

    pub fn get_user_by_email(&self, email: &str, etag: &str) -> ApiResult<User> {
        let exchange = self.do_api_get(&routes::user_by_email(email), etag)?;
        self.decode_into(exchange)
    }

    /// A page of users on the system. Pages start at 0.
    pub fn get_users(&self, page: u32, per_page: u32, etag: &str) -> ApiResult<Vec<User>> {
        self.get_user_page(&[], page, per_page, etag)
    }

    pub fn get_users_in_team(
        &self,
        team_id: &str,
        page: u32,
        per_page: u32,
        etag: &str,
    ) -> ApiResult<Vec<User>> {
        self.get_user_page(&[("in_team", team_id)], page, per_page, etag)
    }

    pub fn get_users_in_channel(
        &self,
        channel_id: &str,
        page: u32,
        per_page: u32,
        etag: &str,
    ) -> ApiResult<Vec<User>> {
        self.get_user_page(&[("in_channel", channel_id)], page, per_page, etag)
    }

    /// Team members that are not in `channel_id`.
    pub fn get_users_not_in_channel(
        &self,
        team_id: &str,
        channel_id: &str,
        page: u32,
        per_page: u32,
        etag: &str,
    ) -> ApiResult<Vec<User>> {
        self.get_user_page(
            &[("in_team", team_id), ("not_in_channel", channel_id)],
            page,
            per_page,
            etag,
        )
    }

    fn get_user_page(
        &self,
        filters: &[(&str, &str)],
        page: u32,
        per_page: u32,
        etag: &str,
    ) -> ApiResult<Vec<User>> {
        let path = routes::users() + &routes::paged_query(filters, page, per_page);
        let exchange = self.do_api_get(&path, etag)?;
        self.decode_into(exchange)
    }

    pub fn get_users_by_ids(&self, user_ids: &[String]) -> ApiResult<Vec<User>> {
        let path = format!("{}/ids", routes::users());
        let exchange = self.do_api_post(&path, Some(codec::encode_array(user_ids)?))?;
        self.decode_into(exchange)
    }

    /// Replace the user's profile with `user`; `user.id` selects the target.
    pub fn update_user(&self, user: &User) -> ApiResult<User> {
        let exchange = self.do_api_put(&routes::user(&user.id), codec::encode(user)?)?;
        self.decode_into(exchange)
    }

    pub fn update_user_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<bool> {
        let body = PasswordUpdate {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let path = format!("{}/password", routes::user(user_id));
        let exchange = self.do_api_put(&path, codec::encode(&body)?)?;
        self.decode_status_ok(exchange)
    }

    /// Roles are space separated, e.g. `"system_user system_admin"`.
    pub fn update_user_roles(&self, user_id: &str, roles: &str) -> ApiResult<bool> {
        let body = RolesUpdate {
            roles: roles.to_string(),
        };
        let path = format!("{}/roles", routes::user(user_id));
        let exchange = self.do_api_put(&path, codec::encode(&body)?)?;
        self.decode_status_ok(exchange)
    }

    /// Deactivate a user.
    pub fn delete_user(&self, user_id: &str) -> ApiResult<bool> {
        let exchange = self.do_api_delete(&routes::user(user_id))?;
        self.decode_status_ok(exchange)
    }

    pub fn send_password_reset_email(&self, email: &str) -> ApiResult<bool> {
        let body = PasswordResetSend {
            email: email.to_string(),
        };
        let path = format!("{}/password/reset/send", routes::users());
        let exchange = self.do_api_post(&path, Some(codec::encode(&body)?))?;
        self.decode_status_ok(exchange)
    }

    /// Set a new password using the recovery code from a reset email.
    pub fn reset_password(&self, code: &str, new_password: &str) -> ApiResult<bool> {
        let body = PasswordReset {
            code: code.to_string(),
            new_password: new_password.to_string(),
        };
        let path = format!("{}/password/reset", routes::users());
        let exchange = self.do_api_post(&path, Some(codec::encode(&body)?))?;
        self.decode_status_ok(exchange)
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{HttpMethod, HEADER_AUTH};
    use crate::session::AuthKind;
    use crate::test_support::{fake_client, Canned};
    use crate::types::User;

    const USER_JSON: &str = r#"{"id":"u1","username":"alice","email":"a@b.com"}"#;

    fn body_json(body: &Option<String>) -> serde_json::Value {
        serde_json::from_str(body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn login_stores_bearer_token_from_header() {
        let (mut client, transport) = fake_client(vec![
            Canned::new(200, USER_JSON).with_header("Token", "tok-123"),
            Canned::new(200, USER_JSON),
        ]);
        let user = client.login("a@b.com", "Password1").unwrap().data.unwrap();
        assert_eq!(user.id, "u1");

        let login = transport.last_request();
        assert_eq!(login.method, HttpMethod::Post);
        assert_eq!(login.url, "http://localhost:8065/api/v4/users/login");
        assert!(login.header(HEADER_AUTH).is_none());
        let body = body_json(&login.body);
        assert_eq!(body["login_id"], "a@b.com");
        assert_eq!(body["password"], "Password1");

        assert_eq!(client.session().kind(), AuthKind::Bearer);
        client.get_user("u1", "").unwrap();
        let next = transport.last_request();
        assert_eq!(next.header_count(HEADER_AUTH), 1);
        assert_eq!(next.header(HEADER_AUTH), Some("Bearer tok-123"));
    }

    #[test]
    fn failed_login_keeps_previous_credential() {
        let (mut client, _) = fake_client(vec![Canned::new(
            401,
            r#"{"id":"api.user.login.invalid_credentials","message":"bad","status_code":401}"#,
        )]);
        client.set_bearer_token("existing");
        let err = client.login("missing@x.com", "wrong").unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.id(), "api.user.login.invalid_credentials");
        assert_eq!(client.session().token(), "existing");
    }

    #[test]
    fn login_variants_shape_bodies() {
        let (mut client, transport) = fake_client(vec![
            Canned::new(200, USER_JSON),
            Canned::new(200, USER_JSON),
            Canned::new(200, USER_JSON),
        ]);
        client.login_by_id("u1", "pw").unwrap();
        let body = body_json(&transport.last_request().body);
        assert_eq!(body["id"], "u1");
        assert!(body.get("login_id").is_none());

        client.login_by_ldap("alice", "pw").unwrap();
        assert_eq!(body_json(&transport.last_request().body)["ldap_only"], "true");

        client.login_with_device("alice", "pw", "dev-1").unwrap();
        assert_eq!(body_json(&transport.last_request().body)["device_id"], "dev-1");
    }

    #[test]
    fn logout_clears_credential_on_success() {
        let (mut client, transport) = fake_client(vec![Canned::new(200, r#"{"status":"OK"}"#)]);
        client.set_oauth_token("tok");
        let ok = client.logout().unwrap();
        assert_eq!(ok.data, Some(true));
        assert_eq!(transport.last_request().header(HEADER_AUTH), Some("Token tok"));
        assert!(!client.session().is_authenticated());
        assert_eq!(client.session().kind(), AuthKind::Bearer);
    }

    #[test]
    fn logout_clears_credential_on_server_error() {
        let (mut client, _) = fake_client(vec![Canned::new(
            500,
            r#"{"id":"api.user.logout.app_error","message":"boom"}"#,
        )]);
        client.set_bearer_token("tok");
        let err = client.logout().unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert!(!client.session().is_authenticated());
    }

    #[test]
    fn logout_clears_credential_on_transport_error() {
        let (mut client, transport) = fake_client(Vec::new());
        transport.fail_next("connection reset");
        client.set_bearer_token("tok");
        assert!(client.logout().unwrap_err().is_transport());
        assert!(!client.session().is_authenticated());
    }

    #[test]
    fn user_list_queries() {
        let (client, transport) = fake_client(vec![
            Canned::new(200, "[]"),
            Canned::new(200, "[]"),
            Canned::new(200, "[]"),
            Canned::new(200, "[]"),
        ]);
        client.get_users(0, 60, "").unwrap();
        assert!(transport
            .last_request()
            .url
            .ends_with("/users?page=0&per_page=60"));
        client.get_users_in_team("t1", 1, 10, "").unwrap();
        assert!(transport
            .last_request()
            .url
            .ends_with("/users?in_team=t1&page=1&per_page=10"));
        client.get_users_in_channel("c1", 0, 5, "").unwrap();
        assert!(transport
            .last_request()
            .url
            .ends_with("/users?in_channel=c1&page=0&per_page=5"));
        let users = client
            .get_users_not_in_channel("t1", "c1", 0, 5, "")
            .unwrap();
        assert_eq!(users.data, Some(Vec::new()));
        assert!(transport
            .last_request()
            .url
            .ends_with("/users?in_team=t1&not_in_channel=c1&page=0&per_page=5"));
    }

    #[test]
    fn get_users_by_ids_posts_array() {
        let (client, transport) =
            fake_client(vec![Canned::new(200, &format!("[{USER_JSON}]"))]);
        let users = client
            .get_users_by_ids(&["u1".to_string(), "u2".to_string()])
            .unwrap();
        assert_eq!(users.data.unwrap().len(), 1);
        let req = transport.last_request();
        assert!(req.url.ends_with("/users/ids"));
        assert_eq!(req.body.as_deref(), Some(r#"["u1","u2"]"#));
    }

    #[test]
    fn update_user_targets_user_id() {
        let (client, transport) = fake_client(vec![Canned::new(200, USER_JSON)]);
        let user = User {
            id: "u1".to_string(),
            nickname: "al".to_string(),
            ..User::default()
        };
        client.update_user(&user).unwrap();
        let req = transport.last_request();
        assert_eq!(req.method, HttpMethod::Put);
        assert!(req.url.ends_with("/users/u1"));
        assert_eq!(body_json(&req.body)["nickname"], "al");
    }

    #[test]
    fn password_and_role_updates() {
        let (client, transport) = fake_client(vec![
            Canned::new(200, r#"{"status":"OK"}"#),
            Canned::new(200, r#"{"status":"OK"}"#),
        ]);
        assert_eq!(
            client
                .update_user_password("u1", "old", "new")
                .unwrap()
                .data,
            Some(true)
        );
        let req = transport.last_request();
        assert!(req.url.ends_with("/users/u1/password"));
        let body = body_json(&req.body);
        assert_eq!(body["current_password"], "old");
        assert_eq!(body["new_password"], "new");

        client
            .update_user_roles("u1", "system_user system_admin")
            .unwrap();
        let req = transport.last_request();
        assert!(req.url.ends_with("/users/u1/roles"));
        assert_eq!(body_json(&req.body)["roles"], "system_user system_admin");
    }

    #[test]
    fn delete_and_password_reset_routes() {
        let (client, transport) = fake_client(Vec::new());
        for _ in 0..3 {
            transport.push(Canned::new(200, r#"{"status":"OK"}"#));
        }
        client.delete_user("u1").unwrap();
        let req = transport.last_request();
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());

        client.send_password_reset_email("a@b.com").unwrap();
        let req = transport.last_request();
        assert!(req.url.ends_with("/users/password/reset/send"));
        assert_eq!(body_json(&req.body)["email"], "a@b.com");

        client.reset_password("code-1", "Password2").unwrap();
        let req = transport.last_request();
        assert!(req.url.ends_with("/users/password/reset"));
        assert_eq!(body_json(&req.body)["code"], "code-1");
    }

    #[test]
    fn get_user_with_etag_not_modified() {
        let (client, transport) = fake_client(vec![Canned::new(304, "")]);
        let resp = client.get_user("u1", "u1.42").unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.response.status_code, 304);
        assert!(resp.response.error.is_none());
        assert_eq!(
            transport.last_request().header("If-None-Match"),
            Some("u1.42")
        );
    }
}
