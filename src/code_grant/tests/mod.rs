use std::collections::HashMap;
use std::fmt::Debug;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::code_grant::error::{ErrorKind, OAuthError};
use crate::endpoint::request::Request;
use crate::options::GrantOptions;
use crate::primitives::prelude::*;

mod client_credentials;

/// Some default values for tests
pub mod defaults {
    pub const EXAMPLE_CLIENT_ID: &str = "c1";
    pub const EXAMPLE_OTHER_CLIENT_ID: &str = "c2";
    pub const EXAMPLE_USERNAME: &str = "alice";
    pub const EXAMPLE_PASSWORD: &str = "secret";
    pub const EXAMPLE_OWNER_ID: u32 = 1;
    pub const EXAMPLE_REDIRECT_URI: &str = "https://client.example/endpoint";
    pub const EXAMPLE_SCOPE: &str = "read write";
    pub const EXAMPLE_REFRESH_TOKEN: &str = "refresh-token-1";
    pub const EXAMPLE_CODE: &str = "code-1";
}

use self::defaults::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestClient {
    pub id: String,
}

impl ClientIdentity for TestClient {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestUser {
    pub id: u32,
}

/// What the model returns from `save_token`, everything it was called with.
#[derive(Clone, Debug)]
pub struct SavedToken {
    pub token: Token,
    pub client: TestClient,
    pub user: TestUser,
}

/// A hook invocation, recorded in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    GetUser(String, String),
    GetUserFromClient(String),
    ValidateScope(Option<String>),
    GetRefreshToken(String),
    RevokeToken(String),
    GetAuthorizationCode(String),
    RevokeAuthorizationCode(String),
    SaveToken {
        refresh_token: Option<String>,
        /// Refresh tokens still valid at the time of saving.
        live_refresh_tokens: usize,
    },
}

/// An in-memory model recording every hook invocation.
#[derive(Default)]
pub struct TestModel {
    pub users: HashMap<(String, String), TestUser>,
    pub principals: HashMap<String, TestUser>,
    pub refresh_tokens: Mutex<HashMap<String, RefreshTokenRecord<TestClient, TestUser>>>,
    pub codes: Mutex<HashMap<String, AuthorizationCodeRecord<TestClient, TestUser>>>,
    /// Narrow requested scopes to this one, rejecting requests outside of it.
    pub allowed_scope: Option<Scope>,
    /// Supplied when no scope was requested.
    pub default_scope: Option<Scope>,
    pub access_token_lifetime: Option<Duration>,
    pub custom_access_token: Option<String>,
    /// Let `get_user` fail with a backend error.
    pub broken_backend: bool,
    /// Refuse to revoke, as if another request redeemed the grant first.
    pub refuse_revoke: bool,
    calls: Mutex<Vec<Call>>,
}

impl TestModel {
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(
            (EXAMPLE_USERNAME.to_string(), EXAMPLE_PASSWORD.to_string()),
            TestUser { id: EXAMPLE_OWNER_ID },
        );
        TestModel {
            users,
            ..TestModel::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn insert_refresh_token(&self, record: RefreshTokenRecord<TestClient, TestUser>) {
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(record.refresh_token.clone(), record);
    }

    pub fn insert_code(&self, record: AuthorizationCodeRecord<TestClient, TestUser>) {
        self.codes
            .lock()
            .unwrap()
            .insert(record.authorization_code.clone(), record);
    }

    pub fn has_refresh_token(&self, token: &str) -> bool {
        self.refresh_tokens.lock().unwrap().contains_key(token)
    }
}

impl Model for TestModel {
    type Client = TestClient;
    type User = TestUser;
    type SavedToken = SavedToken;
}

#[async_trait]
impl TokenPersistence for TestModel {
    async fn save_token(
        &self, token: Token, client: &TestClient, user: &TestUser,
    ) -> Result<SavedToken, ModelError> {
        let mut refresh_tokens = self.refresh_tokens.lock().unwrap();
        self.record(Call::SaveToken {
            refresh_token: token.refresh_token.clone(),
            live_refresh_tokens: refresh_tokens.len(),
        });

        if let Some(refresh_token) = &token.refresh_token {
            refresh_tokens.insert(
                refresh_token.clone(),
                RefreshTokenRecord {
                    refresh_token: refresh_token.clone(),
                    refresh_token_expires_at: token.refresh_token_expires_at,
                    scope: token.scope.clone(),
                    client: client.clone(),
                    user: user.clone(),
                },
            );
        }

        Ok(SavedToken {
            token,
            client: client.clone(),
            user: user.clone(),
        })
    }

    async fn generate_access_token(
        &self, _: &TestClient, _: &TestUser, _: &Scope,
    ) -> Result<Option<String>, ModelError> {
        Ok(self.custom_access_token.clone())
    }

    fn access_token_lifetime(&self, _: &TestClient) -> Option<Duration> {
        self.access_token_lifetime
    }
}

#[async_trait]
impl ScopeValidation for TestModel {
    async fn validate_scope(
        &self, _: &TestUser, _: &TestClient, scope: Option<&Scope>,
    ) -> Result<Option<Scope>, ModelError> {
        self.record(Call::ValidateScope(scope.map(Scope::to_string)));
        match (scope, &self.allowed_scope) {
            (None, _) => Ok(self.default_scope.clone()),
            (Some(scope), Some(allowed)) => Ok(Some(scope.intersection(allowed))),
            (Some(scope), None) => Ok(Some(scope.clone())),
        }
    }
}

#[async_trait]
impl UserLookup for TestModel {
    async fn get_user(&self, username: &str, password: &str) -> Result<Option<TestUser>, ModelError> {
        self.record(Call::GetUser(username.to_string(), password.to_string()));
        if self.broken_backend {
            return Err(ModelError::backend(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "database unavailable",
            )));
        }
        Ok(self
            .users
            .get(&(username.to_string(), password.to_string()))
            .cloned())
    }
}

#[async_trait]
impl ClientPrincipal for TestModel {
    async fn get_user_from_client(&self, client: &TestClient) -> Result<Option<TestUser>, ModelError> {
        self.record(Call::GetUserFromClient(client.id.clone()));
        Ok(self.principals.get(&client.id).cloned())
    }
}

#[async_trait]
impl RefreshTokenStore for TestModel {
    async fn get_refresh_token(
        &self, refresh_token: &str,
    ) -> Result<Option<RefreshTokenRecord<TestClient, TestUser>>, ModelError> {
        self.record(Call::GetRefreshToken(refresh_token.to_string()));
        Ok(self.refresh_tokens.lock().unwrap().get(refresh_token).cloned())
    }

    async fn revoke_token(
        &self, record: &RefreshTokenRecord<TestClient, TestUser>,
    ) -> Result<bool, ModelError> {
        self.record(Call::RevokeToken(record.refresh_token.clone()));
        if self.refuse_revoke {
            return Ok(false);
        }
        Ok(self
            .refresh_tokens
            .lock()
            .unwrap()
            .remove(&record.refresh_token)
            .is_some())
    }
}

#[async_trait]
impl AuthorizationCodeStore for TestModel {
    async fn get_authorization_code(
        &self, code: &str,
    ) -> Result<Option<AuthorizationCodeRecord<TestClient, TestUser>>, ModelError> {
        self.record(Call::GetAuthorizationCode(code.to_string()));
        Ok(self.codes.lock().unwrap().get(code).cloned())
    }

    async fn revoke_authorization_code(
        &self, record: &AuthorizationCodeRecord<TestClient, TestUser>,
    ) -> Result<bool, ModelError> {
        self.record(Call::RevokeAuthorizationCode(record.authorization_code.clone()));
        if self.refuse_revoke {
            return Ok(false);
        }
        Ok(self
            .codes
            .lock()
            .unwrap()
            .remove(&record.authorization_code)
            .is_some())
    }
}

pub fn client() -> TestClient {
    TestClient {
        id: EXAMPLE_CLIENT_ID.to_string(),
    }
}

pub fn other_client() -> TestClient {
    TestClient {
        id: EXAMPLE_OTHER_CLIENT_ID.to_string(),
    }
}

pub fn owner() -> TestUser {
    TestUser { id: EXAMPLE_OWNER_ID }
}

pub fn scope(encoded: &str) -> Scope {
    encoded.parse().unwrap()
}

/// A token request with the given body parameters.
pub fn token_request(body: Value) -> Request {
    Request::from_value(json!({
        "headers": { "Content-Type": "application/x-www-form-urlencoded" },
        "method": "POST",
        "query": {},
        "body": body,
    }))
    .unwrap()
}

pub fn options(model: &Arc<TestModel>) -> GrantOptions<TestModel> {
    GrantOptions::new(model.clone())
}

pub fn refresh_record(token: &str, client: TestClient) -> RefreshTokenRecord<TestClient, TestUser> {
    RefreshTokenRecord {
        refresh_token: token.to_string(),
        refresh_token_expires_at: Some(Utc::now() + Duration::days(1)),
        scope: scope(EXAMPLE_SCOPE),
        client,
        user: owner(),
    }
}

pub fn code_record(code: &str, client: TestClient) -> AuthorizationCodeRecord<TestClient, TestUser> {
    AuthorizationCodeRecord {
        authorization_code: code.to_string(),
        expires_at: Utc::now() + Duration::minutes(10),
        redirect_uri: Some(EXAMPLE_REDIRECT_URI.to_string()),
        scope: scope(EXAMPLE_SCOPE),
        client,
        user: owner(),
        code_challenge: None,
        code_challenge_method: None,
    }
}

/// Check the kind, machine code and message of a failed result.
pub fn assert_error<T: Debug>(result: Result<T, OAuthError>, kind: ErrorKind, message: &str) {
    let err = result.expect_err("Expected the request to fail");
    assert_eq!(err.kind(), kind, "unexpected error: {}", err);
    assert_eq!(err.code(), kind.as_ref());
    assert_eq!(err.message(), message);
}
