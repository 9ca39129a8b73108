use std::sync::Arc;

use serde_json::json;

use crate::code_grant::client_credentials::{ClientCredentials, ClientCredentialsGrant};
use crate::code_grant::engine::TokenGrant;
use crate::code_grant::error::ErrorKind;

use super::defaults::*;
use super::*;

fn model_with_principal() -> Arc<TestModel> {
    let mut model = TestModel::new();
    model
        .principals
        .insert(EXAMPLE_CLIENT_ID.to_string(), TestUser { id: 42 });
    Arc::new(model)
}

#[test]
fn issues_token_for_principal() {
    let model = model_with_principal();
    let grant = ClientCredentialsGrant::new(options(&model)).unwrap();
    let request = token_request(json!({ "grant_type": "client_credentials", "scope": "read" }));

    let saved = smol::block_on(grant.handle(&request, &client())).unwrap();
    assert_eq!(saved.user, TestUser { id: 42 });
    assert_eq!(saved.token.scope, scope("read"));
    assert!(!saved.token.access_token.is_empty());
    assert!(!saved.token.refreshable());
    assert!(saved.token.refresh_token_expires_at.is_none());
    assert_eq!(grant.grant_type(), "client_credentials");

    assert_eq!(
        model.calls(),
        vec![
            Call::GetUserFromClient(EXAMPLE_CLIENT_ID.to_string()),
            Call::ValidateScope(Some("read".to_string())),
            Call::SaveToken {
                refresh_token: None,
                live_refresh_tokens: 0,
            },
        ]
    );
}

#[test]
fn rejects_client_without_principal() {
    let model = model_with_principal();
    let grant = ClientCredentialsGrant::new(options(&model)).unwrap();
    let request = token_request(json!({}));

    assert_error(
        smol::block_on(grant.handle(&request, &other_client())),
        ErrorKind::InvalidGrant,
        "Invalid grant: user credentials are invalid",
    );
}

#[test]
fn refresh_token_when_allowed() {
    let model = model_with_principal();
    let mut grant_type = ClientCredentials::new();
    grant_type.allow_refresh_token();
    let grant = TokenGrant::with_grant(options(&model), grant_type).unwrap();

    let saved = smol::block_on(grant.handle(&token_request(json!({})), &client())).unwrap();
    assert!(saved.token.refreshable());
    assert!(saved.token.refresh_token_expires_at.is_some());
}
