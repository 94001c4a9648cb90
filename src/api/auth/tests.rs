use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
#[ignore = "requires local Postgres and Redis"]
async fn register_login_me_flow() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "correct-horse"
            })),
        ))
        .await
        .expect("register");

    assert_eq!(response.status(), StatusCode::CREATED);
    let registered = test_support::read_json(response).await;
    assert_eq!(registered["token_type"], "bearer");
    assert_eq!(registered["user"]["username"], "alice");
    assert_eq!(registered["user"]["is_admin"], false);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "correct-horse" })),
        ))
        .await
        .expect("login");

    assert_eq!(response.status(), StatusCode::OK);
    let logged_in = test_support::read_json(response).await;
    let token = logged_in["access_token"].as_str().expect("token").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");

    assert_eq!(response.status(), StatusCode::OK);
    let me = test_support::read_json(response).await;
    assert_eq!(me["email"], "alice@example.com");
}

#[tokio::test]
#[ignore = "requires local Postgres and Redis"]
async fn duplicate_registration_conflicts() {
    let ctx = test_support::setup_test_context().await;

    test_support::insert_user(ctx.state.db(), "bob", "bob@example.com", "some-password").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "bob",
                "email": "other@example.com",
                "password": "another-pass"
            })),
        ))
        .await
        .expect("register");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires local Postgres and Redis"]
async fn wrong_password_is_unauthorized() {
    let ctx = test_support::setup_test_context().await;

    test_support::insert_user(ctx.state.db(), "carol", "carol@example.com", "right-pass").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "carol", "password": "wrong-pass" })),
        ))
        .await
        .expect("login");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires local Postgres and Redis"]
async fn token_form_grant_issues_token() {
    let ctx = test_support::setup_test_context().await;

    test_support::insert_user(ctx.state.db(), "dave", "dave@example.com", "dave-pass").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::form_request(
            Method::POST,
            "/api/v1/auth/token",
            None,
            &[
                ("username".to_string(), "dave".to_string()),
                ("password".to_string(), "dave-pass".to_string()),
            ],
        ))
        .await
        .expect("token");

    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert!(body["access_token"].as_str().is_some());
}
