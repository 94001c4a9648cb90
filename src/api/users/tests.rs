use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
#[ignore = "requires local Postgres and Redis"]
async fn admin_can_create_list_and_delete_users() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/users",
            Some(&token),
            Some(json!({
                "username": "student",
                "email": "student@example.com",
                "password": "student-pass"
            })),
        ))
        .await
        .expect("create user");

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = test_support::read_json(response).await;
    let user_id = created["id"].as_str().expect("id").to_string();
    assert_eq!(created["is_admin"], false);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/users", Some(&token), None))
        .await
        .expect("list users");

    assert_eq!(response.status(), StatusCode::OK);
    let listed = test_support::read_json(response).await;
    assert_eq!(listed["total_count"], 2);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/users/{user_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("delete user");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires local Postgres and Redis"]
async fn non_admin_cannot_manage_users() {
    let ctx = test_support::setup_test_context().await;

    let user =
        test_support::insert_user(ctx.state.db(), "plain", "plain@example.com", "plain-pass")
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/users", Some(&token), None))
        .await
        .expect("list users");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires local Postgres and Redis"]
async fn admin_cannot_delete_themselves() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/users/{}", admin.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete self");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires local Postgres and Redis"]
async fn duplicate_insert_race_maps_to_conflict() {
    use crate::api::errors::ApiError;
    use crate::core::time::primitive_now_utc;
    use crate::repositories;
    use uuid::Uuid;

    let ctx = test_support::setup_test_context().await;

    test_support::insert_user(ctx.state.db(), "student", "student@example.com", "student-pass")
        .await;

    // A second insert that slipped past the pre-check loses on the unique
    // constraint and must surface as Conflict, not Internal.
    let now = primitive_now_utc();
    let err = repositories::users::create(
        ctx.state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: "student",
            email: "other@example.com",
            hashed_password: "x".to_string(),
            is_admin: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect_err("duplicate username");

    let mapped = ApiError::conflict_on_unique(err, "already exists", "Failed to create user");
    assert!(matches!(mapped, ApiError::Conflict(_)));
}
