//! Bearer parsing, permission and role guards, and administrative routes.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn public_routes_need_no_token() {
    let t = TestApp::new();
    let (status, body) = t.request(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the Keygate API");

    let (status, body) = t.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn authorization_header_problems() {
    let t = TestApp::new();

    let (status, body) = t.request(Method::GET, "/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token_missing");

    let (status, body) = t
        .request(Method::GET, "/items", Some("Basic abc"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token_format");

    let (status, body) = t.request(Method::GET, "/items", Some("Bearer"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token_format");

    let (status, body) = t.call(Method::GET, "/items", "garbage", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn refresh_token_is_not_a_bearer_token() {
    let t = TestApp::new();
    t.client("reader", &["user"]).await;
    let refresh = t.login("reader").await["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = t.call(Method::GET, "/me", &refresh, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "wrong_token_type");
}

#[tokio::test]
async fn me_reports_roles_and_permissions() {
    let t = TestApp::new();
    t.client("boss", &["manager"]).await;
    let token = t.access_token("boss").await;

    let (status, body) = t.call(Method::GET, "/me", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client_id"], "boss");
    assert_eq!(body["roles"], json!(["manager"]));
    assert_eq!(
        body["permissions"],
        json!(["items:delete", "items:read", "items:write"])
    );
    assert!(body.get("client_secret_hash").is_none());
}

#[tokio::test]
async fn user_reads_items_but_cannot_write() {
    let t = TestApp::new();
    t.client("reader", &["user"]).await;
    let token = t.access_token("reader").await;

    let (status, _) = t.call(Method::GET, "/items", &token, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t
        .call(
            Method::POST,
            "/items",
            &token,
            Some(json!({"name": "x", "price": 1.0})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["message"], "Permission denied. Required: items:write");
}

#[tokio::test]
async fn manager_cannot_read_users() {
    let t = TestApp::new();
    t.client("boss", &["manager"]).await;
    let token = t.access_token("boss").await;

    let (status, body) = t.call(Method::GET, "/users", &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Permission denied. Required: users:read");

    let (status, body) = t.call(Method::GET, "/roles", &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Role required: admin");
}

#[tokio::test]
async fn admin_manages_users_and_roles() {
    let t = TestApp::new();
    t.client("root", &["admin"]).await;
    let admin = t.access_token("root").await;

    let (status, created) = t
        .call(
            Method::POST,
            "/users",
            &admin,
            Some(json!({
                "username": "newbie",
                "email": "newbie@example.com",
                "client_id": "newbie",
                "client_secret": "newbie-secret",
                "password": "password123",
                "roles": ["user"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["roles"], json!(["user"]));
    assert_eq!(created["is_active"], true);

    let (status, users) = t.call(Method::GET, "/users", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let newbie = t.access_token("newbie").await;
    let (status, _) = t
        .call(Method::DELETE, "/items/1", &newbie, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Role changes apply to tokens already issued.
    let (status, body) = t
        .call(
            Method::POST,
            "/users/newbie/roles",
            &admin,
            Some(json!({"role": "manager"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["manager", "user"]));
    let (status, body) = t
        .call(Method::DELETE, "/items/1", &newbie, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = t
        .call(Method::DELETE, "/users/newbie/roles/manager", &admin, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["user"]));

    let (status, roles) = t.call(Method::GET, "/roles", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roles.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn create_user_validates_input() {
    let t = TestApp::new();
    t.client("root", &["admin"]).await;
    let admin = t.access_token("root").await;

    let (status, body) = t
        .call(
            Method::POST,
            "/users",
            &admin,
            Some(json!({"username": "half"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_fields");

    let (status, body) = t
        .call(
            Method::POST,
            "/users",
            &admin,
            Some(json!({
                "username": "root-name",
                "email": "other@example.com",
                "client_id": "other",
                "client_secret": "s",
                "password": "p",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = t
        .call(
            Method::POST,
            "/users/root/roles",
            &admin,
            Some(json!({"role": "superuser"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn deactivation_invalidates_outstanding_tokens() {
    let t = TestApp::new();
    t.client("root", &["admin"]).await;
    t.client("reader", &["user"]).await;
    let admin = t.access_token("root").await;
    let reader = t.access_token("reader").await;

    let (status, body) = t
        .call(
            Method::PUT,
            "/users/reader/active",
            &admin,
            Some(json!({"active": false})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, body) = t.call(Method::GET, "/items", &reader, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_client");

    let (status, _) = t
        .call(
            Method::PUT,
            "/users/reader/active",
            &admin,
            Some(json!({"active": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.call(Method::GET, "/items", &reader, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_cannot_deactivate_itself() {
    let t = TestApp::new();
    t.client("root", &["admin"]).await;
    let admin = t.access_token("root").await;

    let (status, body) = t
        .call(
            Method::PUT,
            "/users/root/active",
            &admin,
            Some(json!({"active": false})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}
