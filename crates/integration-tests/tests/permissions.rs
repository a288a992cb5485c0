//! Role and flag gates on the REST surface.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use binh_vuong_core::types::UserId;
use binh_vuong_integration_tests::{DEFAULT_PASSWORD, TestApp, order_body};

#[tokio::test]
async fn test_missing_or_unknown_actor_is_unauthorized() {
    let app = TestApp::spawn().await;

    let (status, _) = app.request(Method::GET, "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/orders", UserId::generate()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_needs_no_actor() {
    let app = TestApp::spawn().await;
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_returns_account_without_secret() {
    let app = TestApp::spawn().await;

    let (status, user) = app
        .request(
            Method::POST,
            "/api/users/login",
            None,
            Some(&json!({ "username": "kythuat", "password": DEFAULT_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "tech");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password").is_none());

    let (status, _) = app
        .request(
            Method::POST,
            "/api/users/login",
            None,
            Some(&json!({ "username": "kythuat", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_production_cannot_create_orders() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let xuong = app.user_id("xuong").await;
    let (_, customers) = app.get("/api/customers", admin).await;
    let customer = customers[0]["id"].as_str().unwrap();

    let (status, _) = app
        .post("/api/orders", xuong, &order_body(customer, "BV-100"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Customers module is off for the production preset
    let (status, _) = app.get("/api/customers", xuong).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_viewer_is_read_only() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let (_, customers) = app.get("/api/customers", admin).await;
    let customer = customers[0]["id"].as_str().unwrap().to_string();
    let (_, order) = app
        .post("/api/orders", admin, &order_body(&customer, "BV-101"))
        .await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, viewer) = app
        .post(
            "/api/users",
            admin,
            &json!({
                "username": "khach",
                "fullName": "Khách Xem",
                "role": "viewer",
                "password": "xem"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let viewer: UserId = viewer["id"].as_str().unwrap().parse().unwrap();

    let (status, orders) = app.get("/api/orders", viewer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let (status, _) = app
        .post(
            &format!("/api/orders/{order_id}/stages/chat"),
            viewer,
            &json!({ "status": "done" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/shipping", viewer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancelled_folder_is_admin_only() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let kythuat = app.user_id("kythuat").await;

    let (status, _) = app.get("/api/orders?folder=cancelled", kythuat).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, orders) = app
        .get("/api/orders?folder=cancelled&filter=urgent", admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_user_administration_rules() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let kythuat = app.user_id("kythuat").await;

    let (status, _) = app.get("/api/users", kythuat).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = app.get("/api/users", admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 3);

    let (status, _) = app
        .post(
            "/api/users",
            admin,
            &json!({
                "username": "kythuat",
                "fullName": "Trùng",
                "role": "tech",
                "password": "x"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.delete(&format!("/api/users/{admin}"), admin).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&format!("/api/users/{kythuat}"), admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The deleted account can no longer act or log in
    let (status, _) = app.get("/api/orders", kythuat).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .request(
            Method::POST,
            "/api/users/login",
            None,
            Some(&json!({ "username": "kythuat", "password": DEFAULT_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_admins_create_or_edit_accounts() {
    let app = TestApp::spawn().await;
    let kythuat = app.user_id("kythuat").await;
    let xuong = app.user_id("xuong").await;
    let account = json!({
        "username": "moi",
        "fullName": "Tài Khoản Mới",
        "role": "admin",
        "password": "x"
    });

    let (status, _) = app.post("/api/users", kythuat, &account).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Rejected before the missing password is noticed
    let mut no_password = account.clone();
    no_password["password"] = serde_json::Value::Null;
    let (status, _) = app.post("/api/users", kythuat, &no_password).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(&format!("/api/users/{xuong}"), kythuat, &account)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, users) = app.get("/api/users", app.user_id("admin").await).await;
    assert_eq!(users.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_password_change_takes_effect() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let xuong = app.user_id("xuong").await;

    let (status, _) = app
        .put(
            &format!("/api/users/{xuong}"),
            admin,
            &json!({
                "username": "xuong",
                "fullName": "Tổ Trưởng Sản Xuất",
                "role": "prod",
                "password": "moi"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let login = |password: &'static str| {
        json!({ "username": "xuong", "password": password })
    };
    let (status, _) = app
        .request(Method::POST, "/api/users/login", None, Some(&login("moi")))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .request(
            Method::POST,
            "/api/users/login",
            None,
            Some(&login(DEFAULT_PASSWORD)),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
