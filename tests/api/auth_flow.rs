use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use crate::support::{read_json, TestApp, PASSWORD};

#[tokio::test]
async fn root_and_health_respond() {
    let app = TestApp::new().await;

    let (status, body) = app.json(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Contacts API is running");

    let (status, body) = app.json(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn signup_returns_profile_and_sends_verification() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({"email": "ada@example.com", "username": "ada", "password": PASSWORD})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["is_verified"], false);
    assert_eq!(body["role"], "user");
    assert!(body.get("password_hash").is_none());

    let mail = app.outbox.last_for("verification", "ada@example.com").expect("verification mail");
    assert!(mail.link.contains("/auth/verify?token="));
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = TestApp::new().await;
    app.signup("dup@example.com").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({"email": "dup@example.com", "username": "again", "password": PASSWORD})),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn signup_rejects_invalid_payload() {
    let app = TestApp::new().await;

    let (status, _) = app
        .json(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({"email": "not-an-email", "username": "x", "password": "123"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verification_link_marks_account_verified() {
    let app = TestApp::new().await;
    app.signup("verify@example.com").await;
    let token = app.outbox.last_for("verification", "verify@example.com").unwrap().token();

    let (status, body) =
        app.json(Method::GET, &format!("/auth/verify?token={}", token), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email verified successfully");

    let response = app.login("verify@example.com", PASSWORD).await;
    let token = read_json(response).await["access_token"].as_str().unwrap().to_string();
    let (_, me) = app.json(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(me["is_verified"], true);
}

#[tokio::test]
async fn verification_rejects_garbage_token() {
    let app = TestApp::new().await;

    let (status, _) = app.json(Method::GET, "/auth/verify?token=garbage", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_bearer_token() {
    let app = TestApp::new().await;
    app.signup("login@example.com").await;

    let response = app.login("login@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new().await;
    app.signup("known@example.com").await;

    let wrong_password = app.login("known@example.com", "not-the-password").await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong_password.headers().contains_key(header::WWW_AUTHENTICATE));
    let wrong_password = read_json(wrong_password).await;

    let unknown = app.login("ghost@example.com", PASSWORD).await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown = read_json(unknown).await;

    assert_eq!(wrong_password, unknown);
}

#[tokio::test]
async fn blank_login_fields_fail_like_wrong_credentials() {
    let app = TestApp::new().await;

    let response = app.login("", "").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["message"], "Invalid credentials");
}

#[tokio::test]
async fn request_reset_with_malformed_email_gets_generic_answer() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(Method::POST, "/auth/request-reset", None, Some(json!({"email": "not an email"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().starts_with("If an account with that email exists"));
    assert!(app.outbox.sent().is_empty());
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = TestApp::new().await;

    let (status, _) = app.json(Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.json(Method::GET, "/auth/me", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_current_account() {
    let app = TestApp::new().await;
    let (id, token) = app.signup_and_login("me@example.com").await;

    let (status, body) = app.json(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["email"], "me@example.com");
}

#[tokio::test]
async fn me_is_rate_limited_per_client() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("busy@example.com").await;
    let router = app.router();

    let request = |client: &str| {
        Request::builder()
            .method(Method::GET)
            .uri("/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header("x-forwarded-for", client)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..app.config.rate_limit.me_per_minute {
        let response = router.clone().oneshot(request("203.0.113.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = router.clone().oneshot(request("203.0.113.7")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(header::RETRY_AFTER));

    let other_client = router.oneshot(request("198.51.100.1")).await.unwrap();
    assert_eq!(other_client.status(), StatusCode::OK);
}

#[tokio::test]
async fn request_reset_for_unknown_email_sends_nothing() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(Method::POST, "/auth/request-reset", None, Some(json!({"email": "nobody@example.com"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().starts_with("If an account with that email exists"));
    assert!(app.outbox.sent().is_empty());
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn password_reset_round_trip() {
    let app = TestApp::new().await;
    app.signup("reset@example.com").await;

    let (status, _) = app
        .json(Method::POST, "/auth/request-reset", None, Some(json!({"email": "reset@example.com"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = app.outbox.last_for("password_reset", "reset@example.com").unwrap().token();

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/reset-password",
            None,
            Some(json!({"token": token, "new_password": "brand-new-secret"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password has been reset successfully");

    assert_eq!(app.login("reset@example.com", PASSWORD).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("reset@example.com", "brand-new-secret").await.status(), StatusCode::OK);

    // tokens are single-use
    let (status, _) = app
        .json(
            Method::POST,
            "/auth/reset-password",
            None,
            Some(json!({"token": token, "new_password": "another-secret"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_password_rejects_unknown_token() {
    let app = TestApp::new().await;
    app.signup("keep@example.com").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/auth/reset-password",
            None,
            Some(json!({"token": "garbage", "new_password": "whatever-secret"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.login("keep@example.com", PASSWORD).await.status(), StatusCode::OK);
}
