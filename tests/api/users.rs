use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

use crate::support::{read_json, TestApp, PASSWORD};

async fn admin_token(app: &TestApp, email: &str) -> (i64, String) {
    let id = app.signup(email).await;
    app.promote_to_admin(id).await;
    let response = app.login(email, PASSWORD).await;
    let token = read_json(response).await["access_token"].as_str().unwrap().to_string();
    (id, token)
}

#[tokio::test]
async fn admin_lists_users_with_pagination() {
    let app = TestApp::new().await;
    let (_, admin) = admin_token(&app, "admin@example.com").await;
    for n in 0..3 {
        app.signup(&format!("user{}@example.com", n)).await;
    }

    let (status, body) = app.json(Method::GET, "/users/?limit=2&offset=1", Some(&admin), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["offset"], 1);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn regular_user_cannot_list_users() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("plain@example.com").await;

    let (status, body) = app.json(Method::GET, "/users/", Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");
}

#[tokio::test]
async fn users_read_themselves_but_not_others() {
    let app = TestApp::new().await;
    let (me, token) = app.signup_and_login("self@example.com").await;
    let other = app.signup("neighbour@example.com").await;

    let (status, body) = app.json(Method::GET, &format!("/users/{}", me), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "self@example.com");

    let (status, _) = app.json(Method::GET, &format!("/users/{}", other), Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_gets_404_for_missing_user() {
    let app = TestApp::new().await;
    let (_, admin) = admin_token(&app, "admin@example.com").await;

    let (status, _) = app.json(Method::GET, "/users/9999", Some(&admin), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_admin_cannot_change_roles() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("climber@example.com").await;
    let target = app.signup("target@example.com").await;

    let (status, _) = app
        .json(Method::PUT, &format!("/users/{}/role", target), Some(&token), Some(json!({"role": "admin"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        app.json(Method::PUT, "/users/9999/role", Some(&token), Some(json!({"role": "admin"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_role_is_rejected() {
    let app = TestApp::new().await;
    let (_, admin) = admin_token(&app, "admin@example.com").await;
    let target = app.signup("target@example.com").await;

    let (status, _) = app
        .json(Method::PUT, &format!("/users/{}/role", target), Some(&admin), Some(json!({"role": "root"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn role_change_takes_effect_despite_cached_profile() {
    let app = TestApp::new().await;
    let (_, admin) = admin_token(&app, "admin@example.com").await;
    let (target, token) = app.signup_and_login("promoted@example.com").await;

    // warm the cache with the old role
    let (_, me) = app.json(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(me["role"], "user");

    let (status, body) = app
        .json(Method::PUT, &format!("/users/{}/role", target), Some(&admin), Some(json!({"role": "admin"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, _) = app.json(Method::GET, "/users/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

fn multipart_request(token: &str, field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "contactbook-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n", field, filename).as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/users/avatar")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn avatar_upload_updates_profile_and_is_served() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("pic@example.com").await;

    let response = app.send(multipart_request(&token, "file", "me.png", "image/png", b"\x89PNG fake")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let avatar_url = read_json(response).await["avatar_url"].as_str().unwrap().to_string();
    assert!(avatar_url.starts_with("http://testserver/media/avatars/"));
    assert!(avatar_url.ends_with(".png"));

    let (_, me) = app.json(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(me["avatar_url"], avatar_url.as_str());

    let served_path = avatar_url.trim_start_matches("http://testserver");
    let served = app
        .send(Request::builder().uri(served_path).body(Body::empty()).unwrap())
        .await;
    assert_eq!(served.status(), StatusCode::OK);
}

#[tokio::test]
async fn avatar_upload_rejects_non_images_and_missing_field() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("pic@example.com").await;

    let response = app.send(multipart_request(&token, "file", "notes.txt", "text/plain", b"hello")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send(multipart_request(&token, "other", "me.png", "image/png", b"\x89PNG")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(multipart_request(&token, "file", "x.html", "image/anything", b"<script>alert(1)</script>"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, me) = app.json(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(me["avatar_url"], serde_json::Value::Null);
}
