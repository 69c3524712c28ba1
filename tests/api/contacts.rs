use axum::http::{Method, StatusCode};
use chrono::{Datelike, Duration, Utc};
use serde_json::{json, Value};

use crate::support::TestApp;

fn contact(first: &str, last: &str, email: &str) -> Value {
    json!({
        "first_name": first,
        "last_name": last,
        "email": email,
        "phone": "+1 555 0100",
    })
}

async fn create(app: &TestApp, token: &str, body: Value) -> Value {
    let (status, created) = app.json(Method::POST, "/contacts/", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", created);
    created
}

#[tokio::test]
async fn contacts_require_authentication() {
    let app = TestApp::new().await;

    let (status, _) = app.json(Method::GET, "/contacts/", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_and_fetch_contact() {
    let app = TestApp::new().await;
    let (owner, token) = app.signup_and_login("owner@example.com").await;

    let created = create(&app, &token, contact("Grace", "Hopper", "grace@example.com")).await;
    assert_eq!(created["owner_id"], owner);
    assert_eq!(created["birthday"], Value::Null);

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = app.json(Method::GET, &format!("/contacts/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn invalid_contact_is_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("owner@example.com").await;

    let (status, _) = app
        .json(Method::POST, "/contacts/", Some(&token), Some(contact("", "Hopper", "not-an-email")))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contacts_are_isolated_between_owners() {
    let app = TestApp::new().await;
    let (_, alice) = app.signup_and_login("alice@example.com").await;
    let (_, bob) = app.signup_and_login("bob@example.com").await;

    let created = create(&app, &alice, contact("Grace", "Hopper", "grace@example.com")).await;
    let path = format!("/contacts/{}", created["id"]);

    let (status, listed) = app.json(Method::GET, "/contacts/", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());

    let (status, _) = app.json(Method::GET, &path, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json(Method::PUT, &path, Some(&bob), Some(json!({"first_name": "Mallory"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json(Method::DELETE, &path, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, unchanged) = app.json(Method::GET, &path, Some(&alice), None).await;
    assert_eq!(unchanged["first_name"], "Grace");
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("owner@example.com").await;
    let created = create(&app, &token, contact("Grace", "Hopper", "grace@example.com")).await;
    let path = format!("/contacts/{}", created["id"]);

    let (status, updated) = app
        .json(Method::PUT, &path, Some(&token), Some(json!({"phone": "+1 555 0199", "birthday": "1906-12-09"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "+1 555 0199");
    assert_eq!(updated["birthday"], "1906-12-09");
    assert_eq!(updated["first_name"], "Grace");
    assert_eq!(updated["email"], "grace@example.com");
}

#[tokio::test]
async fn search_matches_case_insensitive_substrings() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("owner@example.com").await;
    create(&app, &token, contact("Grace", "Hopper", "grace@navy.mil")).await;
    create(&app, &token, contact("Alan", "Turing", "alan@example.com")).await;

    let (status, found) = app.json(Method::GET, "/contacts/search?last_name=HOP", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["first_name"], "Grace");

    let (_, by_email) = app.json(Method::GET, "/contacts/search?email=example", Some(&token), None).await;
    assert_eq!(by_email.as_array().unwrap().len(), 1);
    assert_eq!(by_email[0]["first_name"], "Alan");
}

#[tokio::test]
async fn upcoming_birthdays_respect_the_window() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("owner@example.com").await;
    let today = Utc::now().date_naive();

    // year 2000 is a leap year, so every month/day pair exists
    let soon = (today + Duration::days(2)).with_year(2000).unwrap();
    let later = (today + Duration::days(60)).with_year(2000).unwrap();

    let mut near = contact("Soon", "Party", "soon@example.com");
    near["birthday"] = json!(soon.to_string());
    create(&app, &token, near).await;

    let mut far = contact("Later", "Party", "later@example.com");
    far["birthday"] = json!(later.to_string());
    create(&app, &token, far).await;

    create(&app, &token, contact("No", "Birthday", "none@example.com")).await;

    let (status, upcoming) = app.json(Method::GET, "/contacts/birthdays", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let upcoming = upcoming.as_array().unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0]["first_name"], "Soon");

    let (_, wider) = app.json(Method::GET, "/contacts/birthdays?days=90", Some(&token), None).await;
    assert_eq!(wider.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn delete_removes_contact() {
    let app = TestApp::new().await;
    let (_, token) = app.signup_and_login("owner@example.com").await;
    let created = create(&app, &token, contact("Grace", "Hopper", "grace@example.com")).await;
    let path = format!("/contacts/{}", created["id"]);

    let (status, body) = app.json(Method::DELETE, &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.json(Method::GET, &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
