mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{app, create_user, error_message, get, send};

async fn user_count(app: &axum::Router) -> usize {
    let (status, body) = get(app, "/api/users").await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().unwrap().len()
}

#[tokio::test]
async fn creates_a_user_with_a_new_username() {
    let app = app().await;
    create_user(&app, "userToTest", "secret").await;
    let before = user_count(&app).await;

    let created = create_user(&app, "mluukkai", "salainen").await;
    assert_eq!(created["username"], "mluukkai");
    assert!(created["id"].is_string());
    assert!(created.get("password_hash").is_none());
    assert!(created.get("password").is_none());

    let (_, users) = get(&app, "/api/users").await;
    let usernames: Vec<_> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(usernames.contains(&"mluukkai"));
    assert_eq!(usernames.len(), before + 1);
}

#[tokio::test]
async fn rejects_missing_or_short_fields() {
    let app = app().await;
    create_user(&app, "userToTest", "secret").await;
    let before = user_count(&app).await;

    let cases = [
        (json!({ "name": "name", "password": "secret" }), "username"),
        (json!({ "username": "na", "name": "name", "password": "secret" }), "username"),
        (json!({ "username": "newuser", "password": "secret" }), "name"),
        (json!({ "username": "newuser", "name": "na", "password": "secret" }), "name"),
        (json!({ "username": "newuser", "name": "name" }), "password"),
        (json!({ "username": "newuser", "name": "name", "password": "se" }), "password"),
    ];

    for (payload, field) in cases {
        let (status, body) = send(&app, Method::POST, "/api/users", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            error_message(&body),
            format!("{} is missing or must be at least 3 characters long", field)
        );
        assert_eq!(body["error"]["details"][0]["field"], field);
    }

    assert_eq!(user_count(&app).await, before);
}

#[tokio::test]
async fn rejects_a_taken_username() {
    let app = app().await;
    create_user(&app, "userToTest", "secret").await;
    let before = user_count(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "username": "userToTest", "name": "someone", "password": "secret" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("username to be unique"));
    assert_eq!(user_count(&app).await, before);
}

#[tokio::test]
async fn rejects_malformed_json() {
    let app = app().await;
    let (status, body) = send(&app, Method::POST, "/api/users", None, Some(json!([1, 2]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn login_issues_token_for_valid_credentials() {
    let app = app().await;
    create_user(&app, "userToTest", "secret").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "userToTest", "password": "secret" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["username"], "userToTest");
    assert_eq!(body["name"], "userToTest");
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_user() {
    let app = app().await;
    create_user(&app, "userToTest", "secret").await;

    for (username, password) in [("userToTest", "wrong"), ("nobody", "secret")] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(&body), "invalid username or password");
    }
}
