#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use quill_app::App;
use quill_kernel::Settings;
use serde_json::{json, Value};
use tower::ServiceExt;

pub async fn app() -> Router {
    App::bootstrap(Settings::default())
        .await
        .expect("application should bootstrap")
        .router()
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

pub async fn create_user(app: &Router, username: &str, password: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "username": username, "name": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

/// Register `username` and return a bearer token for it.
pub async fn signup(app: &Router, username: &str) -> String {
    create_user(app, username, "secret").await;
    let (status, body) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": username, "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

pub async fn create_blog(app: &Router, token: &str, blog: Value) -> Value {
    let (status, body) = send(app, Method::POST, "/api/blogs", Some(token), Some(blog)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

pub fn new_blog() -> Value {
    json!({
        "title": "Test an app",
        "author": "Jhon Doe",
        "url": "https://fullstackopen.com/",
        "likes": 4
    })
}

pub fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap_or_default()
}
