use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use quill_authz::password;
use quill_db::Filter;
use quill_http::AppError;
use serde::{Deserialize, Serialize};

use crate::modules::users::models::{UserRecord, USERS};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub name: String,
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(LoginRequest { username, password }) = payload?;

    let user = state
        .db
        .collection::<UserRecord>(USERS)
        .find_one(&Filter::eq("username", username.as_str()))
        .await?;

    let Some(user) = user else {
        tracing::info!(%username, "login rejected: unknown user");
        return Err(invalid_credentials());
    };

    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .context("password verification task failed")??;

    if !matches {
        tracing::info!(%username, "login rejected: wrong password");
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(&user.id, &user.username)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        name: user.name,
    }))
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("invalid username or password")
}
