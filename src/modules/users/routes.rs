use std::collections::HashMap;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use quill_authz::password;
use quill_db::{DbError, Filter};
use quill_http::AppError;

use super::models::{BlogSummary, CreateUser, NewUserRecord, User, UserRecord, USERS};
use crate::modules::blogs::models::{BlogRecord, BLOGS};
use crate::state::AppState;

/// Minimum length, in characters, of usernames, names, and passwords.
pub const MIN_FIELD_LEN: usize = 3;

/// List users with their blogs populated
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = state
        .db
        .collection::<UserRecord>(USERS)
        .find(&Filter::all())
        .await?;

    let owned_ids = users.iter().flat_map(|user| user.blogs.iter().cloned());
    let blogs: HashMap<String, BlogSummary> = state
        .db
        .collection::<BlogRecord>(BLOGS)
        .find(&Filter::id_in(owned_ids))
        .await?
        .iter()
        .map(|blog| (blog.id.clone(), blog.summary()))
        .collect();

    let users = users
        .into_iter()
        .map(|user| {
            let owned = user
                .blogs
                .iter()
                .filter_map(|id| blogs.get(id).cloned())
                .collect();
            User::from_record(user, owned)
        })
        .collect();

    Ok(Json(users))
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(body) = payload?;

    let username = required_field("username", body.username.as_deref())?;
    let name = required_field("name", body.name.as_deref())?;
    let password = required_field("password", body.password.as_deref())?;

    let users = state.db.collection::<UserRecord>(USERS);
    if users
        .find_one(&Filter::eq("username", username))
        .await?
        .is_some()
    {
        return Err(username_taken());
    }

    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .context("password hashing task failed")??;

    let record = NewUserRecord {
        username,
        name,
        password_hash: &password_hash,
        blogs: Vec::new(),
    };
    let saved = users.save(&record).await.map_err(|e| match e {
        DbError::Duplicate { .. } => username_taken(),
        other => other.into(),
    })?;

    tracing::info!(user_id = %saved.id, username = %saved.username, "user registered");
    Ok((StatusCode::CREATED, Json(User::from_record(saved, Vec::new()))))
}

fn required_field<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, AppError> {
    match value {
        Some(value) if value.chars().count() >= MIN_FIELD_LEN => Ok(value),
        _ => Err(AppError::invalid_field(
            field,
            format!(
                "{} is missing or must be at least {} characters long",
                field, MIN_FIELD_LEN
            ),
        )),
    }
}

fn username_taken() -> AppError {
    AppError::invalid_field("username", "username to be unique")
}
