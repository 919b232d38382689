use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use quill_authz::ensure_owner;
use quill_db::Filter;
use quill_http::{AppError, AuthUser};

use super::models::{
    Blog, BlogRecord, BlogStats, CreateBlog, NewBlogRecord, Owner, UpdateBlog, BLOGS,
};
use crate::modules::users::models::{UserRecord, USERS};
use crate::state::AppState;
use crate::utils::likes::{self, PostRecord};

/// List every blog with its owner populated
pub async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<Blog>>, AppError> {
    let blogs = state
        .db
        .collection::<BlogRecord>(BLOGS)
        .find(&Filter::all())
        .await?;

    let owners: HashMap<String, Owner> = state
        .db
        .collection::<UserRecord>(USERS)
        .find(&Filter::all())
        .await?
        .iter()
        .map(|user| (user.id.clone(), Owner::from(user)))
        .collect();

    let blogs = blogs
        .into_iter()
        .map(|blog| {
            let owner = blog.user.as_ref().and_then(|id| owners.get(id)).cloned();
            Blog::from_record(blog, owner)
        })
        .collect();

    Ok(Json(blogs))
}

pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Blog>, AppError> {
    let blog = find_blog(&state, &id).await?;
    Ok(Json(populate(&state, blog).await?))
}

/// Total likes and the most-liked blog across the collection
pub async fn blog_stats(State(state): State<AppState>) -> Result<Json<BlogStats>, AppError> {
    let records: Vec<PostRecord> = state
        .db
        .collection::<BlogRecord>(BLOGS)
        .find(&Filter::all())
        .await?
        .iter()
        .map(PostRecord::from)
        .collect();

    Ok(Json(BlogStats {
        total_likes: likes::total_likes(&records),
        favorite: likes::favorite_post(&records).cloned(),
    }))
}

pub async fn create_blog(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateBlog>, JsonRejection>,
) -> Result<(StatusCode, Json<Blog>), AppError> {
    let Json(body) = payload?;

    let title = required("title", body.title.as_deref())?;
    let url = required("url", body.url.as_deref())?;

    let users = state.db.collection::<UserRecord>(USERS);
    let Some(owner) = users.find_by_id(auth.id()).await? else {
        return Err(AppError::unauthorized("token user no longer exists"));
    };

    let record = NewBlogRecord {
        title,
        author: body.author.as_deref(),
        url,
        likes: body.likes.unwrap_or(0),
        user: &owner.id,
    };
    let saved = state.db.collection::<BlogRecord>(BLOGS).save(&record).await?;
    users.push(&owner.id, "blogs", &saved.id).await?;

    tracing::info!(blog_id = %saved.id, user_id = %owner.id, "blog created");
    Ok((
        StatusCode::CREATED,
        Json(Blog::from_record(saved, Some(Owner::from(&owner)))),
    ))
}

/// Update a blog. Anyone signed in may change `likes`; other fields need ownership.
pub async fn update_blog(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBlog>, JsonRejection>,
) -> Result<Json<Blog>, AppError> {
    let Json(mut patch) = payload?;

    let blog = find_blog(&state, &id).await?;
    if !patch.only_likes() {
        ensure_owner(blog.user.as_deref(), auth.id())?;
    }
    normalize("title", &mut patch.title)?;
    normalize("url", &mut patch.url)?;

    let updated = state
        .db
        .collection::<BlogRecord>(BLOGS)
        .find_by_id_and_update(&id, &patch)
        .await?
        .ok_or_else(|| blog_not_found(&id))?;

    tracing::info!(blog_id = %id, user_id = %auth.id(), likes = updated.likes, "blog updated");
    Ok(Json(populate(&state, updated).await?))
}

/// Delete a blog owned by the caller. Deleting an unknown id succeeds.
pub async fn delete_blog(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let blogs = state.db.collection::<BlogRecord>(BLOGS);
    let Some(blog) = blogs.find_by_id(&id).await? else {
        return Ok(StatusCode::NO_CONTENT);
    };
    ensure_owner(blog.user.as_deref(), auth.id())?;

    blogs.find_by_id_and_remove(&id).await?;
    if let Some(owner) = blog.user.as_deref() {
        state
            .db
            .collection::<UserRecord>(USERS)
            .pull(owner, "blogs", &id)
            .await?;
    }

    tracing::info!(blog_id = %id, user_id = %auth.id(), "blog deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_blog(state: &AppState, id: &str) -> Result<BlogRecord, AppError> {
    state
        .db
        .collection::<BlogRecord>(BLOGS)
        .find_by_id(id)
        .await?
        .ok_or_else(|| blog_not_found(id))
}

async fn populate(state: &AppState, blog: BlogRecord) -> Result<Blog, AppError> {
    let owner = match blog.user.as_deref() {
        Some(user_id) => state
            .db
            .collection::<UserRecord>(USERS)
            .find_by_id(user_id)
            .await?
            .map(|user| Owner::from(&user)),
        None => None,
    };
    Ok(Blog::from_record(blog, owner))
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, AppError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::invalid_field(field, format!("{} is missing", field))),
    }
}

/// Trim a field present in an update, rejecting it if it ends up blank.
fn normalize(field: &str, value: &mut Option<String>) -> Result<(), AppError> {
    if let Some(current) = value.as_deref() {
        let trimmed = required(field, Some(current))?.to_string();
        *value = Some(trimmed);
    }
    Ok(())
}

fn blog_not_found(id: &str) -> AppError {
    AppError::not_found(format!("blog '{}' not found", id))
}
