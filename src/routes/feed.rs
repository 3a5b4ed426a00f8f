use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthContext;
use crate::error::{AppError, AppResult, FieldViolation};
use crate::feed::{self, NewPost, PostUpdate};
use crate::state::AppState;
use crate::storage;

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feed/posts", get(list_posts))
        .route("/feed/post", post(create_post))
        .route(
            "/feed/post/{id}",
            put(update_post).get(get_post).delete(delete_post),
        )
        .route("/post-image", put(upload_image))
}

// -- Handlers --

async fn list_posts(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    ctx.require()?;
    let conn = state.db.get()?;
    let page = feed::list_posts(&conn, query.page.unwrap_or(1), state.config.feed.page_size)?;

    Ok(Json(json!({
        "message": "Fetched posts successfully.",
        "posts": page.posts,
        "totalItems": page.total_items,
    })))
}

async fn get_post(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    ctx.require()?;
    let conn = state.db.get()?;
    let post = feed::get_post(&conn, &id)?;

    Ok(Json(json!({ "message": "Post fetched", "post": post })))
}

async fn create_post(
    State(state): State<AppState>,
    ctx: AuthContext,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_post_form(&state, multipart).await?;
    let input = NewPost {
        title: form.title,
        content: form.content,
        image_url: form
            .stored_image
            .clone()
            .or(form.image_ref)
            .unwrap_or_default(),
    };

    let conn = state.db.get()?;
    match feed::create_post(&conn, &ctx, &input, &state.events) {
        Ok(post) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Post created.",
                "post": post,
                "creator": post.creator,
            })),
        )),
        Err(e) => {
            discard_upload(&state, form.stored_image);
            Err(e)
        }
    }
}

async fn update_post(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_post_form(&state, multipart).await?;
    let input = PostUpdate {
        title: form.title,
        content: form.content,
        image_url: form.stored_image.clone().or(form.image_ref),
    };

    let conn = state.db.get()?;
    match feed::update_post(&conn, &ctx, &id, &input, state.config.images_path(), &state.events) {
        Ok(post) => Ok(Json(json!({ "message": "Post updated", "post": post }))),
        Err(e) => {
            discard_upload(&state, form.stored_image);
            Err(e)
        }
    }
}

async fn delete_post(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let conn = state.db.get()?;
    feed::delete_post(&conn, &ctx, &id, state.config.images_path(), &state.events)?;

    Ok(Json(json!({ "message": "Deleted post." })))
}

/// Standalone image upload for clients that send the post mutation over
/// GraphQL: stores the file, optionally clears a superseded one, and returns
/// the path to reference from the mutation.
async fn upload_image(
    State(state): State<AppState>,
    ctx: AuthContext,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    ctx.require()?;

    let mut stored: Option<String> = None;
    let mut old_path: Option<String> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
                    let content_type = field
                        .content_type()
                        .map(|ct| ct.to_string())
                        .unwrap_or_default();
                    let data = field.bytes().await.map_err(malformed_body)?;
                    stored = Some(storage::store_image(
                        state.config.images_path(),
                        &file_name,
                        &content_type,
                        &data,
                    )?);
                }
            }
            "oldPath" => {
                let text = field.text().await.map_err(malformed_body)?;
                if !text.is_empty() {
                    old_path = Some(text);
                }
            }
            _ => {}
        }
    }

    let Some(file_path) = stored else {
        return Ok((StatusCode::OK, Json(json!({ "message": "No file provided." }))));
    };

    if let Some(old) = old_path {
        storage::clear_image(state.config.images_path(), &old);
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "File stored", "filePath": file_path })),
    ))
}

// -- Multipart helpers --

struct PostForm {
    title: String,
    content: String,
    /// Newly stored upload from this request, if any.
    stored_image: Option<String>,
    /// An existing `images/...` reference passed as a text field.
    image_ref: Option<String>,
}

async fn read_post_form(state: &AppState, mut multipart: Multipart) -> AppResult<PostForm> {
    let mut form = PostForm {
        title: String::new(),
        content: String::new(),
        stored_image: None,
        image_ref: None,
    };

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => form.title = field.text().await.map_err(malformed_body)?,
            "content" => form.content = field.text().await.map_err(malformed_body)?,
            "image" => {
                if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
                    let content_type = field
                        .content_type()
                        .map(|ct| ct.to_string())
                        .unwrap_or_default();
                    let data = field.bytes().await.map_err(malformed_body)?;
                    form.stored_image = Some(storage::store_image(
                        state.config.images_path(),
                        &file_name,
                        &content_type,
                        &data,
                    )?);
                } else {
                    let text = field.text().await.map_err(malformed_body)?;
                    if !text.is_empty() {
                        form.image_ref = Some(text);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn next_field(
    multipart: &mut Multipart,
) -> AppResult<Option<axum::extract::multipart::Field<'_>>> {
    multipart.next_field().await.map_err(malformed_body)
}

fn malformed_body<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Validation(vec![FieldViolation::new(
        "body",
        &format!("Malformed multipart body: {}", e),
    )])
}

/// A mutation that failed after this request stored a new upload leaves the
/// file unreferenced; remove it.
fn discard_upload(state: &AppState, stored_image: Option<String>) {
    if let Some(path) = stored_image {
        storage::clear_image(state.config.images_path(), &path);
    }
}
