pub mod policy;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::accounts;
use crate::auth::AuthContext;
use crate::db::models::{Creator, Post};
use crate::error::{AppError, AppResult, FieldViolation};
use crate::notify::{EventHub, PostEvent};
use crate::storage;

/// Minimum trimmed length for post titles and content.
pub const MIN_FIELD_LEN: usize = 5;

pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
}

pub struct PostUpdate {
    pub title: String,
    pub content: String,
    /// `None` retains the post's current image reference.
    pub image_url: Option<String>,
}

pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_items: i64,
}

/// List posts newest-created-first. Pages are 1-indexed; a page past the
/// end yields an empty list with the true total, never an error.
pub fn list_posts(conn: &Connection, page: u32, page_size: u32) -> AppResult<PostPage> {
    let page = page.max(1);
    let total_items: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;

    let offset = (page as i64 - 1) * page_size as i64;
    let mut stmt = conn.prepare(
        "SELECT p.id, p.title, p.content, p.image_url, p.created_at, p.updated_at, u.id, u.name
         FROM posts p
         JOIN users u ON u.id = p.creator_id
         ORDER BY p.created_at DESC, p.id DESC
         LIMIT ?1 OFFSET ?2",
    )?;
    let posts = stmt
        .query_map(params![page_size as i64, offset], map_post)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PostPage { posts, total_items })
}

pub fn get_post(conn: &Connection, post_id: &str) -> AppResult<Post> {
    conn.query_row(
        "SELECT p.id, p.title, p.content, p.image_url, p.created_at, p.updated_at, u.id, u.name
         FROM posts p
         JOIN users u ON u.id = p.creator_id
         WHERE p.id = ?1",
        params![post_id],
        map_post,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("No post found".into()))
}

/// Posts owned by one user, in creation order.
pub fn posts_by_creator(conn: &Connection, user_id: &str) -> AppResult<Vec<Post>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.title, p.content, p.image_url, p.created_at, p.updated_at, u.id, u.name
         FROM posts p
         JOIN users u ON u.id = p.creator_id
         WHERE p.creator_id = ?1
         ORDER BY p.created_at ASC, p.id ASC",
    )?;
    let posts = stmt
        .query_map(params![user_id], map_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Create a post owned by the caller and append it to the caller's post
/// list. The two writes are separate statements; a failed owner-link write
/// surfaces as an internal error and logs the orphaned post id.
pub fn create_post(
    conn: &Connection,
    caller: &AuthContext,
    input: &NewPost,
    hub: &EventHub,
) -> AppResult<Post> {
    let user_id = caller.require()?;
    validate_input(&input.title, &input.content, Some(&input.image_url))?;

    // The creator reference must resolve at creation time
    let user = accounts::load_user(conn, user_id).map_err(|e| match e {
        AppError::NotFound(_) => AppError::Unauthenticated,
        other => other,
    })?;

    let now = Utc::now();
    let post_id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO posts (id, creator_id, title, content, image_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            post_id,
            user.id,
            input.title,
            input.content,
            input.image_url,
            now.to_rfc3339(),
            now.to_rfc3339()
        ],
    )?;

    if let Err(e) = accounts::attach_post(conn, &user.id, &post_id) {
        tracing::warn!("post {} stored but owner link write failed: {}", post_id, e);
        return Err(AppError::Internal(format!(
            "post {} stored without owner link",
            post_id
        )));
    }

    let post = Post {
        id: post_id,
        title: input.title.clone(),
        content: input.content.clone(),
        image_url: input.image_url.clone(),
        creator: Creator {
            id: user.id,
            name: user.name,
        },
        created_at: now,
        updated_at: now,
    };

    hub.publish(PostEvent::created(&post));
    Ok(post)
}

/// Update a post's title, content, and (optionally) image. A superseded
/// image reference has its stored file removed exactly once, after the new
/// state is persisted.
pub fn update_post(
    conn: &Connection,
    caller: &AuthContext,
    post_id: &str,
    input: &PostUpdate,
    images_dir: &Path,
    hub: &EventHub,
) -> AppResult<Post> {
    let user_id = caller.require()?;
    validate_input(&input.title, &input.content, input.image_url.as_deref())?;

    let existing = get_post(conn, post_id)?;
    if !policy::can_mutate(&existing, user_id) {
        return Err(AppError::Forbidden);
    }

    let image_url = input
        .image_url
        .clone()
        .unwrap_or_else(|| existing.image_url.clone());
    let now = Utc::now();

    conn.execute(
        "UPDATE posts SET title = ?1, content = ?2, image_url = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            input.title,
            input.content,
            image_url,
            now.to_rfc3339(),
            post_id
        ],
    )?;

    if image_url != existing.image_url {
        storage::clear_image(images_dir, &existing.image_url);
    }

    let post = Post {
        id: existing.id,
        title: input.title.clone(),
        content: input.content.clone(),
        image_url,
        creator: existing.creator,
        created_at: existing.created_at,
        updated_at: now,
    };

    hub.publish(PostEvent::updated(&post));
    Ok(post)
}

/// Delete a post, its stored image, and the owner's link to it.
pub fn delete_post(
    conn: &Connection,
    caller: &AuthContext,
    post_id: &str,
    images_dir: &Path,
    hub: &EventHub,
) -> AppResult<()> {
    let user_id = caller.require()?;

    let existing = get_post(conn, post_id)?;
    if !policy::can_mutate(&existing, user_id) {
        return Err(AppError::Forbidden);
    }

    conn.execute("DELETE FROM posts WHERE id = ?1", params![post_id])?;
    storage::clear_image(images_dir, &existing.image_url);

    if let Err(e) = accounts::detach_post(conn, user_id, post_id) {
        tracing::warn!(
            "post {} deleted but owner link removal failed: {}",
            post_id,
            e
        );
        return Err(AppError::Internal(format!(
            "post {} deleted but still linked to its owner",
            post_id
        )));
    }

    hub.publish(PostEvent::deleted(post_id));
    Ok(())
}

/// Validate title/content (required, trimmed, min length) and, when the
/// image is required or explicitly supplied, that it is non-empty. Every
/// violated field is reported.
fn validate_input(title: &str, content: &str, image_url: Option<&str>) -> AppResult<()> {
    let mut violations = Vec::new();

    if title.trim().len() < MIN_FIELD_LEN {
        violations.push(FieldViolation::new("title", "Title is invalid"));
    }
    if content.trim().len() < MIN_FIELD_LEN {
        violations.push(FieldViolation::new("content", "Content is invalid"));
    }
    if let Some(image_url) = image_url {
        if image_url.trim().is_empty() {
            violations.push(FieldViolation::new("image", "No image provided"));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}

fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        image_url: row.get(3)?,
        created_at: parse_datetime(4, row.get(4)?)?,
        updated_at: parse_datetime(5, row.get(5)?)?,
        creator: Creator {
            id: row.get(6)?,
            name: row.get(7)?,
        },
    })
}

/// Parse a stored RFC3339 timestamp. An unparseable value is corrupt data
/// and surfaces as a conversion error, never a substituted timestamp.
fn parse_datetime(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
