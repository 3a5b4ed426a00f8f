use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::auth::Credentials;
use crate::db::models::User;
use crate::error::{AppError, AppResult, FieldViolation};

pub struct SignupInput {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Create a new account. The password is stored only as a bcrypt hash and
/// the status field starts at its schema default ("I am new!").
pub fn signup(conn: &Connection, credentials: &Credentials, input: &SignupInput) -> AppResult<String> {
    validate_signup(input)?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE email = ?1",
            params![input.email],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(AppError::Conflict("User exists already".into()));
    }

    let password_hash = credentials.hash_password(&input.password)?;
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO users (id, email, password_hash, name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            input.email,
            password_hash,
            input.name,
            Utc::now().to_rfc3339()
        ],
    )?;

    Ok(id)
}

/// Verify credentials and issue a bearer token. Unknown email and wrong
/// password are both `Unauthenticated`.
pub fn login(
    conn: &Connection,
    credentials: &Credentials,
    email: &str,
    password: &str,
) -> AppResult<(String, String)> {
    let user = find_by_email(conn, email)?.ok_or(AppError::Unauthenticated)?;

    if !credentials.verify_password(password, &user.password_hash) {
        return Err(AppError::Unauthenticated);
    }

    let token = credentials.issue_token(&user.id, &user.email)?;
    Ok((token, user.id))
}

pub fn get_status(conn: &Connection, user_id: &str) -> AppResult<String> {
    let user = load_user(conn, user_id)?;
    Ok(user.status)
}

/// Update the caller's status line. Failures are surfaced like any other
/// operation rather than swallowed.
pub fn set_status(conn: &Connection, user_id: &str, status: &str) -> AppResult<()> {
    let updated = conn.execute(
        "UPDATE users SET status = ?1 WHERE id = ?2",
        params![status, user_id],
    )?;
    if updated == 0 {
        return Err(AppError::NotFound("User not found.".into()));
    }
    Ok(())
}

pub fn load_user(conn: &Connection, user_id: &str) -> AppResult<User> {
    conn.query_row(
        "SELECT id, email, password_hash, name, status, posts FROM users WHERE id = ?1",
        params![user_id],
        map_user,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("User not found.".into()))
}

pub fn find_by_email(conn: &Connection, email: &str) -> AppResult<Option<User>> {
    Ok(conn
        .query_row(
            "SELECT id, email, password_hash, name, status, posts FROM users WHERE email = ?1",
            params![email],
            map_user,
        )
        .optional()?)
}

/// Append a post id to the owner's ordered post list.
/// One half of the bidirectional user-post link; the posts row is written
/// separately, so a failure here leaves a detectable orphan (logged by the
/// caller), not a hidden one.
pub fn attach_post(conn: &Connection, user_id: &str, post_id: &str) -> AppResult<()> {
    let user = load_user(conn, user_id)?;
    let mut posts = user.posts;
    posts.push(post_id.to_string());
    save_posts(conn, user_id, &posts)
}

/// Remove a post id from the owner's post list.
pub fn detach_post(conn: &Connection, user_id: &str, post_id: &str) -> AppResult<()> {
    let user = load_user(conn, user_id)?;
    let posts: Vec<String> = user.posts.into_iter().filter(|id| id != post_id).collect();
    save_posts(conn, user_id, &posts)
}

fn save_posts(conn: &Connection, user_id: &str, posts: &[String]) -> AppResult<()> {
    let json = serde_json::to_string(posts)
        .map_err(|e| AppError::Internal(format!("failed to encode post list: {}", e)))?;
    conn.execute(
        "UPDATE users SET posts = ?1 WHERE id = ?2",
        params![json, user_id],
    )?;
    Ok(())
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    // Corrupt post-list JSON is a data error, not an empty list
    let posts_json: String = row.get(5)?;
    let posts = serde_json::from_str(&posts_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        status: row.get(4)?,
        posts,
    })
}

fn validate_signup(input: &SignupInput) -> AppResult<()> {
    let mut violations = Vec::new();

    if !is_valid_email(&input.email) {
        violations.push(FieldViolation::new("email", "E-mail is invalid."));
    }
    if input.name.trim().is_empty() {
        violations.push(FieldViolation::new("name", "Name is required."));
    }
    if input.password.len() < 5 {
        violations.push(FieldViolation::new("password", "Password too short"));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}
