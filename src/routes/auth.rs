use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::accounts::{self, SignupInput};
use crate::auth::AuthContext;
use crate::error::AppResult;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", put(signup))
        .route("/auth/login", post(login))
        .route("/auth/status", get(get_status).patch(set_status))
}

// -- Handlers --

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    let conn = state.db.get()?;
    let user_id = accounts::signup(
        &conn,
        &state.credentials,
        &SignupInput {
            email: req.email,
            name: req.name,
            password: req.password,
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created.", "userId": user_id })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let conn = state.db.get()?;
    let (token, user_id) = accounts::login(&conn, &state.credentials, &req.email, &req.password)?;

    Ok(Json(json!({ "token": token, "userId": user_id })))
}

async fn get_status(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> AppResult<impl IntoResponse> {
    let user_id = ctx.require()?;
    let conn = state.db.get()?;
    let status = accounts::get_status(&conn, user_id)?;

    Ok(Json(json!({ "status": status })))
}

async fn set_status(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<StatusRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = ctx.require()?;
    let conn = state.db.get()?;
    accounts::set_status(&conn, user_id, &req.status)?;

    Ok(Json(json!({ "message": "Status changed" })))
}
