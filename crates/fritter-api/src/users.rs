use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use fritter_types::api::{
    FreetResponse, MessageResponse, UpdateUserRequest, UserEnvelope, UserResponse,
};
use fritter_types::models::User;

use crate::auth::{AppState, current_user};
use crate::error::ApiError;
use crate::middleware::Session;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub author: Option<String>,
}

/// Resolve `?author=` to an existing user: 400 when blank, 404 when unknown.
pub(crate) fn require_author(state: &AppState, author: Option<&str>) -> Result<User, ApiError> {
    let name = author.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::BadRequest(
            "Provided author username must be nonempty.".into(),
        ));
    }

    state
        .db
        .get_user_by_username(name)?
        .ok_or_else(|| ApiError::NotFound(format!("A user with username {name} does not exist.")))
}

/// PATCH /api/users
pub async fn update_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateUserRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = current_user(&state, &session)?;

    let username = match req.username.as_deref() {
        Some(raw) => {
            let name = validation::username(Some(raw))?;
            // Re-casing one's own name is allowed.
            if let Some(existing) = state.db.get_user_by_username(name)? {
                if existing.id != user.id {
                    return Err(ApiError::Conflict(
                        "An account with this username already exists.".into(),
                    ));
                }
            }
            Some(name)
        }
        None => None,
    };

    let password_hash = match req.password.as_deref() {
        Some(raw) => Some(state.hash_password(validation::password(Some(raw))?)?),
        None => None,
    };

    let updated = state
        .db
        .update_user(user.id, username, password_hash.as_deref())?
        .ok_or_else(ApiError::login_required)?;

    Ok(Json(UserEnvelope {
        message: "Your profile was updated successfully.".into(),
        user: updated.into(),
    }))
}

/// DELETE /api/users: delete the account and everything it authored.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.require()?;

    let db = state.clone();
    let summary = tokio::task::spawn_blocking(move || db.db.delete_account(user_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("account deletion task failed")
        })??;

    info!(
        "Account {} deleted by owner (user row removed: {})",
        user_id, summary.user_deleted
    );

    Ok(Json(MessageResponse {
        message: "Your account has been deleted successfully.".into(),
    }))
}

/// GET /api/users/highlights?author=name
pub async fn get_highlights(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<AuthorQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let author = require_author(&state, query.author.as_deref())?;
    let highlights: Vec<FreetResponse> = state
        .db
        .find_highlights(&author.username)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(highlights))
}

fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("{raw} is not a valid post id.")))
}

/// POST /api/users/highlights/{freet_id}
pub async fn add_highlight(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(freet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.require()?;
    let freet_id = parse_post_id(&freet_id)?;

    let user = state
        .db
        .add_highlight(user_id, freet_id)?
        .ok_or_else(ApiError::login_required)?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/highlights/{freet_id}
pub async fn remove_highlight(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(freet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.require()?;
    let freet_id = parse_post_id(&freet_id)?;

    let user = state
        .db
        .remove_highlight(user_id, freet_id)?
        .ok_or_else(ApiError::login_required)?;
    Ok(Json(UserResponse::from(user)))
}

fn require_target(state: &AppState, username: &str) -> Result<User, ApiError> {
    state.db.get_user_by_username(username)?.ok_or_else(|| {
        ApiError::NotFound(format!("A user with username {username} does not exist."))
    })
}

/// POST /api/users/follow/{username}
pub async fn follow(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.require()?;
    let target = require_target(&state, &username)?;

    let user = state
        .db
        .add_following(user_id, target.id)?
        .ok_or_else(ApiError::login_required)?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/follow/{username}
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.require()?;
    let target = require_target(&state, &username)?;

    let user = state
        .db
        .remove_following(user_id, target.id)?
        .ok_or_else(ApiError::login_required)?;
    Ok(Json(UserResponse::from(user)))
}

/// GET /api/users/follow
pub async fn get_following(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user = current_user(&state, &session)?;
    Ok(Json(UserResponse::from(user)))
}
