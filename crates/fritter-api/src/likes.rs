use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use fritter_types::api::{LikeEnvelope, MessageResponse};
use fritter_types::models::PostType;

use crate::auth::{AppState, current_user};
use crate::error::ApiError;
use crate::middleware::Session;

/// Validate the post type and check the post exists.
fn require_post(state: &AppState, raw_type: &str, raw_id: &str) -> Result<(PostType, Uuid), ApiError> {
    let post_type: PostType = raw_type
        .parse()
        .map_err(|e: fritter_types::models::UnknownPostType| ApiError::BadRequest(e.to_string()))?;

    let missing = || ApiError::NotFound(format!("{post_type} with ID {raw_id} does not exist."));
    let post_id: Uuid = raw_id.parse().map_err(|_| missing())?;

    let exists = match post_type {
        PostType::Freet => state.db.get_freet(post_id)?.is_some(),
        PostType::Quote => state.db.get_quote(post_id)?.is_some(),
    };
    if !exists {
        return Err(missing());
    }

    Ok((post_type, post_id))
}

/// POST /api/likes/{post_type}/{post_id}
pub async fn like_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((post_type, post_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = current_user(&state, &session)?.id;
    let (post_type, post_id) = require_post(&state, &post_type, &post_id)?;

    if state.db.find_like(user_id, post_id, post_type)?.is_some() {
        return Err(ApiError::Conflict("You have already liked this post.".into()));
    }

    let like = state.db.create_like(user_id, post_id, post_type)?;

    Ok((
        StatusCode::CREATED,
        Json(LikeEnvelope {
            message: "Your like was created successfully.".into(),
            like: like.into(),
        }),
    ))
}

/// DELETE /api/likes/{post_type}/{post_id}
pub async fn unlike_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((post_type, post_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = current_user(&state, &session)?.id;
    let (post_type, post_id) = require_post(&state, &post_type, &post_id)?;

    let like = state
        .db
        .find_like(user_id, post_id, post_type)?
        .ok_or_else(|| ApiError::Forbidden("You have not liked this post yet.".into()))?;
    state.db.delete_like(like.id)?;

    Ok(Json(MessageResponse {
        message: "Your like was deleted successfully.".into(),
    }))
}
