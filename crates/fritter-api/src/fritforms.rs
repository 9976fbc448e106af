use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use fritter_types::api::{FritFormEnvelope, FritFormRequest, FritFormResponse, MessageResponse};
use fritter_types::models::FritForm;

use crate::auth::{AppState, current_user};
use crate::error::ApiError;
use crate::middleware::Session;

fn require_own_form(state: &AppState, user_id: Uuid) -> Result<FritForm, ApiError> {
    state
        .db
        .get_fritform_by_user(user_id)?
        .ok_or_else(|| ApiError::NotFound("You have not set up a FritForm yet.".into()))
}

/// GET /api/fritforms
pub async fn get_fritform(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let form = require_own_form(&state, session.require()?)?;
    Ok(Json(FritFormResponse::from(form)))
}

/// POST /api/fritforms
pub async fn create_fritform(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<FritFormRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = current_user(&state, &session)?;
    let fields = req
        .fields
        .ok_or_else(|| ApiError::BadRequest("FritForm fields must be provided.".into()))?;

    if state.db.get_fritform_by_user(user.id)?.is_some() {
        return Err(ApiError::Conflict("You already have a FritForm.".into()));
    }

    let form = state.db.create_fritform(user.id, FritForm::parse_fields(&fields))?;

    Ok((
        StatusCode::CREATED,
        Json(FritFormEnvelope {
            message: "Your FritForm was created successfully.".into(),
            fritform: form.into(),
        }),
    ))
}

/// PUT /api/fritforms
pub async fn update_fritform(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<FritFormRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = require_own_form(&state, session.require()?)?;
    let fields = req.fields.as_deref().map(FritForm::parse_fields);

    let form = state
        .db
        .update_fritform(existing.id, fields)?
        .ok_or_else(|| ApiError::NotFound("You have not set up a FritForm yet.".into()))?;

    Ok(Json(FritFormEnvelope {
        message: "Your fritform was updated successfully.".into(),
        fritform: form.into(),
    }))
}

/// DELETE /api/fritforms
pub async fn delete_fritform(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = require_own_form(&state, session.require()?)?;
    state.db.delete_fritform(existing.id)?;

    Ok(Json(MessageResponse {
        message: "Your fritform has been deleted successfully.".into(),
    }))
}
