use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use fritter_types::api::{
    FreetContentRequest, FreetEnvelope, FreetResponse, MessageResponse, QuoteResponse,
};
use fritter_types::models::PopulatedFreet;

use crate::auth::{AppState, current_user};
use crate::error::ApiError;
use crate::middleware::Session;
use crate::users::{AuthorQuery, require_author};
use crate::validation;

/// Look up a freet by its path id. Unparseable ids are reported as missing.
pub(crate) fn require_freet(state: &AppState, raw_id: &str) -> Result<PopulatedFreet, ApiError> {
    let missing = || ApiError::NotFound(format!("Freet with freet ID {raw_id} does not exist."));
    let id = raw_id.parse().map_err(|_| missing())?;
    state.db.get_freet(id)?.ok_or_else(missing)
}

/// Fetch the freet and check the session user wrote it.
fn require_own_freet(
    state: &AppState,
    session: &Session,
    raw_id: &str,
) -> Result<PopulatedFreet, ApiError> {
    let user_id = session.require()?;
    let freet = require_freet(state, raw_id)?;
    if freet.freet.author_id != user_id {
        return Err(ApiError::Forbidden("Cannot modify other users' freets.".into()));
    }
    Ok(freet)
}

fn responses(freets: Vec<PopulatedFreet>) -> Vec<FreetResponse> {
    freets.into_iter().map(Into::into).collect()
}

/// GET /api/freets[?author=name], newest edit first.
pub async fn list_freets(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<AuthorQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let freets = match query.author.as_deref() {
        Some(author) => {
            let author = require_author(&state, Some(author))?;
            state.db.find_freets_by_author_id(author.id)?
        }
        None => state.db.find_all_freets()?,
    };
    Ok(Json(responses(freets)))
}

/// POST /api/freets
pub async fn create_freet(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<FreetContentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let author = current_user(&state, &session)?;
    let content = req.content.unwrap_or_default();
    validation::content("Freet", &content)?;

    let freet = state.db.create_freet(author.id, &content)?;

    Ok((
        StatusCode::CREATED,
        Json(FreetEnvelope {
            message: "Your freet was created successfully.".into(),
            freet: freet.into(),
        }),
    ))
}

/// PUT /api/freets/{freet_id}
pub async fn update_freet(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(freet_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<FreetContentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = require_own_freet(&state, &session, &freet_id)?;
    if let Some(content) = req.content.as_deref() {
        validation::content("Freet", content)?;
    }

    let freet = state
        .db
        .update_freet(existing.freet.id, req.content.as_deref())?
        .ok_or_else(|| ApiError::NotFound(format!("Freet with freet ID {freet_id} does not exist.")))?;

    Ok(Json(FreetEnvelope {
        message: "Your freet was updated successfully.".into(),
        freet: freet.into(),
    }))
}

/// DELETE /api/freets/{freet_id}
///
/// Quotes of the freet are kept, snapshot and dangling `refId` included.
pub async fn delete_freet(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(freet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = require_own_freet(&state, &session, &freet_id)?;
    state.db.delete_freet(existing.freet.id)?;

    Ok(Json(MessageResponse {
        message: "Your freet was deleted successfully.".into(),
    }))
}

/// GET /api/freets/{freet_id}/quotes: non-anonymous quotes of this freet.
pub async fn list_freet_quotes(
    State(state): State<AppState>,
    Path(freet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let freet = require_freet(&state, &freet_id)?;
    let quotes: Vec<QuoteResponse> = state
        .db
        .find_quotes_by_ref(freet.freet.id)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(quotes))
}
