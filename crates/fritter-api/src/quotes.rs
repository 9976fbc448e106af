use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use uuid::Uuid;

use fritter_types::api::{
    CreateQuoteRequest, MessageResponse, QuoteEnvelope, QuoteResponse, UpdateQuoteRequest,
};
use fritter_types::models::PopulatedQuote;

use crate::auth::{AppState, current_user};
use crate::error::ApiError;
use crate::middleware::Session;
use crate::users::require_author;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub author: Option<String>,
    pub anon: Option<bool>,
}

fn require_quote(state: &AppState, raw_id: &str) -> Result<PopulatedQuote, ApiError> {
    let missing = || ApiError::NotFound(format!("Quote freet with ID {raw_id} does not exist."));
    let id = raw_id.parse().map_err(|_| missing())?;
    state.db.get_quote(id)?.ok_or_else(missing)
}

fn require_own_quote(
    state: &AppState,
    session: &Session,
    raw_id: &str,
) -> Result<PopulatedQuote, ApiError> {
    let user_id = session.require()?;
    let quote = require_quote(state, raw_id)?;
    if quote.quote.author_id != user_id {
        return Err(ApiError::Forbidden(
            "Cannot modify other users' quote freets.".into(),
        ));
    }
    Ok(quote)
}

/// GET /api/quotes[?author=name][&anon=bool]
pub async fn list_quotes(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<QuoteQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let quotes: Vec<PopulatedQuote> = match (query.author.as_deref(), query.anon) {
        (Some(author), anon) => {
            let author = require_author(&state, Some(author))?;
            state
                .db
                .find_quotes_by_author_id(author.id)?
                .into_iter()
                .filter(|q| anon.is_none_or(|flag| q.quote.anon == flag))
                .collect()
        }
        (None, Some(anon)) => state.db.find_quotes_by_anon(anon)?,
        (None, None) => state.db.find_all_quotes()?,
    };

    let quotes: Vec<QuoteResponse> = quotes.into_iter().map(Into::into).collect();
    Ok(Json(quotes))
}

/// POST /api/quotes
pub async fn create_quote(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<CreateQuoteRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let author = current_user(&state, &session)?;

    let content = req.content.unwrap_or_default();
    validation::content("Quote freet", &content)?;

    let raw_ref = req
        .ref_id
        .ok_or_else(|| ApiError::BadRequest("The quoted freet's refId must be provided.".into()))?;
    let anon = req
        .anon
        .ok_or_else(|| ApiError::BadRequest("The anon flag must be provided.".into()))?;

    let missing = || ApiError::NotFound(format!("Freet with freet ID {raw_ref} does not exist."));
    let ref_id: Uuid = raw_ref.parse().map_err(|_| missing())?;

    let quote = state
        .db
        .create_quote(author.id, ref_id, &content, anon)?
        .ok_or_else(missing)?;

    Ok((
        StatusCode::CREATED,
        Json(QuoteEnvelope {
            message: "Your quote was created successfully.".into(),
            quote: quote.into(),
        }),
    ))
}

/// PUT /api/quotes/{quote_id}
pub async fn update_quote(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(quote_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateQuoteRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = require_own_quote(&state, &session, &quote_id)?;
    if let Some(content) = req.content.as_deref() {
        validation::content("Quote freet", content)?;
    }

    let quote = state
        .db
        .update_quote(existing.quote.id, req.content.as_deref(), req.anon)?
        .ok_or_else(|| ApiError::NotFound(format!("Quote freet with ID {quote_id} does not exist.")))?;

    Ok(Json(QuoteEnvelope {
        message: "Your quote was updated successfully.".into(),
        quote: quote.into(),
    }))
}

/// DELETE /api/quotes/{quote_id}
pub async fn delete_quote(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(quote_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = require_own_quote(&state, &session, &quote_id)?;
    state.db.delete_quote(existing.quote.id)?;

    Ok(Json(MessageResponse {
        message: "Your quote was deleted successfully.".into(),
    }))
}
