use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;
use uuid::Uuid;

use fritter_db::Database;
use fritter_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Who is making the request, if anyone.
///
/// Inserted into every request's extensions by [`load_session`] and passed
/// explicitly to handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Session {
    pub user_id: Option<Uuid>,
}

impl Session {
    pub fn require(&self) -> Result<Uuid, ApiError> {
        self.user_id.ok_or_else(ApiError::login_required)
    }

    /// A token whose account has since been deleted counts as logged out.
    pub fn require_logged_out(&self, db: &Database) -> Result<(), ApiError> {
        match self.user_id {
            Some(id) if db.get_user_by_id(id)?.is_some() => {
                Err(ApiError::Forbidden("You are already signed in.".into()))
            }
            _ => Ok(()),
        }
    }
}

pub fn decode_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Resolve the bearer token, if any, into a [`Session`]. A missing, malformed
/// or expired token gives an anonymous session rather than an error.
pub async fn load_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let user_id = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| match decode_token(&state.jwt_secret, token) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                debug!("Ignoring invalid session token: {}", e);
                None
            }
        });

    req.extensions_mut().insert(Session { user_id });
    next.run(req).await
}
