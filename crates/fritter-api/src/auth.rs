use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use fritter_db::Database;
use fritter_types::api::{
    AuthResponse, Claims, CredentialsRequest, MessageResponse, SessionResponse,
};
use fritter_types::models::User;

use crate::error::ApiError;
use crate::middleware::Session;
use crate::validation;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub hasher: Argon2<'static>,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String, token_ttl: chrono::Duration) -> Self {
        Self {
            db,
            jwt_secret,
            token_ttl,
            hasher: Argon2::default(),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| self.hasher.verify_password(password.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    }

    fn create_token(&self, user: &User) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            exp: (chrono::Utc::now() + self.token_ttl).timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }
}

/// Look up the session's user. A token for an account that has since been
/// deleted counts as not logged in.
pub(crate) fn current_user(state: &AppStateInner, session: &Session) -> Result<User, ApiError> {
    let user_id: Uuid = session.require()?;
    state.db.get_user_by_id(user_id)?.ok_or_else(ApiError::login_required)
}

/// POST /api/users: register and log in.
pub async fn register(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<CredentialsRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_logged_out(&state.db)?;
    let username = validation::username(req.username.as_deref())?;

    if state.db.get_user_by_username(username)?.is_some() {
        return Err(ApiError::Conflict(
            "An account with this username already exists.".into(),
        ));
    }

    let password = validation::password(req.password.as_deref())?;
    let password_hash = state.hash_password(password)?;

    let user = state.db.create_user(username, &password_hash)?;
    let token = state.create_token(&user)?;
    info!("Registered user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: format!(
                "Your account was created successfully. You have been logged in as {}",
                user.username
            ),
            user: user.into(),
            token,
        }),
    ))
}

/// POST /api/users/session
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<CredentialsRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_logged_out(&state.db)?;
    let username = validation::username(req.username.as_deref())?;
    let password = validation::password(req.password.as_deref())?;

    let invalid = || ApiError::Unauthorized("Invalid user login credentials provided.".into());

    let user = state
        .db
        .get_user_by_credentials(username, |hash| state.verify_password(password, hash))?
        .ok_or_else(invalid)?;

    let token = state.create_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "You have logged in successfully".into(),
            user: user.into(),
            token,
        }),
    ))
}

/// DELETE /api/users/session
///
/// Tokens are stateless, so this only confirms the caller was logged in; the
/// client discards its token.
pub async fn logout(Extension(session): Extension<Session>) -> Result<impl IntoResponse, ApiError> {
    session.require()?;
    Ok(Json(MessageResponse {
        message: "You have been logged out successfully.".into(),
    }))
}

/// GET /api/users/session
pub async fn current_session(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user = match session.user_id {
        Some(id) => state.db.get_user_by_id(id)?,
        None => None,
    };

    Ok(Json(SessionResponse {
        message: "Your session info was found successfully.".into(),
        user: user.map(Into::into),
    }))
}
