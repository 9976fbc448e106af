use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FritForm, Like, PopulatedFreet, PopulatedQuote, PostType, User};

// -- JWT Claims --

/// Claims carried by the bearer token that stands in for a login session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Users --

/// Body for both registration and login. Fields are optional so that a
/// missing one is reported by validation rather than by the JSON extractor.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub date_joined: DateTime<Utc>,
    pub following: BTreeSet<Uuid>,
    pub freets: BTreeSet<Uuid>,
    pub quotes: BTreeSet<Uuid>,
    pub highlights: BTreeSet<Uuid>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            date_joined: user.date_joined,
            following: user.following,
            freets: user.freets,
            quotes: user.quotes,
            highlights: user.highlights,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub message: String,
    pub user: Option<UserResponse>,
}

// -- Freets --

#[derive(Debug, Default, Deserialize)]
pub struct FreetContentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreetResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub author: Option<String>,
    pub content: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl From<PopulatedFreet> for FreetResponse {
    fn from(populated: PopulatedFreet) -> Self {
        let PopulatedFreet { freet, author } = populated;
        Self {
            id: freet.id,
            author,
            content: freet.content,
            date_created: freet.date_created,
            date_modified: freet.date_modified,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FreetEnvelope {
    pub message: String,
    pub freet: FreetResponse,
}

// -- Quotes --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    pub ref_id: Option<String>,
    pub content: Option<String>,
    pub anon: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateQuoteRequest {
    pub content: Option<String>,
    pub anon: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub author: Option<String>,
    pub ref_id: Uuid,
    pub ref_author: Option<String>,
    pub ref_content: String,
    pub content: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    pub anon: bool,
}

impl From<PopulatedQuote> for QuoteResponse {
    fn from(populated: PopulatedQuote) -> Self {
        let PopulatedQuote { quote, author, ref_author } = populated;
        Self {
            id: quote.id,
            author,
            ref_id: quote.ref_id,
            ref_author,
            ref_content: quote.ref_content,
            content: quote.content,
            date_created: quote.date_created,
            date_modified: quote.date_modified,
            anon: quote.anon,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteEnvelope {
    pub message: String,
    pub quote: QuoteResponse,
}

// -- Likes --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub liker: Uuid,
    pub liked: Uuid,
    pub post_type: PostType,
}

impl From<Like> for LikeResponse {
    fn from(like: Like) -> Self {
        Self {
            id: like.id,
            liker: like.liker,
            liked: like.liked,
            post_type: like.post_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeEnvelope {
    pub message: String,
    pub like: LikeResponse,
}

// -- FritForms --

#[derive(Debug, Default, Deserialize)]
pub struct FritFormRequest {
    /// Comma-separated field names.
    pub fields: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FritFormResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub fields: Vec<String>,
}

impl From<FritForm> for FritFormResponse {
    fn from(form: FritForm) -> Self {
        Self {
            id: form.id,
            user_id: form.user_id,
            fields: form.fields,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FritFormEnvelope {
    pub message: String,
    pub fritform: FritFormResponse,
}
