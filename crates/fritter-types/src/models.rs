use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
///
/// `freets`, `quotes` and `highlights` are back-reference sets: they are kept
/// in step with the `author_id` of each post by the stores, never derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub date_joined: DateTime<Utc>,
    pub following: BTreeSet<Uuid>,
    pub freets: BTreeSet<Uuid>,
    pub quotes: BTreeSet<Uuid>,
    pub highlights: BTreeSet<Uuid>,
}

/// An original short text post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Freet {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    /// Legacy per-post flag. Highlights live on `User::highlights`.
    pub highlight: bool,
}

/// A freet joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulatedFreet {
    pub freet: Freet,
    pub author: Option<String>,
}

/// A repost of a freet.
///
/// `ref_content` is a snapshot of the quoted freet taken when the quote was
/// created. It is never rewritten, even if the freet is edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub author_id: Uuid,
    pub ref_id: Uuid,
    pub ref_author: Uuid,
    pub ref_content: String,
    pub content: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    /// Hidden from "who quoted this" lookups. Authorship is still recorded.
    pub anon: bool,
}

/// A quote joined with the usernames of its author and of the quoted author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulatedQuote {
    pub quote: Quote,
    pub author: Option<String>,
    pub ref_author: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostType {
    Freet,
    Quote,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freet => "Freet",
            Self::Quote => "Quote",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPostType(pub String);

impl fmt::Display for UnknownPostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Post type {} does not exist.", self.0)
    }
}

impl std::error::Error for UnknownPostType {}

impl FromStr for PostType {
    type Err = UnknownPostType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Freet" => Ok(Self::Freet),
            "Quote" => Ok(Self::Quote),
            other => Err(UnknownPostType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub liker: Uuid,
    pub liked: Uuid,
    pub post_type: PostType,
}

/// A user's list of free-form profile fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FritForm {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fields: Vec<String>,
}

impl FritForm {
    /// Split a comma-separated field list the way clients submit it.
    pub fn parse_fields(raw: &str) -> Vec<String> {
        raw.split(',').map(str::to_string).collect()
    }
}
