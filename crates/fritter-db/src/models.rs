//! Mapping between SQLite rows and `fritter_types` models.
//!
//! Ids are stored as hyphenated UUID text, timestamps as fixed-width RFC 3339
//! (microseconds, `Z`) so that `ORDER BY` on the text column is chronological,
//! and id-sets as JSON arrays.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use fritter_types::models::{
    Freet, FritForm, Like, PopulatedFreet, PopulatedQuote, PostType, Quote, User,
};

pub(crate) const USER_COLUMNS: &str =
    "id, username, password, date_joined, following, freets, quotes, highlights";

pub(crate) const FREET_SELECT: &str =
    "SELECT f.id, f.author_id, u.username, f.content, f.date_created, f.date_modified, f.highlight
     FROM freets f
     LEFT JOIN users u ON f.author_id = u.id";

pub(crate) const QUOTE_SELECT: &str =
    "SELECT q.id, q.author_id, a.username, q.ref_id, q.ref_author, r.username, q.ref_content,
            q.content, q.date_created, q.date_modified, q.anon
     FROM quotes q
     LEFT JOIN users a ON q.author_id = a.id
     LEFT JOIN users r ON q.ref_author = r.id";

pub(crate) const LIKE_COLUMNS: &str = "id, liker, liked, post_type";

pub(crate) fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn encode_set(set: &BTreeSet<Uuid>) -> String {
    // A set of UUIDs always serializes
    serde_json::to_string(set).unwrap_or_else(|_| "[]".to_string())
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn uuid_at(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn time_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn set_at(row: &Row, idx: usize) -> rusqlite::Result<BTreeSet<Uuid>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

/// Expects the column order of [`USER_COLUMNS`].
pub(crate) fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        date_joined: time_at(row, 3)?,
        following: set_at(row, 4)?,
        freets: set_at(row, 5)?,
        quotes: set_at(row, 6)?,
        highlights: set_at(row, 7)?,
    })
}

/// Expects the column order of [`FREET_SELECT`].
pub(crate) fn freet_from_row(row: &Row) -> rusqlite::Result<PopulatedFreet> {
    Ok(PopulatedFreet {
        freet: Freet {
            id: uuid_at(row, 0)?,
            author_id: uuid_at(row, 1)?,
            content: row.get(3)?,
            date_created: time_at(row, 4)?,
            date_modified: time_at(row, 5)?,
            highlight: row.get(6)?,
        },
        author: row.get(2)?,
    })
}

/// Expects the column order of [`QUOTE_SELECT`].
pub(crate) fn quote_from_row(row: &Row) -> rusqlite::Result<PopulatedQuote> {
    Ok(PopulatedQuote {
        quote: Quote {
            id: uuid_at(row, 0)?,
            author_id: uuid_at(row, 1)?,
            ref_id: uuid_at(row, 3)?,
            ref_author: uuid_at(row, 4)?,
            ref_content: row.get(6)?,
            content: row.get(7)?,
            date_created: time_at(row, 8)?,
            date_modified: time_at(row, 9)?,
            anon: row.get(10)?,
        },
        author: row.get(2)?,
        ref_author: row.get(5)?,
    })
}

/// Expects the column order of [`LIKE_COLUMNS`].
pub(crate) fn like_from_row(row: &Row) -> rusqlite::Result<Like> {
    let raw_type: String = row.get(3)?;
    Ok(Like {
        id: uuid_at(row, 0)?,
        liker: uuid_at(row, 1)?,
        liked: uuid_at(row, 2)?,
        post_type: raw_type.parse::<PostType>().map_err(|e| conversion_error(3, e))?,
    })
}

pub(crate) fn fritform_from_row(row: &Row) -> rusqlite::Result<FritForm> {
    let raw_fields: String = row.get(2)?;
    Ok(FritForm {
        id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        fields: serde_json::from_str(&raw_fields).map_err(|e| conversion_error(2, e))?,
    })
}
