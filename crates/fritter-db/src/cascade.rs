//! Cross-record consistency rules.
//!
//! The store has no transactions spanning records and no cascading deletes.
//! Every write that touches a post and its author's back-reference set is two
//! separate steps; when the second one fails the caller gets a
//! [`PartialWrite`] describing what was left behind.
//!
//! Account deletion removes the user, their freets and their quotes. It does
//! not remove their likes, likes or highlights pointing at their posts, or
//! their id in other users' `following` sets.

use anyhow::Result;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::Database;

/// The first phase of a two-phase write landed; the second did not.
#[derive(Debug, Error)]
#[error("{record} {id} was written but {pending} was not applied")]
pub struct PartialWrite {
    pub record: &'static str,
    pub id: Uuid,
    pub pending: &'static str,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PartialWrite {
    pub(crate) fn new(
        record: &'static str,
        id: Uuid,
        pending: &'static str,
        source: Option<anyhow::Error>,
    ) -> Self {
        warn!("Partial write: {} {} missing {}", record, id, pending);
        Self {
            record,
            id,
            pending,
            source: source.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountDeletion {
    pub user_deleted: bool,
    pub freets_deleted: usize,
    pub quotes_deleted: usize,
}

impl Database {
    /// Delete a user and everything they authored, in order: the user row,
    /// their freets, their quotes.
    pub fn delete_account(&self, user_id: Uuid) -> Result<AccountDeletion> {
        let user_deleted = self.delete_user(user_id)?;
        let freets_deleted = self.delete_freets_by_author(user_id)?;
        let quotes_deleted = self.delete_quotes_by_author(user_id)?;

        info!(
            "Deleted account {} ({} freets, {} quotes)",
            user_id, freets_deleted, quotes_deleted
        );
        Ok(AccountDeletion {
            user_deleted,
            freets_deleted,
            quotes_deleted,
        })
    }
}
