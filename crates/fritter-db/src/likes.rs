use anyhow::Result;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use fritter_types::models::{Like, PostType};

use crate::Database;
use crate::models::{LIKE_COLUMNS, like_from_row};

impl Database {
    /// Insert a like. Callers check [`Database::find_like`] first; the table
    /// itself accepts duplicates.
    pub fn create_like(&self, liker: Uuid, liked: Uuid, post_type: PostType) -> Result<Like> {
        let like = Like {
            id: Uuid::new_v4(),
            liker,
            liked,
            post_type,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO likes (id, liker, liked, post_type) VALUES (?1, ?2, ?3, ?4)",
                (
                    like.id.to_string(),
                    liker.to_string(),
                    liked.to_string(),
                    post_type.as_str(),
                ),
            )?;
            Ok(())
        })?;

        Ok(like)
    }

    pub fn get_like(&self, id: Uuid) -> Result<Option<Like>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {LIKE_COLUMNS} FROM likes WHERE id = ?1");
            let like = conn.query_row(&sql, [id.to_string()], like_from_row).optional()?;
            Ok(like)
        })
    }

    /// Look up by `(liker, liked, post_type)`.
    pub fn find_like(&self, liker: Uuid, liked: Uuid, post_type: PostType) -> Result<Option<Like>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {LIKE_COLUMNS} FROM likes WHERE liker = ?1 AND liked = ?2 AND post_type = ?3 LIMIT 1"
            );
            let like = conn
                .query_row(
                    &sql,
                    (liker.to_string(), liked.to_string(), post_type.as_str()),
                    like_from_row,
                )
                .optional()?;
            Ok(like)
        })
    }

    pub fn delete_like(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM likes WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}
