use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use fritter_types::models::PopulatedFreet;

use crate::Database;
use crate::cascade::PartialWrite;
use crate::models::{FREET_SELECT, encode_time, freet_from_row};

impl Database {
    /// Insert a freet, then index it under its author.
    ///
    /// The two steps are separate writes. If indexing fails (or the author is
    /// gone) the freet stays in the table and a [`PartialWrite`] is returned.
    pub fn create_freet(&self, author_id: Uuid, content: &str) -> Result<PopulatedFreet> {
        let id = Uuid::new_v4();
        let now = encode_time(&Utc::now());

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO freets (id, author_id, content, date_created, date_modified, highlight)
                 VALUES (?1, ?2, ?3, ?4, ?4, 0)",
                (id.to_string(), author_id.to_string(), content, &now),
            )?;
            Ok(())
        })?;

        match self.add_user_freet(author_id, id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(PartialWrite::new("freet", id, "author freet index", None).into()),
            Err(e) => return Err(PartialWrite::new("freet", id, "author freet index", Some(e)).into()),
        }

        debug!("Created freet {} by {}", id, author_id);
        self.get_freet(id)?
            .ok_or_else(|| anyhow::anyhow!("Freet {} vanished after insert", id))
    }

    pub fn get_freet(&self, id: Uuid) -> Result<Option<PopulatedFreet>> {
        self.with_conn(|conn| query_freet(conn, id))
    }

    /// Every freet, most recently modified first.
    pub fn find_all_freets(&self) -> Result<Vec<PopulatedFreet>> {
        self.with_conn(|conn| {
            let sql = format!("{FREET_SELECT} ORDER BY f.date_modified DESC, f.rowid DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], freet_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn find_freets_by_author_id(&self, author_id: Uuid) -> Result<Vec<PopulatedFreet>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{FREET_SELECT} WHERE f.author_id = ?1 ORDER BY f.date_modified DESC, f.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([author_id.to_string()], freet_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Resolve `username` to an id, then list that author's freets.
    /// An unknown username yields an empty list.
    pub fn find_freets_by_username(&self, username: &str) -> Result<Vec<PopulatedFreet>> {
        match self.get_user_by_username(username)? {
            Some(author) => self.find_freets_by_author_id(author.id),
            None => Ok(vec![]),
        }
    }

    /// Replace the content if given; `date_modified` is refreshed either way.
    pub fn update_freet(&self, id: Uuid, content: Option<&str>) -> Result<Option<PopulatedFreet>> {
        let now = encode_time(&Utc::now());
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE freets SET content = COALESCE(?2, content), date_modified = ?3 WHERE id = ?1",
                (id.to_string(), content, &now),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_freet(conn, id)
        })
    }

    /// Unindex the freet from its author, then delete it. Returns `false` if
    /// there was no such freet.
    pub fn delete_freet(&self, id: Uuid) -> Result<bool> {
        let Some(existing) = self.get_freet(id)? else {
            return Ok(false);
        };

        self.remove_user_freet(existing.freet.author_id, id)?;

        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM freets WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }

    /// Bulk-delete an author's freets, then empty their freet index.
    pub fn delete_freets_by_author(&self, author_id: Uuid) -> Result<usize> {
        let deleted = self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM freets WHERE author_id = ?1", [author_id.to_string()])?;
            Ok(deleted)
        })?;

        self.clear_user_freets(author_id)
            .map_err(|e| PartialWrite::new("freets of", author_id, "author freet index reset", Some(e)))?;
        Ok(deleted)
    }
}

fn query_freet(conn: &Connection, id: Uuid) -> Result<Option<PopulatedFreet>> {
    let sql = format!("{FREET_SELECT} WHERE f.id = ?1");
    let freet = conn.query_row(&sql, [id.to_string()], freet_from_row).optional()?;
    Ok(freet)
}
