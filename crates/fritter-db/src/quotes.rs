use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, ToSql};
use tracing::debug;
use uuid::Uuid;

use fritter_types::models::PopulatedQuote;

use crate::Database;
use crate::cascade::PartialWrite;
use crate::models::{QUOTE_SELECT, encode_time, quote_from_row};

const NEWEST_FIRST: &str = "ORDER BY q.date_modified DESC, q.rowid DESC";

impl Database {
    /// Quote the freet `ref_id`, snapshotting its current content.
    ///
    /// Returns `Ok(None)` if the freet does not exist. Like freets, the insert
    /// and the author's quote index are separate writes.
    pub fn create_quote(
        &self,
        author_id: Uuid,
        ref_id: Uuid,
        content: &str,
        anon: bool,
    ) -> Result<Option<PopulatedQuote>> {
        let Some(referenced) = self.get_freet(ref_id)? else {
            return Ok(None);
        };

        let id = Uuid::new_v4();
        let now = encode_time(&Utc::now());

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO quotes
                    (id, author_id, ref_id, ref_author, ref_content, content, date_created, date_modified, anon)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8)",
                (
                    id.to_string(),
                    author_id.to_string(),
                    ref_id.to_string(),
                    referenced.freet.author_id.to_string(),
                    &referenced.freet.content,
                    content,
                    &now,
                    anon,
                ),
            )?;
            Ok(())
        })?;

        match self.add_user_quote(author_id, id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(PartialWrite::new("quote", id, "author quote index", None).into()),
            Err(e) => return Err(PartialWrite::new("quote", id, "author quote index", Some(e)).into()),
        }

        debug!("Created quote {} of freet {} by {}", id, ref_id, author_id);
        self.get_quote(id)
    }

    pub fn get_quote(&self, id: Uuid) -> Result<Option<PopulatedQuote>> {
        self.with_conn(|conn| {
            let sql = format!("{QUOTE_SELECT} WHERE q.id = ?1");
            let quote = conn.query_row(&sql, [id.to_string()], quote_from_row).optional()?;
            Ok(quote)
        })
    }

    pub fn find_all_quotes(&self) -> Result<Vec<PopulatedQuote>> {
        self.with_conn(|conn| query_quotes(conn, "", &[]))
    }

    pub fn find_quotes_by_author_id(&self, author_id: Uuid) -> Result<Vec<PopulatedQuote>> {
        let author = author_id.to_string();
        self.with_conn(|conn| query_quotes(conn, "WHERE q.author_id = ?1", &[&author]))
    }

    pub fn find_quotes_by_username(&self, username: &str) -> Result<Vec<PopulatedQuote>> {
        match self.get_user_by_username(username)? {
            Some(author) => self.find_quotes_by_author_id(author.id),
            None => Ok(vec![]),
        }
    }

    pub fn find_quotes_by_anon(&self, anon: bool) -> Result<Vec<PopulatedQuote>> {
        self.with_conn(|conn| query_quotes(conn, "WHERE q.anon = ?1", &[&anon]))
    }

    /// Quotes of `freet_id` that have not opted out of discovery.
    pub fn find_quotes_by_ref(&self, freet_id: Uuid) -> Result<Vec<PopulatedQuote>> {
        let freet = freet_id.to_string();
        self.with_conn(|conn| query_quotes(conn, "WHERE q.ref_id = ?1 AND q.anon = 0", &[&freet]))
    }

    /// Change content and/or the anon flag. `ref_content` is never touched.
    pub fn update_quote(
        &self,
        id: Uuid,
        content: Option<&str>,
        anon: Option<bool>,
    ) -> Result<Option<PopulatedQuote>> {
        let now = encode_time(&Utc::now());
        let changed = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE quotes
                 SET content = COALESCE(?2, content), anon = COALESCE(?3, anon), date_modified = ?4
                 WHERE id = ?1",
                (id.to_string(), content, anon, &now),
            )?;
            Ok(changed)
        })?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_quote(id)
    }

    pub fn delete_quote(&self, id: Uuid) -> Result<bool> {
        let Some(existing) = self.get_quote(id)? else {
            return Ok(false);
        };

        self.remove_user_quote(existing.quote.author_id, id)?;

        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM quotes WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }

    pub fn delete_quotes_by_author(&self, author_id: Uuid) -> Result<usize> {
        let deleted = self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM quotes WHERE author_id = ?1", [author_id.to_string()])?;
            Ok(deleted)
        })?;

        self.clear_user_quotes(author_id)
            .map_err(|e| PartialWrite::new("quotes of", author_id, "author quote index reset", Some(e)))?;
        Ok(deleted)
    }

    /// Delete every quote of `freet_id`.
    ///
    /// The quoting authors' quote indexes are not updated, so they keep ids
    /// of quotes that no longer exist.
    pub fn delete_quotes_by_ref(&self, freet_id: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM quotes WHERE ref_id = ?1", [freet_id.to_string()])?;
            Ok(deleted)
        })
    }
}

fn query_quotes(
    conn: &Connection,
    filter: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<PopulatedQuote>> {
    let sql = format!("{QUOTE_SELECT} {filter} {NEWEST_FIRST}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, quote_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn snapshot_survives_edit_of_original() {
        let db = db();
        let a = db.create_user("a", "hash").unwrap();
        let b = db.create_user("b", "hash").unwrap();
        let f = db.create_freet(a.id, "hello").unwrap();

        let q1 = db.create_quote(b.id, f.freet.id, "so true", false).unwrap().unwrap();
        assert_eq!(q1.quote.ref_content, "hello");
        assert_eq!(q1.quote.ref_author, a.id);
        assert_eq!(q1.ref_author.as_deref(), Some("a"));
        assert_eq!(q1.author.as_deref(), Some("b"));

        db.update_freet(f.freet.id, Some("goodbye")).unwrap();
        let refetched = db.get_quote(q1.quote.id).unwrap().unwrap();
        assert_eq!(refetched.quote.ref_content, "hello");

        db.delete_freet(f.freet.id).unwrap();
        let orphaned = db.get_quote(q1.quote.id).unwrap().unwrap();
        assert_eq!(orphaned.quote.ref_content, "hello");
        assert_eq!(orphaned.quote.ref_id, f.freet.id);
    }

    #[test]
    fn quoting_missing_freet_yields_none() {
        let db = db();
        let a = db.create_user("a", "hash").unwrap();
        assert!(db.create_quote(a.id, Uuid::new_v4(), "?", false).unwrap().is_none());
        assert!(db.get_user_by_id(a.id).unwrap().unwrap().quotes.is_empty());
    }

    #[test]
    fn find_by_ref_hides_anon_quotes() {
        let db = db();
        let a = db.create_user("a", "hash").unwrap();
        let b = db.create_user("b", "hash").unwrap();
        let f = db.create_freet(a.id, "original").unwrap();
        let other = db.create_freet(a.id, "other").unwrap();

        let open_b = db.create_quote(b.id, f.freet.id, "open", false).unwrap().unwrap();
        db.create_quote(b.id, f.freet.id, "hidden", true).unwrap().unwrap();
        let open_a = db.create_quote(a.id, f.freet.id, "self quote", false).unwrap().unwrap();
        db.create_quote(a.id, f.freet.id, "self hidden", true).unwrap().unwrap();
        db.create_quote(b.id, other.freet.id, "elsewhere", false).unwrap().unwrap();

        let found: HashSet<_> = db
            .find_quotes_by_ref(f.freet.id)
            .unwrap()
            .into_iter()
            .map(|q| q.quote.id)
            .collect();
        assert_eq!(found, HashSet::from([open_b.quote.id, open_a.quote.id]));

        let anon = db.find_quotes_by_anon(true).unwrap();
        assert_eq!(anon.len(), 2);
        assert!(anon.iter().all(|q| q.quote.anon));
        // Anon quotes keep their author.
        assert!(anon.iter().all(|q| q.author.is_some()));
    }

    #[test]
    fn update_changes_content_and_flag() {
        let db = db();
        let a = db.create_user("a", "hash").unwrap();
        let f = db.create_freet(a.id, "original").unwrap();
        let q = db.create_quote(a.id, f.freet.id, "v1", false).unwrap().unwrap();

        let updated = db.update_quote(q.quote.id, Some("v2"), Some(true)).unwrap().unwrap();
        assert_eq!(updated.quote.content, "v2");
        assert!(updated.quote.anon);
        assert_eq!(updated.quote.ref_content, "original");

        let unflagged = db.update_quote(q.quote.id, None, Some(false)).unwrap().unwrap();
        assert_eq!(unflagged.quote.content, "v2");
        assert!(!unflagged.quote.anon);

        assert!(db.update_quote(Uuid::new_v4(), Some("x"), None).unwrap().is_none());
    }

    #[test]
    fn delete_keeps_author_index_in_step() {
        let db = db();
        let a = db.create_user("a", "hash").unwrap();
        let f = db.create_freet(a.id, "original").unwrap();
        let q = db.create_quote(a.id, f.freet.id, "quote", false).unwrap().unwrap();
        assert!(db.get_user_by_id(a.id).unwrap().unwrap().quotes.contains(&q.quote.id));

        assert!(db.delete_quote(q.quote.id).unwrap());
        assert!(!db.delete_quote(q.quote.id).unwrap());
        assert!(db.get_user_by_id(a.id).unwrap().unwrap().quotes.is_empty());
    }

    #[test]
    fn delete_by_ref_leaves_author_indexes_stale() {
        let db = db();
        let a = db.create_user("a", "hash").unwrap();
        let b = db.create_user("b", "hash").unwrap();
        let f = db.create_freet(a.id, "original").unwrap();
        let q = db.create_quote(b.id, f.freet.id, "quote", false).unwrap().unwrap();

        assert_eq!(db.delete_quotes_by_ref(f.freet.id).unwrap(), 1);
        assert!(db.get_quote(q.quote.id).unwrap().is_none());
        assert!(db.get_user_by_id(b.id).unwrap().unwrap().quotes.contains(&q.quote.id));
    }

    #[test]
    fn find_by_username_and_delete_by_author() {
        let db = db();
        let a = db.create_user("a", "hash").unwrap();
        let b = db.create_user("b", "hash").unwrap();
        let f = db.create_freet(a.id, "original").unwrap();
        db.create_quote(b.id, f.freet.id, "one", false).unwrap().unwrap();
        db.create_quote(b.id, f.freet.id, "two", true).unwrap().unwrap();
        db.create_quote(a.id, f.freet.id, "three", false).unwrap().unwrap();

        assert_eq!(db.find_quotes_by_username("B").unwrap().len(), 2);
        assert_eq!(db.find_all_quotes().unwrap().len(), 3);

        assert_eq!(db.delete_quotes_by_author(b.id).unwrap(), 2);
        assert!(db.find_quotes_by_username("b").unwrap().is_empty());
        assert!(db.get_user_by_id(b.id).unwrap().unwrap().quotes.is_empty());
        assert_eq!(db.find_all_quotes().unwrap().len(), 1);
    }
}
