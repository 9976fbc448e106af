use std::collections::BTreeSet;

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use fritter_types::models::{PopulatedFreet, User};

use crate::Database;
use crate::models::{USER_COLUMNS, encode_set, encode_time, user_from_row};

/// The id-set columns on a user row.
#[derive(Debug, Clone, Copy)]
enum UserSet {
    Following,
    Freets,
    Quotes,
    Highlights,
}

impl UserSet {
    fn column(self) -> &'static str {
        match self {
            Self::Following => "following",
            Self::Freets => "freets",
            Self::Quotes => "quotes",
            Self::Highlights => "highlights",
        }
    }

    fn of(self, user: &mut User) -> &mut BTreeSet<Uuid> {
        match self {
            Self::Following => &mut user.following,
            Self::Freets => &mut user.freets,
            Self::Quotes => &mut user.quotes,
            Self::Highlights => &mut user.highlights,
        }
    }
}

impl Database {
    // -- Records --

    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password: password_hash.to_string(),
            date_joined: Utc::now(),
            following: BTreeSet::new(),
            freets: BTreeSet::new(),
            quotes: BTreeSet::new(),
            highlights: BTreeSet::new(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, date_joined) VALUES (?1, ?2, ?3, ?4)",
                (
                    user.id.to_string(),
                    &user.username,
                    &user.password,
                    encode_time(&user.date_joined),
                ),
            )?;
            Ok(())
        })?;

        debug!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Case-insensitive lookup on the trimmed name. A blank name matches nobody.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(None);
        }

        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 COLLATE NOCASE");
            let user = conn.query_row(&sql, [username], user_from_row).optional()?;
            Ok(user)
        })
    }

    /// Credential lookup. The stored value is a password hash, so the caller
    /// supplies `verify` to check the candidate password against it.
    pub fn get_user_by_credentials<F>(&self, username: &str, verify: F) -> Result<Option<User>>
    where
        F: FnOnce(&str) -> bool,
    {
        Ok(self
            .get_user_by_username(username)?
            .filter(|user| verify(&user.password)))
    }

    /// Change username and/or password hash. Returns `None` if the user is gone.
    pub fn update_user(
        &self,
        id: Uuid,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET username = COALESCE(?2, username), password = COALESCE(?3, password)
                 WHERE id = ?1",
                (id.to_string(), username, password_hash),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user_by_id(conn, id)
        })
    }

    /// Removes only the user row. Posts, likes and other users' references to
    /// this user are left alone; see [`Database::delete_account`].
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }

    // -- Id-sets --

    pub fn add_following(&self, user_id: Uuid, target_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Following, |set| {
            set.insert(target_id);
        })
    }

    pub fn remove_following(&self, user_id: Uuid, target_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Following, |set| {
            set.remove(&target_id);
        })
    }

    pub fn add_user_freet(&self, user_id: Uuid, freet_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Freets, |set| {
            set.insert(freet_id);
        })
    }

    pub fn remove_user_freet(&self, user_id: Uuid, freet_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Freets, |set| {
            set.remove(&freet_id);
        })
    }

    pub fn clear_user_freets(&self, user_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Freets, BTreeSet::clear)
    }

    pub fn add_user_quote(&self, user_id: Uuid, quote_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Quotes, |set| {
            set.insert(quote_id);
        })
    }

    pub fn remove_user_quote(&self, user_id: Uuid, quote_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Quotes, |set| {
            set.remove(&quote_id);
        })
    }

    pub fn clear_user_quotes(&self, user_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Quotes, BTreeSet::clear)
    }

    /// No check is made that the post exists.
    pub fn add_highlight(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Highlights, |set| {
            set.insert(post_id);
        })
    }

    pub fn remove_highlight(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<User>> {
        self.mutate_set(user_id, UserSet::Highlights, |set| {
            set.remove(&post_id);
        })
    }

    /// Freets by `username` whose ids are in that user's highlight set.
    ///
    /// Reads the full set, then the user's freets, and intersects in memory.
    pub fn find_highlights(&self, username: &str) -> Result<Vec<PopulatedFreet>> {
        let Some(user) = self.get_user_by_username(username)? else {
            return Ok(vec![]);
        };

        let freets = self.find_freets_by_author_id(user.id)?;
        Ok(freets
            .into_iter()
            .filter(|f| user.highlights.contains(&f.freet.id))
            .collect())
    }

    /// Read-modify-write of one id-set while holding the connection lock.
    /// A missing user is a no-op that yields `None`.
    fn mutate_set<F>(&self, user_id: Uuid, which: UserSet, f: F) -> Result<Option<User>>
    where
        F: FnOnce(&mut BTreeSet<Uuid>),
    {
        self.with_conn(|conn| {
            let Some(mut user) = query_user_by_id(conn, user_id)? else {
                return Ok(None);
            };

            let set = which.of(&mut user);
            f(set);

            let sql = format!("UPDATE users SET {} = ?2 WHERE id = ?1", which.column());
            conn.execute(&sql, (user_id.to_string(), encode_set(set)))?;
            Ok(Some(user))
        })
    }
}

fn query_user_by_id(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let user = conn.query_row(&sql, [id.to_string()], user_from_row).optional()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn username_lookup_ignores_case_and_padding() {
        let db = db();
        let alice = db.create_user("Alice", "hash").unwrap();

        for probe in ["Alice", " alice ", "ALICE", "aLiCe\t"] {
            let found = db.get_user_by_username(probe).unwrap().unwrap();
            assert_eq!(found.id, alice.id);
            assert_eq!(found.username, "Alice");
        }
        assert!(db.get_user_by_username("   ").unwrap().is_none());
        assert!(db.get_user_by_username("alicia").unwrap().is_none());
    }

    #[test]
    fn credential_lookup_defers_to_verifier() {
        let db = db();
        let user = db.create_user("Dana", "stored-hash").unwrap();

        let found = db
            .get_user_by_credentials("dana", |hash| hash == "stored-hash")
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(db.get_user_by_credentials("dana", |_| false).unwrap().is_none());
        assert!(db.get_user_by_credentials("nobody", |_| true).unwrap().is_none());
    }

    #[test]
    fn new_user_has_empty_sets() {
        let db = db();
        let user = db.create_user("bob", "hash").unwrap();
        let stored = db.get_user_by_id(user.id).unwrap().unwrap();
        assert!(stored.following.is_empty());
        assert!(stored.freets.is_empty());
        assert!(stored.quotes.is_empty());
        assert!(stored.highlights.is_empty());
        assert_eq!(stored.password, "hash");
    }

    #[test]
    fn usernames_are_unique_regardless_of_case() {
        let db = db();
        db.create_user("carol", "hash").unwrap();
        assert!(db.create_user("CAROL", "hash").is_err());
    }

    #[test]
    fn update_is_partial() {
        let db = db();
        let user = db.create_user("dave", "old").unwrap();

        let renamed = db.update_user(user.id, Some("david"), None).unwrap().unwrap();
        assert_eq!(renamed.username, "david");
        assert_eq!(renamed.password, "old");

        let rekeyed = db.update_user(user.id, None, Some("new")).unwrap().unwrap();
        assert_eq!(rekeyed.username, "david");
        assert_eq!(rekeyed.password, "new");

        assert!(db.update_user(Uuid::new_v4(), Some("x"), None).unwrap().is_none());
    }

    #[test]
    fn set_mutations_are_idempotent() {
        let db = db();
        let user = db.create_user("erin", "hash").unwrap();
        let other = Uuid::new_v4();

        db.add_following(user.id, other).unwrap();
        let twice = db.add_following(user.id, other).unwrap().unwrap();
        assert_eq!(twice.following.len(), 1);

        let removed = db.remove_following(user.id, other).unwrap().unwrap();
        assert!(removed.following.is_empty());
        let again = db.remove_following(user.id, other).unwrap().unwrap();
        assert!(again.following.is_empty());

        db.add_highlight(user.id, other).unwrap();
        db.add_highlight(user.id, other).unwrap();
        let stored = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(stored.highlights.iter().collect::<Vec<_>>(), vec![&other]);
    }

    #[test]
    fn set_mutation_on_missing_user_is_noop() {
        let db = db();
        assert!(db.add_highlight(Uuid::new_v4(), Uuid::new_v4()).unwrap().is_none());
        assert!(db.clear_user_quotes(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn delete_user_does_not_cascade() {
        let db = db();
        let user = db.create_user("frank", "hash").unwrap();
        let freet = db.create_freet(user.id, "still here").unwrap();

        assert!(db.delete_user(user.id).unwrap());
        assert!(!db.delete_user(user.id).unwrap());
        assert!(db.get_freet(freet.freet.id).unwrap().is_some());
    }

    #[test]
    fn highlights_are_intersection_of_set_and_own_freets() {
        let db = db();
        let user = db.create_user("gina", "hash").unwrap();
        let other = db.create_user("hank", "hash").unwrap();
        let kept = db.create_freet(user.id, "pin me").unwrap();
        db.create_freet(user.id, "not pinned").unwrap();
        let foreign = db.create_freet(other.id, "someone else's").unwrap();

        db.add_highlight(user.id, kept.freet.id).unwrap();
        db.add_highlight(user.id, foreign.freet.id).unwrap();
        db.add_highlight(user.id, Uuid::new_v4()).unwrap();

        let highlights = db.find_highlights("GINA").unwrap();
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].freet.id, kept.freet.id);
        assert_eq!(highlights[0].author.as_deref(), Some("gina"));

        assert!(db.find_highlights("nobody").unwrap().is_empty());
    }
}
