use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Create the tables on first run. There are no foreign keys: back-references
/// between users and posts are maintained by the stores themselves.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password    TEXT NOT NULL,
                date_joined TEXT NOT NULL,
                following   TEXT NOT NULL DEFAULT '[]',
                freets      TEXT NOT NULL DEFAULT '[]',
                quotes      TEXT NOT NULL DEFAULT '[]',
                highlights  TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE freets (
                id              TEXT PRIMARY KEY,
                author_id       TEXT NOT NULL,
                content         TEXT NOT NULL,
                date_created    TEXT NOT NULL,
                date_modified   TEXT NOT NULL,
                highlight       INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_freets_author ON freets(author_id);
            CREATE INDEX idx_freets_modified ON freets(date_modified);

            CREATE TABLE quotes (
                id              TEXT PRIMARY KEY,
                author_id       TEXT NOT NULL,
                ref_id          TEXT NOT NULL,
                ref_author      TEXT NOT NULL,
                ref_content     TEXT NOT NULL,
                content         TEXT NOT NULL,
                date_created    TEXT NOT NULL,
                date_modified   TEXT NOT NULL,
                anon            INTEGER NOT NULL
            );

            CREATE INDEX idx_quotes_author ON quotes(author_id);
            CREATE INDEX idx_quotes_ref ON quotes(ref_id);

            -- Not UNIQUE: duplicate likes are rejected by a lookup before insert.
            CREATE TABLE likes (
                id          TEXT PRIMARY KEY,
                liker       TEXT NOT NULL,
                liked       TEXT NOT NULL,
                post_type   TEXT NOT NULL
            );

            CREATE INDEX idx_likes_key ON likes(liker, liked, post_type);

            CREATE TABLE fritforms (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                fields      TEXT NOT NULL
            );

            CREATE INDEX idx_fritforms_user ON fritforms(user_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
