use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use fritter_types::models::FritForm;

use crate::Database;
use crate::models::fritform_from_row;

impl Database {
    pub fn create_fritform(&self, user_id: Uuid, fields: Vec<String>) -> Result<FritForm> {
        let form = FritForm {
            id: Uuid::new_v4(),
            user_id,
            fields,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO fritforms (id, user_id, fields) VALUES (?1, ?2, ?3)",
                (
                    form.id.to_string(),
                    user_id.to_string(),
                    serde_json::to_string(&form.fields)?,
                ),
            )?;
            Ok(())
        })?;

        Ok(form)
    }

    pub fn get_fritform(&self, id: Uuid) -> Result<Option<FritForm>> {
        self.with_conn(|conn| query_fritform(conn, "id", id))
    }

    pub fn get_fritform_by_user(&self, user_id: Uuid) -> Result<Option<FritForm>> {
        self.with_conn(|conn| query_fritform(conn, "user_id", user_id))
    }

    /// Replace the field list if given. Returns `None` if the form is gone.
    pub fn update_fritform(&self, id: Uuid, fields: Option<Vec<String>>) -> Result<Option<FritForm>> {
        self.with_conn(|conn| {
            if let Some(fields) = fields {
                conn.execute(
                    "UPDATE fritforms SET fields = ?2 WHERE id = ?1",
                    (id.to_string(), serde_json::to_string(&fields)?),
                )?;
            }
            query_fritform(conn, "id", id)
        })
    }

    pub fn delete_fritform(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM fritforms WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}

fn query_fritform(conn: &Connection, column: &str, id: Uuid) -> Result<Option<FritForm>> {
    let sql = format!("SELECT id, user_id, fields FROM fritforms WHERE {column} = ?1 LIMIT 1");
    let form = conn.query_row(&sql, [id.to_string()], fritform_from_row).optional()?;
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("alice", "hash").unwrap();

        let form = db
            .create_fritform(user.id, FritForm::parse_fields("bio,pronouns"))
            .unwrap();
        let by_user = db.get_fritform_by_user(user.id).unwrap().unwrap();
        assert_eq!(by_user.id, form.id);
        assert_eq!(by_user.fields, vec!["bio", "pronouns"]);

        let unchanged = db.update_fritform(form.id, None).unwrap().unwrap();
        assert_eq!(unchanged.fields, vec!["bio", "pronouns"]);

        let updated = db
            .update_fritform(form.id, Some(FritForm::parse_fields("site")))
            .unwrap()
            .unwrap();
        assert_eq!(updated.fields, vec!["site"]);

        assert!(db.delete_fritform(form.id).unwrap());
        assert!(db.get_fritform(form.id).unwrap().is_none());
        assert!(db.get_fritform_by_user(user.id).unwrap().is_none());
        assert!(db.update_fritform(form.id, None).unwrap().is_none());
    }
}
