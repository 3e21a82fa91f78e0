//! Persistence for [`User`] records.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use todo_shared::UserId;

use crate::database::{timestamp_column, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::User;

impl Database {
    /// Insert a new user.
    ///
    /// The unique index on `email` makes this the only check needed: two
    /// concurrent registrations for one address cannot both succeed.
    pub fn insert_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(StoreError::Validation(
                "name and email are required".to_string(),
            ));
        }

        let user = User {
            id: UserId::new(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        let inserted = self.conn().execute(
            "INSERT INTO users (id, name, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.password_hash,
                user.created_at.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {
                tracing::debug!(user_id = %user.id, "user inserted");
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(StoreError::DuplicateEmail)
            }
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// Look a user up by exact email.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, name, email, password_hash, created_at
                 FROM users WHERE email = ?1",
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(uuid_column(row, 0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
    })
}
