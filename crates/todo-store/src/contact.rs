use chrono::Utc;
use rusqlite::params;
use todo_shared::protocol::ContactSubmission;
use todo_shared::MessageId;

use crate::database::Database;
use crate::error::Result;
use crate::models::ContactMessage;

impl Database {
    // append-only, no read or delete path
    pub fn insert_contact_message(&self, submission: &ContactSubmission) -> Result<ContactMessage> {
        let record = ContactMessage {
            id: MessageId::new(),
            name: submission.name.clone(),
            email: submission.email.clone(),
            message: submission.message.clone(),
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO contact_messages (id, name, email, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id.to_string(),
                record.name,
                record.email,
                record.message,
                record.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(message_id = %record.id, "contact message stored");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_appends() {
        let db = Database::open_in_memory().unwrap();
        let submission = ContactSubmission {
            name: "Ann".into(),
            email: "ann@x.com".into(),
            message: "Hello".into(),
        };

        let first = db.insert_contact_message(&submission).unwrap();
        let second = db.insert_contact_message(&submission).unwrap();
        assert_ne!(first.id, second.id);

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM contact_messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn empty_submission_is_stored() {
        let db = Database::open_in_memory().unwrap();
        let record = db
            .insert_contact_message(&ContactSubmission::default())
            .unwrap();
        assert!(record.message.is_empty());
    }
}
