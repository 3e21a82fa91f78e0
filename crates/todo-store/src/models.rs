//! Records persisted in the document store.
//!
//! Tasks are stored exactly in their wire shape, so the store re-exports
//! [`Task`] from `todo-shared` instead of defining a second struct.

use chrono::{DateTime, Utc};
use todo_shared::protocol::PublicUser;
use todo_shared::{MessageId, UserId};

pub use todo_shared::protocol::Task;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account. Only ever leaves the server as [`PublicUser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string; the raw password is never stored.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Contact message
// ---------------------------------------------------------------------------

/// A contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub id: MessageId,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
