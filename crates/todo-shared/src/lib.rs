//! # todo-shared
//!
//! Types shared by the server and the client: the JSON wire shapes of the REST
//! API, strongly typed identifiers, session tokens and password hashing.

pub mod constants;
pub mod error;
pub mod password;
pub mod protocol;
pub mod token;
pub mod types;

pub use error::{PasswordError, TokenError};
pub use types::{MessageId, TaskId, UserId};
