//! # todo-client
//!
//! Client side of the to-do service: a typed HTTP client for every route and
//! a [`Session`](session::Session) that holds the signed-in user and bearer
//! token, persisting both through an injected [`SessionStorage`](storage::SessionStorage).

pub mod api;
pub mod error;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_util;

pub use api::ApiClient;
pub use error::{ClientError, Result};
pub use session::Session;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
