//! # todo-store
//!
//! Document storage for the to-do service, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed operations for users, tasks and
//! contact messages. Every operation is a single statement, so SQLite's
//! per-statement atomicity is the only transactional guarantee.

pub mod contact;
pub mod database;
pub mod migrations;
pub mod models;
pub mod tasks;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
