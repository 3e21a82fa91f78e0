//! # todo-server
//!
//! HTTP API for the multi-user to-do service: account registration and
//! login, per-user task CRUD, and an append-only contact form.

pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
