//! Linkshelf: a personal bookmark manager.
//!
//! Users sign in with OAuth, save links under a title, see their own list
//! newest-first, and delete entries. Authentication, storage and live change
//! delivery sit behind the traits in [`services::backend`]; the crate ships a
//! SQLite-backed implementation of them in [`services::local_backend`].
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
