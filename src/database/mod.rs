//! Linkshelf database layer.
//!
//! Provides SQLite connection management and schema migrations for the local
//! backend.
//!
//! # Usage
//!
//! ```no_run
//! use linkshelf::database::Database;
//!
//! let db = Database::open("linkshelf.db").expect("failed to open database");
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
