//! OptimalAI storage crate - SQLite persistence for accounts and user state.
//!
//! Provides a WAL-mode SQLite database with migrations and repository
//! implementations for the `account` and `user` tables.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{AccountRepository, UserStateRepository};
