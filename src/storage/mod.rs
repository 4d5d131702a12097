//! Storage Layer - SQLite-backed persistence
//!
//! One table per schema, named after the schema, with an autoincrement
//! `id` primary key followed by the schema's columns in name order.

pub mod database;
pub mod hydrate;

pub use database::Database;
