//! Persistence layer for the OrderHub backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - SQL migrations (embedded via `sqlx::migrate!`)

pub mod db;
pub mod entities;
pub mod repositories;
