//! Domain layer for the OrderHub backend.
//!
//! This crate contains:
//! - Domain models (channel profiles, raw rows, order records, mappings)
//! - Business logic services (field mapping, normalization, reconciliation)
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
