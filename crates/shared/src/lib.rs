//! Shared utilities for the OrderHub backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Content hashing for audit trails
//! - Spreadsheet cell/column reference handling

pub mod cell;
pub mod crypto;
