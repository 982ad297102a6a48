//! Persistence layer for the Care Circle backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Query metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
