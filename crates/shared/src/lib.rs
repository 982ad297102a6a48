//! Shared utilities for the Care Circle backend.
//!
//! - Password hashing with Argon2id
//! - JWT issuing and validation
//! - Field validators used by request DTOs

pub mod jwt;
pub mod password;
pub mod validation;
