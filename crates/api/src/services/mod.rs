//! Application services that coordinate repositories and domain rules.

pub mod access;
pub mod auth;
pub mod circles;

pub use auth::{AuthError, AuthService};
pub use circles::{CircleError, CircleService};
