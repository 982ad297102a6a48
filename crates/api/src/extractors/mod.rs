//! Custom Axum extractors.

pub mod user_auth;
pub mod validated;

pub use crate::middleware::user_auth::UserAuth;
pub use user_auth::CircleMember;
pub use validated::{ValidJson, ValidPath, ValidQuery};
