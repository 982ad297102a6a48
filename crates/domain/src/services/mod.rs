//! Domain services for Care Circle.
//!
//! Pure rules over domain models. Storage and transport live elsewhere.

pub mod access;
pub mod invite_code;
pub mod membership;

pub use access::{authorize, AccessDenied, AccessLevel};
pub use invite_code::{generate_invite_code, is_well_formed, normalize_invite_code};
pub use membership::{check_leave, outcome_after_leave, LeaveOutcome, LeaveRejection};
