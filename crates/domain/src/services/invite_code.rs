//! Circle invite codes.
//!
//! Codes are 8 characters drawn from an alphabet without look-alikes
//! (`0`, `O`, `1`, `I`). Lookups are case-insensitive, so input is
//! normalized before it reaches the store.

use rand::Rng;

pub const INVITE_CODE_LENGTH: usize = 8;

/// Attempts before giving up on finding an unused code.
pub const MAX_CODE_ATTEMPTS: usize = 10;

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

lazy_static::lazy_static! {
    static ref INVITE_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z0-9]{8}$").unwrap();
}

/// Generates a random invite code.
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Trims and uppercases user input.
pub fn normalize_invite_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// True if a normalized code could have been issued.
pub fn is_well_formed(code: &str) -> bool {
    INVITE_CODE_REGEX.is_match(code)
}
