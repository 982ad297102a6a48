//! Helpers for partial updates.
//!
//! Patch DTOs distinguish three states per optional field:
//! absent (keep), `null` (clear) and a value (replace). Serde collapses
//! absent and `null` into `None` for a plain `Option<T>`, so optional fields
//! are declared as `Option<Option<T>>` with [`double_option`].

use serde::{Deserialize, Deserializer};

/// Deserializes a present field (including `null`) into `Some(..)`.
///
/// Use together with `#[serde(default)]` so an absent field stays `None`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Replaces a required text field. Absent or blank input keeps the current value.
pub fn apply_required_text(current: &mut String, incoming: Option<String>) {
    if let Some(value) = incoming {
        let value = value.trim();
        if !value.is_empty() {
            *current = value.to_string();
        }
    }
}

/// Applies a tri-state optional field.
pub fn apply_optional<T>(current: &mut Option<T>, incoming: Option<Option<T>>) {
    if let Some(value) = incoming {
        *current = value;
    }
}

/// Applies a plain value field. Absent keeps the current value.
pub fn apply_value<T>(current: &mut T, incoming: Option<T>) {
    if let Some(value) = incoming {
        *current = value;
    }
}
