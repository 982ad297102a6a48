//! Field validators shared by request DTOs.
//!
//! These plug into `#[validate(custom(function = "..."))]`.

use validator::ValidationError;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Value must not be blank"))
    } else {
        Ok(())
    }
}

/// Rejects names that are blank or longer than 100 characters after trimming.
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value)?;
    if value.trim().chars().count() > 100 {
        return Err(error("name_length", "Name must be at most 100 characters"));
    }
    Ok(())
}

/// Month number in a calendar year.
pub fn validate_month(month: u32) -> Result<(), ValidationError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(error("month_range", "Month must be between 1 and 12"))
    }
}

/// Years the calendar month view accepts.
pub fn validate_year(year: i32) -> Result<(), ValidationError> {
    if (1970..=9999).contains(&year) {
        Ok(())
    } else {
        Err(error("year_range", "Year must be between 1970 and 9999"))
    }
}
