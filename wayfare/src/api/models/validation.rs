//! Field checks shared by request models.
//!
//! Each request type exposes a `validate()` that handlers call before touching the
//! database; these helpers keep the messages consistent.

use crate::errors::{Error, Result};

pub fn bad_request(message: impl Into<String>) -> Error {
    Error::BadRequest { message: message.into() }
}

/// Trimmed length of `value` must be at least `min` characters.
pub fn min_chars(field: &str, value: &str, min: usize) -> Result<()> {
    if value.trim().chars().count() < min {
        return Err(bad_request(if min == 1 {
            format!("{field} is required")
        } else {
            format!("{field} must be at least {min} characters")
        }));
    }
    Ok(())
}

pub fn max_chars(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(bad_request(format!("{field} must be no more than {max} characters")));
    }
    Ok(())
}

/// A pragmatic address check: one `@`, a non-empty local part and a dotted domain.
pub fn email(value: &str) -> Result<()> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid { Ok(()) } else { Err(bad_request("Invalid email address")) }
}

pub fn in_range<T: PartialOrd + std::fmt::Display>(field: &str, value: T, min: T, max: T) -> Result<()> {
    if value < min || value > max {
        return Err(bad_request(format!("{field} must be between {min} and {max}")));
    }
    Ok(())
}

/// `end` may not come before `start`.
pub fn ordered<T: PartialOrd>(start: &T, end: &T) -> Result<()> {
    if end < start {
        return Err(bad_request("End date must be after start date"));
    }
    Ok(())
}

/// Lower-case and trim an email so lookups are case-insensitive.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
