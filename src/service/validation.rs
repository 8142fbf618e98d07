//! Input checks applied before a mutation reaches the backend.

use crate::error::AppError;
use chrono::NaiveDate;
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_TEXT_LEN: usize = 10_000;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Trimmed value; fails when blank.
pub fn require_text(field: &str, value: &str) -> Result<String, AppError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if v.len() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_TEXT_LEN
        )));
    }
    Ok(v.to_string())
}

/// Same as `require_text` for optional patch fields.
pub fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>, AppError> {
    value.map(|v| require_text(field, v)).transpose()
}

/// Lowercased, trimmed email.
pub fn validate_email(email: &str) -> Result<String, AppError> {
    let e = email.trim().to_lowercase();
    let re = Regex::new(EMAIL_PATTERN).map_err(|_| AppError::Validation("invalid email pattern".into()))?;
    if !re.is_match(&e) {
        return Err(AppError::Validation("email must be a valid email".into()));
    }
    Ok(e)
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), AppError> {
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(AppError::Validation(format!("date range start {} is after end {}", f, t)));
        }
    }
    Ok(())
}

/// Trim entries and drop blanks.
pub fn clean_items(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
