//! Field validation shared by the API handlers and the dashboard forms.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

// Indian mobile numbers, optionally prefixed with +91 or 0091.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\+91|0091)?[6-9][0-9]{9}$").expect("phone pattern compiles"));

/// Field classes with a fixed maximum length (in characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    Name,
    Email,
    Phone,
    ShortText,
    LongText,
    Status,
}

impl FieldClass {
    pub fn max_len(self) -> usize {
        match self {
            FieldClass::Name => 100,
            FieldClass::Email => 100,
            FieldClass::Phone => 14,
            FieldClass::ShortText => 200,
            FieldClass::LongText => 5000,
            FieldClass::Status => 50,
        }
    }
}

/// A validation failure scoped to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Require a non-blank value no longer than the class allows.
pub fn require(field: &'static str, value: &str, class: FieldClass) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, "is required"));
    }
    limit(field, value, class)
}

/// Enforce only the maximum length; empty values pass.
pub fn limit(field: &'static str, value: &str, class: FieldClass) -> Result<(), FieldError> {
    let max = class.max_len();
    if value.chars().count() > max {
        return Err(FieldError::new(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

pub fn email(field: &'static str, value: &str) -> Result<(), FieldError> {
    require(field, value, FieldClass::Email)?;
    if !is_valid_email(value.trim()) {
        return Err(FieldError::new(field, "is not a valid email address"));
    }
    Ok(())
}

pub fn phone(field: &'static str, value: &str) -> Result<(), FieldError> {
    require(field, value, FieldClass::Phone)?;
    if !is_valid_phone(value.trim()) {
        return Err(FieldError::new(field, "is not a valid Indian phone number"));
    }
    Ok(())
}

/// Shortest password accepted for new accounts and password changes.
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn password(field: &'static str, value: &str) -> Result<(), FieldError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(FieldError::new(
            field,
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    limit(field, value, FieldClass::ShortText)
}

/// Name, email and phone as collected by every contact form.
pub fn contact(name: &str, email_addr: &str, phone_number: &str) -> Result<(), FieldError> {
    require("name", name, FieldClass::Name)?;
    email("email", email_addr)?;
    phone("phone", phone_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("pilot@drones.in"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("pilot@drones"));
        assert!(!is_valid_email("pilot drones@x.in"));
        assert!(!is_valid_email("@x.in"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+919876543210"));
        assert!(is_valid_phone("00916123456789"));
        assert!(!is_valid_phone("5876543210"));
        assert!(!is_valid_phone("987654321"));
        assert!(!is_valid_phone("+19876543210"));
    }

    #[test]
    fn test_phone_rejects_non_ascii_digits() {
        let devanagari = "9\u{096E}\u{096D}\u{096C}\u{096B}\u{096A}\u{0969}\u{0968}\u{0967}\u{0966}";
        assert!(!is_valid_phone(devanagari));
        assert!(!is_valid_phone("+91\u{FF19}876543210"));
        assert_eq!(
            contact("Ravi", "ravi@example.com", devanagari).unwrap_err().field,
            "phone"
        );
    }

    #[test]
    fn test_length_limits() {
        let long_name = "x".repeat(FieldClass::Name.max_len() + 1);
        assert_eq!(
            require("name", &long_name, FieldClass::Name).unwrap_err().field,
            "name"
        );
        assert!(require("name", "   ", FieldClass::Name).is_err());
        assert!(limit("notes", "", FieldClass::LongText).is_ok());
    }

    #[test]
    fn test_password_length() {
        assert_eq!(password("password", "short").unwrap_err().field, "password");
        assert!(password("password", "longenough").is_ok());
        assert!(password("password", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_contact_reports_first_bad_field() {
        assert!(contact("Ravi", "ravi@example.com", "9123456780").is_ok());
        assert_eq!(
            contact("Ravi", "ravi@", "9123456780").unwrap_err().field,
            "email"
        );
        assert_eq!(
            contact("Ravi", "ravi@example.com", "12345").unwrap_err().field,
            "phone"
        );
    }
}
