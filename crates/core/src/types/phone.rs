//! Validated phone number newtype.
//!
//! OTP login keys everything on the phone number, so it is parsed once at
//! the boundary and carried as a [`Phone`] afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a phone number.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number is empty")]
    Empty,
    #[error("phone number must be 8 to 15 digits")]
    BadLength,
    #[error("phone number contains invalid characters")]
    InvalidCharacters,
}

/// A normalized phone number in E.164-ish form: optional leading `+`
/// followed by 8 to 15 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse and normalize a phone number.
    ///
    /// Spaces, dashes, and parentheses are stripped; a single leading `+`
    /// is kept.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] if the input is empty, contains characters
    /// other than digits and separators, or has an out-of-range digit count.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => ("+", rest),
            None => ("", trimmed),
        };

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '(' | ')' => {}
                _ => return Err(PhoneError::InvalidCharacters),
            }
        }

        if !(8..=15).contains(&digits.len()) {
            return Err(PhoneError::BadLength);
        }

        Ok(Self(format!("{plus}{digits}")))
    }

    /// The normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Phone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_digits() {
        let phone = Phone::parse("9876543210").expect("valid");
        assert_eq!(phone.as_str(), "9876543210");
    }

    #[test]
    fn test_parse_strips_separators() {
        let phone = Phone::parse("+91 98765-43210").expect("valid");
        assert_eq!(phone.as_str(), "+919876543210");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("   "), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("12345"), Err(PhoneError::BadLength));
        assert_eq!(Phone::parse("1234567890123456"), Err(PhoneError::BadLength));
        assert_eq!(Phone::parse("98765abc10"), Err(PhoneError::InvalidCharacters));
        assert_eq!(Phone::parse("98+76543210"), Err(PhoneError::InvalidCharacters));
    }
}
