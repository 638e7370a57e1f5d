//! Phone number normalisation.
//!
//! # Responsibilities
//! - Strip free-form input down to its digits
//! - Enforce the minimum digit count
//! - Build the collaborator identifier (`<digits>@c.us`)
//!
//! # Design Decisions
//! - No country or format validation beyond the digit count
//! - Numbers are never stored; they are derived per request

use std::fmt;

/// Suffix the collaborator expects on user identifiers.
pub const USER_SUFFIX: &str = "@c.us";

/// Remove every non-digit character, keeping the order of the digits.
pub fn clean_number(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Rejection reasons for a raw phone number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    #[error("Invalid phone number format")]
    TooShort { digits: usize, min_digits: usize },
}

/// A cleaned phone number that passed the digit-count check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Clean `raw` and accept it when at least `min_digits` digits remain.
    pub fn parse(raw: &str, min_digits: usize) -> Result<Self, PhoneError> {
        let digits = clean_number(raw);
        if digits.len() < min_digits {
            return Err(PhoneError::TooShort {
                digits: digits.len(),
                min_digits,
            });
        }
        Ok(Self(digits))
    }

    /// The digits only.
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Collaborator identifier for this number.
    pub fn user_id(&self) -> String {
        format!("{}{}", self.0, USER_SUFFIX)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
