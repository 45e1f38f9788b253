//! Postal pincode value object.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Validated 6-digit Indian postal pincode.
///
/// Validation happens at construction, before any geocoding network call is
/// attempted. The leading digit identifies the postal region and drives the
/// approximate-coordinate fallback when precise geocoding fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pincode(String);

impl Pincode {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = raw.as_ref().trim();
        if raw.len() != 6 || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "pincode must be exactly 6 digits, got '{raw}'"
            )));
        }
        if raw.starts_with('0') {
            return Err(DomainError::validation(format!(
                "pincode cannot start with 0: '{raw}'"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading digit (1-9), the postal-region discriminator.
    pub fn leading_digit(&self) -> u8 {
        // Guaranteed non-zero ascii digit by construction.
        self.0.as_bytes()[0] - b'0'
    }
}

impl core::fmt::Display for Pincode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pincode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Pincode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Pincode> for String {
    fn from(value: Pincode) -> Self {
        value.0
    }
}
