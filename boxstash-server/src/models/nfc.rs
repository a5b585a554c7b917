//! NFC tag identifier validation
//!
//! Tags are accepted as read from the reader: hex characters only, any case.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Upper bound matches the `nfc_id` column width
const MAX_NFC_LEN: usize = 255;

static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]+$").expect("invalid nfc regex"));

/// Validated NFC tag identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NfcTag(String);

impl NfcTag {
    /// # Example
    /// ```
    /// use boxstash_server::models::NfcTag;
    ///
    /// assert!(NfcTag::new("04A2B3C4").is_ok());
    /// assert!(NfcTag::new("04:A2:B3").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "nfcId" });
        }

        if trimmed.len() > MAX_NFC_LEN {
            return Err(ValidationError::TooLong {
                field: "nfcId",
                max: MAX_NFC_LEN,
            });
        }

        if !HEX_RE.is_match(trimmed) {
            return Err(ValidationError::InvalidFormat {
                field: "nfcId",
                reason: "must contain hexadecimal characters only",
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for NfcTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
