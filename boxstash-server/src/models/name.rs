//! Name validation for boxes, items and categories

use super::ValidationError;

/// Maximum length for box and item names
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length for item categories
pub const MAX_CATEGORY_LEN: usize = 100;

/// Category used when an item is created without one
pub const DEFAULT_CATEGORY: &str = "other";

/// Validated display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(String);

impl Name {
    /// Create a new name.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 255 characters
    ///
    /// # Example
    /// ```
    /// use boxstash_server::models::Name;
    ///
    /// assert!(Name::new("box name", "Garage shelf").is_ok());
    /// assert!(Name::new("box name", "   ").is_err());
    /// ```
    pub fn new(field: &'static str, s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field });
        }

        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field,
                max: MAX_NAME_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validated item category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category(String);

impl Category {
    /// Blank input falls back to [`DEFAULT_CATEGORY`].
    pub fn new(s: Option<&str>) -> Result<Self, ValidationError> {
        let trimmed = s.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return Ok(Self(DEFAULT_CATEGORY.to_owned()));
        }
        if trimmed.chars().count() > MAX_CATEGORY_LEN {
            return Err(ValidationError::TooLong {
                field: "category",
                max: MAX_CATEGORY_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
