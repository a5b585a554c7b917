//! Database error type

use crate::models::ValidationError;

/// Unique constraint on `boxes.nfc_id`
pub const NFC_UNIQUE_CONSTRAINT: &str = "boxes_nfc_id_key";

/// Foreign key from `items.box_id` to `boxes.id`
pub const ITEM_BOX_FK: &str = "items_box_id_fkey";

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// A constraint or guard rejected the write
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// True when `err` is a unique violation on the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation() && e.constraint() == Some(constraint))
        .unwrap_or(false)
}

/// True when `err` is a foreign key violation on the named constraint.
pub fn is_foreign_key_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .map(|e| e.is_foreign_key_violation() && e.constraint() == Some(constraint))
        .unwrap_or(false)
}

/// Map a unique violation on the NFC column to a conflict.
pub fn nfc_conflict(err: sqlx::Error) -> DbError {
    if is_unique_violation(&err, NFC_UNIQUE_CONSTRAINT) {
        DbError::Conflict("NFC tag is already bound to another box".to_owned())
    } else {
        DbError::Sqlx(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_violations() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err, NFC_UNIQUE_CONSTRAINT));
        assert!(!is_foreign_key_violation(&err, ITEM_BOX_FK));
        assert!(matches!(nfc_conflict(err), DbError::Sqlx(_)));
    }

    #[test]
    fn not_found_display() {
        let err = DbError::not_found("box", "abc");
        assert_eq!(err.to_string(), "not found: box 'abc'");
    }
}
