//! Item attachments (photos and documents)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Document MIME types accepted for upload
const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Which attachment list a file belongs to.
///
/// The multipart field name, the upload subdirectory and the item column
/// all share the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Photos,
    Documents,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photos => "photos",
            Self::Documents => "documents",
        }
    }

    /// Check a MIME type against this kind's allow-list.
    pub fn accepts(&self, mime: &str) -> bool {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match self {
            Self::Photos => essence.starts_with("image/") && essence.len() > "image/".len(),
            Self::Documents => DOCUMENT_TYPES.contains(&essence.as_str()),
        }
    }

    /// Human label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Photos => "photo",
            Self::Documents => "document",
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photos" => Ok(Self::Photos),
            "documents" => Ok(Self::Documents),
            _ => Err(ValidationError::InvalidVariant {
                field: "attachment kind",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata record stored in an item's `photos` / `documents` JSONB list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Generated name on disk, unique per upload
    pub filename: String,
    pub original_name: String,
    /// Public path under `/uploads`
    pub url: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Lowercased file extension, documents only
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}
