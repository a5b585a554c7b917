//! Attachment upload and removal endpoints

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{delete, post},
    Router,
};

use crate::config::MAX_FILES_PER_UPLOAD;
use crate::db::repos::ItemRepo;
use crate::http::error::ApiError;
use crate::http::extractors::parse_uuid;
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::models::{Attachment, AttachmentKind, ValidationError};

/// Room for multipart framing on top of the file payloads
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Largest request body the upload routes accept.
pub fn max_body_size(max_file_size: u64) -> usize {
    let total = max_file_size
        .saturating_mul(MAX_FILES_PER_UPLOAD as u64)
        .saturating_add(MULTIPART_OVERHEAD);
    usize::try_from(total).unwrap_or(usize::MAX)
}

fn parse_index(raw: &str) -> Result<usize, ValidationError> {
    raw.trim().parse().map_err(|_| ValidationError::InvalidFormat {
        field: "index",
        reason: "must be a non-negative integer",
    })
}

/// POST /files/{kind}/{item_id} - multipart field named after the kind
async fn upload(
    State(state): State<Arc<AppState>>,
    Path((kind, item_id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Envelope<Vec<Attachment>>, ApiError> {
    let kind: AttachmentKind = kind.parse()?;
    let item_id = parse_uuid("itemId", &item_id)?;
    let repo = ItemRepo::new(&state.pool);
    repo.get(item_id).await?;

    let attachments = state.uploads.receive(kind, &mut multipart).await?;
    if let Err(e) = repo.append_attachments(item_id, kind, &attachments).await {
        state.uploads.discard(kind, &attachments).await;
        return Err(e.into());
    }

    tracing::info!(%item_id, kind = kind.as_str(), count = attachments.len(), "attachments uploaded");
    let message = format!("{} {}(s) uploaded", attachments.len(), kind.label());
    Ok(Envelope::list(attachments).message(message))
}

/// DELETE /files/{kind}/{item_id}/{index}
async fn remove(
    State(state): State<Arc<AppState>>,
    Path((kind, item_id, index)): Path<(String, String, String)>,
) -> Result<Envelope<Attachment>, ApiError> {
    let kind: AttachmentKind = kind.parse()?;
    let item_id = parse_uuid("itemId", &item_id)?;
    let index = parse_index(&index)?;

    let removed = ItemRepo::new(&state.pool)
        .remove_attachment(item_id, kind, index)
        .await?;
    state
        .uploads
        .discard(kind, std::slice::from_ref(&removed))
        .await;

    Ok(Envelope::ok(removed).message(format!("{} deleted", kind.label())))
}

/// File routes, with the default body limit replaced by one sized for uploads.
///
/// The limit is enforced while the multipart stream is read, so an oversized
/// body surfaces as an `upload_error` envelope rather than a bare 413.
pub fn router(max_file_size: u64) -> Router<Arc<AppState>> {
    Router::new()
        .route("/files/{kind}/{item_id}", post(upload))
        .route("/files/{kind}/{item_id}/{index}", delete(remove))
        .layer(DefaultBodyLimit::max(max_body_size(max_file_size)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_covers_all_files() {
        assert_eq!(max_body_size(10), 50 + 1024 * 1024);
        assert_eq!(max_body_size(u64::MAX), usize::MAX);
    }

    #[test]
    fn index_must_be_unsigned() {
        assert_eq!(parse_index("2"), Ok(2));
        assert!(parse_index("-1").is_err());
        assert!(parse_index("first").is_err());
    }
}
