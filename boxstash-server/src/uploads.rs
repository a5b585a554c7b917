//! Attachment storage on local disk
//!
//! Multipart fields are streamed chunk by chunk into
//! `<root>/<kind>/<kind>-<millis>-<random><ext>`. Every file written by a
//! request is removed again if the request fails at any later step.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use chrono::Utc;
use rand::Rng;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::config::MAX_FILES_PER_UPLOAD;
use crate::models::{Attachment, AttachmentKind};

/// URL prefix uploaded files are served under
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Longest extension kept from a client file name
const MAX_EXTENSION_LEN: usize = 10;

/// Optional text field carrying a caption for the uploaded files
pub const CAPTION_FIELD: &str = "caption";

pub const MAX_CAPTION_LEN: usize = 500;

/// Upload error type
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no files were uploaded")]
    NoFiles,

    #[error("too many files: at most {max} per request")]
    TooManyFiles { max: usize },

    #[error("unexpected field '{got}', expected '{expected}'")]
    UnexpectedField { expected: &'static str, got: String },

    #[error("unsupported file type '{mime}' for {kind}")]
    UnsupportedType { kind: &'static str, mime: String },

    #[error("file too large: limit is {max} bytes")]
    TooLarge { max: u64 },

    #[error("caption too long: at most {max} characters")]
    CaptionTooLong { max: usize },

    #[error("malformed upload: {0}")]
    Multipart(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Client mistakes as opposed to storage failures
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Generate a collision-resistant stored file name.
pub fn stored_name(kind: AttachmentKind, original_name: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    match extension(original_name) {
        Some(ext) => format!("{}-{millis}-{suffix}.{ext}", kind.as_str()),
        None => format!("{}-{millis}-{suffix}", kind.as_str()),
    }
}

/// Lowercased extension of a client file name, if it looks sane.
pub fn extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Trimmed caption text; blank means no caption.
pub fn caption(raw: &str) -> Result<Option<String>, UploadError> {
    let text = raw.trim();
    if text.chars().count() > MAX_CAPTION_LEN {
        return Err(UploadError::CaptionTooLong {
            max: MAX_CAPTION_LEN,
        });
    }
    Ok((!text.is_empty()).then(|| text.to_owned()))
}

/// A file being written, with a running size check
pub struct StagedFile {
    path: PathBuf,
    file: File,
    written: u64,
    limit: u64,
}

impl StagedFile {
    pub async fn create(path: PathBuf, limit: u64) -> Result<Self, UploadError> {
        let file = File::create(&path).await?;
        Ok(Self {
            path,
            file,
            written: 0,
            limit,
        })
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        self.written += chunk.len() as u64;
        if self.written > self.limit {
            return Err(UploadError::TooLarge { max: self.limit });
        }
        self.file.write_all(chunk).await?;
        Ok(())
    }

    /// Flush to disk and return the byte count.
    pub async fn finish(mut self) -> Result<u64, UploadError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(self.written)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Local attachment store
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_file_size: u64,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            root: root.into(),
            max_file_size,
        }
    }

    /// On-disk path of a stored file. Only the final path component is used.
    pub fn path_of(&self, kind: AttachmentKind, filename: &str) -> PathBuf {
        let name = Path::new(filename)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default();
        self.root.join(kind.as_str()).join(name)
    }

    /// Create the per-kind directories.
    pub async fn ensure_dirs(&self) -> Result<(), UploadError> {
        for kind in [AttachmentKind::Photos, AttachmentKind::Documents] {
            fs::create_dir_all(self.root.join(kind.as_str())).await?;
        }
        Ok(())
    }

    /// Stream every file of the request to disk.
    ///
    /// On error, files already written by this request are deleted.
    pub async fn receive(
        &self,
        kind: AttachmentKind,
        multipart: &mut Multipart,
    ) -> Result<Vec<Attachment>, UploadError> {
        fs::create_dir_all(self.root.join(kind.as_str())).await?;

        let mut written = Vec::new();
        match self.receive_fields(kind, multipart, &mut written).await {
            Ok(attachments) if attachments.is_empty() => Err(UploadError::NoFiles),
            Ok(attachments) => Ok(attachments),
            Err(e) => {
                tracing::warn!(error = %e, files = written.len(), "upload failed, discarding files");
                remove_paths(&written).await;
                Err(e)
            }
        }
    }

    async fn receive_fields(
        &self,
        kind: AttachmentKind,
        multipart: &mut Multipart,
        written: &mut Vec<PathBuf>,
    ) -> Result<Vec<Attachment>, UploadError> {
        let mut attachments = Vec::new();
        let mut text = None;

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::Multipart(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            if name == CAPTION_FIELD && field.file_name().is_none() {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Multipart(e.body_text()))?;
                text = caption(&raw)?;
                continue;
            }
            if name != kind.as_str() {
                return Err(UploadError::UnexpectedField {
                    expected: kind.as_str(),
                    got: name,
                });
            }
            if attachments.len() == MAX_FILES_PER_UPLOAD {
                return Err(UploadError::TooManyFiles {
                    max: MAX_FILES_PER_UPLOAD,
                });
            }

            let original_name = field.file_name().unwrap_or("upload").to_owned();
            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            if !kind.accepts(&mime) {
                return Err(UploadError::UnsupportedType {
                    kind: kind.as_str(),
                    mime,
                });
            }

            let filename = stored_name(kind, &original_name);
            let path = self.path_of(kind, &filename);
            let mut staged = StagedFile::create(path.clone(), self.max_file_size).await?;
            written.push(path);

            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| UploadError::Multipart(e.body_text()))?
            {
                staged.write(&chunk).await?;
            }
            let size = staged.finish().await?;

            tracing::debug!(kind = kind.as_str(), %filename, size, "file stored");
            attachments.push(self.describe(kind, filename, original_name, mime, size));
        }

        // Applies to every file of the request, wherever the field appeared
        if let Some(text) = text {
            for attachment in &mut attachments {
                attachment.caption = Some(text.clone());
            }
        }
        Ok(attachments)
    }

    fn describe(
        &self,
        kind: AttachmentKind,
        filename: String,
        original_name: String,
        mime_type: String,
        size: u64,
    ) -> Attachment {
        let doc_type = match kind {
            AttachmentKind::Documents => extension(&original_name),
            AttachmentKind::Photos => None,
        };
        Attachment {
            url: format!("{PUBLIC_PREFIX}/{}/{filename}", kind.as_str()),
            filename,
            original_name,
            mime_type,
            size,
            caption: None,
            doc_type,
            uploaded_at: Utc::now(),
        }
    }

    /// Delete the files behind attachment records, ignoring ones already gone.
    pub async fn discard(&self, kind: AttachmentKind, attachments: &[Attachment]) {
        let paths: Vec<PathBuf> = attachments
            .iter()
            .map(|a| self.path_of(kind, &a.filename))
            .collect();
        remove_paths(&paths).await;
    }
}

async fn remove_paths(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stored_name_keeps_kind_and_extension() {
        let name = stored_name(AttachmentKind::Photos, "IMG_0042.JPG");
        assert!(name.starts_with("photos-"), "{name}");
        assert!(name.ends_with(".jpg"), "{name}");
        assert_eq!(name.split('-').count(), 3);
    }

    #[test]
    fn stored_names_differ() {
        let a = stored_name(AttachmentKind::Documents, "manual.pdf");
        let b = stored_name(AttachmentKind::Documents, "manual.pdf");
        assert_ne!(a, b);
    }

    #[test]
    fn suspicious_extensions_are_dropped() {
        assert_eq!(extension("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension("no_extension"), None);
        assert_eq!(extension("evil.ph p"), None);
        assert_eq!(extension("x.averyveryverylongext"), None);
        assert!(!stored_name(AttachmentKind::Photos, "blob").contains('.'));
    }

    #[test]
    fn captions_are_trimmed_and_bounded() {
        assert_eq!(caption("  front left shelf ").unwrap().as_deref(), Some("front left shelf"));
        assert_eq!(caption("   ").unwrap(), None);
        assert!(caption(&"é".repeat(MAX_CAPTION_LEN)).unwrap().is_some());

        let err = caption(&"x".repeat(MAX_CAPTION_LEN + 1)).unwrap_err();
        assert!(matches!(err, UploadError::CaptionTooLong { max: MAX_CAPTION_LEN }));
        assert!(err.is_client_error());
    }

    #[test]
    fn path_of_strips_directories() {
        let store = UploadStore::new("/srv/uploads", 10);
        assert_eq!(
            store.path_of(AttachmentKind::Photos, "../../etc/passwd"),
            PathBuf::from("/srv/uploads/photos/passwd")
        );
    }

    #[tokio::test]
    async fn staged_file_enforces_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let mut staged = StagedFile::create(path, 8).await.unwrap();

        staged.write(b"12345").await.unwrap();
        let err = staged.write(b"6789").await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { max: 8 }));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn staged_file_reports_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ok.txt");
        let mut staged = StagedFile::create(path.clone(), 1024).await.unwrap();
        staged.write(b"hello ").await.unwrap();
        staged.write(b"world").await.unwrap();
        assert_eq!(staged.path(), path.as_path());
        assert_eq!(staged.finish().await.unwrap(), 11);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[tokio::test]
    async fn discard_removes_files_and_ignores_missing() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path(), 1024);
        store.ensure_dirs().await.unwrap();

        let kept = store.describe(
            AttachmentKind::Documents,
            "documents-1-1.pdf".into(),
            "a.pdf".into(),
            "application/pdf".into(),
            3,
        );
        let missing = store.describe(
            AttachmentKind::Documents,
            "documents-1-2.pdf".into(),
            "b.pdf".into(),
            "application/pdf".into(),
            3,
        );
        let path = store.path_of(AttachmentKind::Documents, &kept.filename);
        std::fs::write(&path, b"pdf").unwrap();

        store
            .discard(AttachmentKind::Documents, &[kept, missing])
            .await;
        assert!(!path.exists());
    }

    #[test]
    fn describe_sets_url_and_doc_type() {
        let store = UploadStore::new("/srv/uploads", 1024);
        let doc = store.describe(
            AttachmentKind::Documents,
            "documents-1-1.pdf".into(),
            "Manual.PDF".into(),
            "application/pdf".into(),
            42,
        );
        assert_eq!(doc.url, "/uploads/documents/documents-1-1.pdf");
        assert_eq!(doc.doc_type.as_deref(), Some("pdf"));

        let photo = store.describe(
            AttachmentKind::Photos,
            "photos-1-1.png".into(),
            "cat.png".into(),
            "image/png".into(),
            42,
        );
        assert_eq!(photo.doc_type, None);
    }
}
