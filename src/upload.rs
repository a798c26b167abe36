use std::io;
use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use futures::TryStreamExt;
use tempfile::NamedTempFile;
use tokio_util::io::StreamReader;

use crate::validate::AcceptedFile;

/// Longest part of the client filename kept in a scratch file name.
const MAX_STEM_LEN: usize = 64;

/// Directory holding in-flight uploads. Nothing should outlive a request here.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error("failed to store upload: {0}")]
    Io(#[from] io::Error),
}

impl UploadDir {
    /// Uses `root` as scratch space, creating it if needed.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Reserves a unique scratch file for `file`.
    pub fn reserve(&self, file: &AcceptedFile) -> io::Result<ScopedUpload> {
        let name = secure_filename(&file.filename);
        let stem = name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(&name);
        let stem: String = stem.chars().take(MAX_STEM_LEN).collect();
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(&format!(".{}", file.extension))
            .tempfile_in(&self.root)?;
        Ok(ScopedUpload { file: scratch })
    }

    /// Streams a multipart field into a fresh scratch file.
    pub async fn store(
        &self,
        file: &AcceptedFile,
        field: Field<'_>,
    ) -> Result<ScopedUpload, UploadError> {
        let upload = self.reserve(file)?;
        let mut out = tokio::fs::File::from_std(upload.file.as_file().try_clone()?);

        let reader = StreamReader::new(field.map_err(io::Error::other));
        tokio::pin!(reader);
        if let Err(err) = tokio::io::copy(&mut reader, &mut out).await {
            return Err(unwrap_multipart(err));
        }
        out.sync_all().await?;
        Ok(upload)
    }
}

/// Recovers the multipart error `StreamReader` had to wrap in an `io::Error`.
fn unwrap_multipart(err: io::Error) -> UploadError {
    if !err
        .get_ref()
        .is_some_and(|inner| inner.is::<MultipartError>())
    {
        return UploadError::Io(err);
    }
    match err.into_inner().map(|inner| inner.downcast::<MultipartError>()) {
        Some(Ok(multipart)) => UploadError::Multipart(*multipart),
        _ => UploadError::Io(io::Error::other("multipart stream failed")),
    }
}

/// A scratch copy of one upload. Removed on [`ScopedUpload::release`] or drop.
#[derive(Debug)]
pub struct ScopedUpload {
    file: NamedTempFile,
}

impl ScopedUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn release(self) -> io::Result<()> {
        self.file.close()
    }
}

/// Reduces a client supplied name to something safe to embed in a path.
///
/// Path separators and whitespace become `_`, anything outside
/// `[A-Za-z0-9._-]` is dropped, and leading or trailing `.`/`_` are trimmed
/// so the result can never walk out of the upload directory.
pub fn secure_filename(filename: &str) -> String {
    let joined = filename
        .replace(['/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
