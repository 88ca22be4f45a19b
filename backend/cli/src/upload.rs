//! Multipart upload handling.
//!
//! Files are staged into the upload directory only for as long as the
//! extractor needs them; the staged copy is removed when it is dropped.

use std::collections::HashMap;
use std::path::Path;

use axum::body::Bytes;
use axum::extract::Multipart;
use tempfile::NamedTempFile;

use docverify_core::DocVerifyError;

/// A file part of a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as sent by the client; may be empty.
    pub filename: String,
    pub bytes: Bytes,
}

/// Text fields and file parts of one multipart request.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    /// Read every part of the request.
    pub async fn read(mut multipart: Multipart) -> Result<Self, DocVerifyError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| DocVerifyError::InvalidInput(format!("malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await.map_err(|e| {
                        DocVerifyError::InvalidInput(format!("failed to read file {name}: {e}"))
                    })?;
                    form.files.insert(name, UploadedFile { filename, bytes });
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        DocVerifyError::InvalidInput(format!("failed to read field {name}: {e}"))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(name.into(), file);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}

/// An upload written to disk for the extractor. Deleted on drop.
#[derive(Debug)]
pub struct StagedUpload {
    pub filename: String,
    file: NamedTempFile,
}

impl StagedUpload {
    /// Write `upload` into `dir` under a unique name that keeps the
    /// sanitised file extension.
    pub async fn stage(dir: &Path, upload: &UploadedFile) -> Result<Self, DocVerifyError> {
        let filename = secure_filename(&upload.filename);
        let suffix = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("failed to create upload dir {}: {e}", dir.display()))?;

        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| anyhow::anyhow!("failed to create staging file: {e}"))?;

        tokio::fs::write(file.path(), &upload.bytes)
            .await
            .map_err(|e| anyhow::anyhow!("failed to write staging file: {e}"))?;

        Ok(Self { filename, file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Reduce a client-supplied filename to a safe ASCII name.
///
/// Keeps the final path component, joins whitespace-separated words with
/// `_`, drops anything outside `[A-Za-z0-9_.-]`, and strips leading and
/// trailing `.` and `_`. Falls back to `upload` if nothing is left.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
