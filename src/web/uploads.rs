use axum::extract::Multipart;
use thiserror::Error;
use tracing::debug;

use crate::containers::SelectedFile;

/// Result type used by the shared upload helpers.
pub type UploadResult<T> = Result<T, UploadError>;

/// Error returned when reading an uploaded attachment.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to parse upload form: {0}")]
    Malformed(String),
    #[error("failed to read field `{field}`: {message}")]
    Read { field: String, message: String },
    #[error("unsupported file field `{0}`")]
    UnexpectedField(String),
    #[error("field `{0}` accepts a single file")]
    TooManyFiles(String),
    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
}

/// Reads the multipart body and returns the single file sent under `field_name`.
///
/// Text fields are skipped. A form without any file part yields `Ok(None)`.
pub async fn read_single_file(
    mut multipart: Multipart,
    field_name: &str,
    max_bytes: usize,
) -> UploadResult<Option<SelectedFile>> {
    let mut selected: Option<SelectedFile> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::Malformed(err.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!(field = %name, "skipping text field in upload form");
            continue;
        };

        if name != field_name {
            return Err(UploadError::UnexpectedField(name));
        }
        if selected.is_some() {
            return Err(UploadError::TooManyFiles(name));
        }
        // Browsers send an empty part when the input is cleared.
        if file_name.is_empty() {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|err| UploadError::Read {
            field: name.clone(),
            message: err.to_string(),
        })? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge { limit: max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }

        selected = Some(SelectedFile {
            name: file_name,
            content_type,
            bytes,
        });
    }

    Ok(selected)
}
