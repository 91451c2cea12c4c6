//! Multipart staging helpers.

use std::path::Path;

use axum::extract::multipart::Field;
use playtube_common::{AppError, AppResult, TempMedia};

/// Stage a multipart file field into the temp directory.
///
/// The returned guard removes the staged file when dropped, so upload
/// failures and early returns clean up after themselves.
pub async fn stage_file_field(temp_dir: &Path, field: Field<'_>) -> AppResult<TempMedia> {
    let original_name = field
        .file_name()
        .map(ToString::to_string)
        .unwrap_or_else(|| "upload.bin".to_string());

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("Empty file upload".to_string()));
    }

    TempMedia::stage(temp_dir, &original_name, &data).await
}

/// Read a multipart text field.
pub async fn text_field(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}
