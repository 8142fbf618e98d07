//! HTTP handlers, one module per resource. Each handler is a thin shell over a `CareClient` service.

pub mod activities;
pub mod announcements;
pub mod auth;
pub mod children;
pub mod classrooms;
pub mod documents;
pub mod meals;
pub mod messages;
pub mod notifications;
pub mod settings;
pub mod users;
pub mod wellbeing;

use crate::error::AppError;
use crate::storage::FileUpload;
use axum::extract::Multipart;
use std::collections::HashMap;

/// A multipart upload: the `file` part plus any plain text fields sent alongside it.
pub(crate) struct UploadForm {
    pub file: FileUpload,
    pub fields: HashMap<String, String>,
}

/// Read a multipart body. The file part must be named `file`.
pub(crate) async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file: Option<FileUpload> = None;
    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
            file = Some(FileUpload::new(file_name, content_type, data.to_vec()));
        } else if !name.is_empty() {
            let text = field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
            fields.insert(name, text);
        }
    }
    let file = file.ok_or_else(|| AppError::BadRequest("missing 'file' field in multipart body".into()))?;
    if file.bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".into()));
    }
    Ok(UploadForm { file, fields })
}
