use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};

use crate::{ClientError, FailureKind};

/// Multipart field that carries each uploaded file.
pub const FILE_FIELD: &str = "regulation_files";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Lower-cased metadata keys and their values, empty values included.
    pub metadata: Vec<(String, String)>,
    pub files: Vec<PathBuf>,
}

/// Content type for an upload part, inferred from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("tif" | "tiff") => "image/tiff",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub(crate) async fn build_form(request: &UploadRequest) -> Result<Form, ClientError> {
    if request.files.is_empty() {
        return Err(ClientError::new(
            FailureKind::NoFiles,
            "an upload needs at least one file",
        ));
    }

    let mut form = Form::new();
    for path in &request.files {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            ClientError::new(
                FailureKind::FileRead,
                format!("{}: {}", path.display(), err),
            )
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type_for(path))
            .map_err(|err| ClientError::new(FailureKind::FileRead, err.to_string()))?;
        form = form.part(FILE_FIELD, part);
    }
    for (key, value) in &request.metadata {
        form = form.text(key.clone(), value.clone());
    }
    Ok(form)
}
