//! Product form parsing (JSON or multipart) and image storage on local disk.

use std::path::Path;

use axum::http::HeaderMap;
use bytes::Bytes;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ProductImage;
use crate::validation::ValidationError;

/// URL prefix the upload directory is served under.
pub const UPLOADS_PREFIX: &str = "/uploads";

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpg", "image/jpeg"];

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Text fields of a submitted form plus at most one file part.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: Map<String, Value>,
    pub file: Option<UploadedFile>,
}

impl FormData {
    /// Trimmed, non-empty text value of a field.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn float(&self, key: &'static str) -> Result<Option<f64>, ValidationError> {
        match self.fields.get(key) {
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ValidationError::new(key, format!("{key} must be a number"))),
            Some(Value::Null) | None => Ok(None),
            Some(_) => Err(ValidationError::new(key, format!("{key} must be a number"))),
        }
    }

    pub fn int(&self, key: &'static str) -> Result<Option<i32>, ValidationError> {
        let invalid = || ValidationError::new(key, format!("{key} must be a whole number"));
        match self.fields.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Some)
                .ok_or_else(invalid),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s.trim().parse::<i32>().map(Some).map_err(|_| invalid()),
            Some(Value::Null) | None => Ok(None),
            Some(_) => Err(invalid()),
        }
    }
}

/// Parse a request body as multipart form data or JSON, depending on Content-Type.
///
/// Only the part named `file_field` is kept as a file; other file parts are ignored.
pub async fn parse_form(
    headers: &HeaderMap,
    body: Bytes,
    file_field: &str,
) -> Result<FormData, String> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json");

    if content_type.contains("multipart/form-data") {
        return parse_multipart(content_type, body, file_field).await;
    }

    if body.is_empty() {
        return Ok(FormData::default());
    }

    match serde_json::from_slice(&body).map_err(|e| format!("Invalid JSON: {e}"))? {
        Value::Object(fields) => Ok(FormData { fields, file: None }),
        _ => Err("Request body must be a JSON object".to_string()),
    }
}

async fn parse_multipart(
    content_type: &str,
    body: Bytes,
    file_field: &str,
) -> Result<FormData, String> {
    let boundary =
        multer::parse_boundary(content_type).map_err(|_| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = FormData::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field
                .content_type()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| format!("File read error: {e}"))?;

            // Browsers send an empty part when no file was chosen.
            if name == file_field && !file_name.is_empty() && !data.is_empty() {
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        form.fields.insert(name, Value::String(value));
    }

    Ok(form)
}

/// Validate and write an uploaded image into `upload_dir`.
pub async fn store_image(upload_dir: &Path, file: &UploadedFile) -> Result<ProductImage, AppError> {
    let content_type = file.content_type.to_ascii_lowercase();
    if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
        return Err(ValidationError::new(
            "image",
            "Only png, jpg and jpeg images are allowed",
        )
        .into());
    }

    let stored_name = format!(
        "{}-{}",
        Uuid::now_v7().simple(),
        sanitize_file_name(&file.file_name)
    );

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {e}")))?;
    tokio::fs::write(upload_dir.join(&stored_name), &file.data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {e}")))?;

    tracing::debug!("Stored upload {stored_name} ({} bytes)", file.data.len());

    Ok(ProductImage {
        file_name: file.file_name.clone(),
        file_path: format!("{UPLOADS_PREFIX}/{stored_name}"),
        file_type: content_type,
        file_size: format_file_size(file.data.len() as u64),
    })
}

/// Remove a previously stored image. Failures are logged, not returned.
pub async fn remove_image(upload_dir: &Path, image: &ProductImage) {
    let Some(stored_name) = image
        .file_path
        .strip_prefix(UPLOADS_PREFIX)
        .map(|s| s.trim_start_matches('/'))
        .filter(|s| !s.is_empty() && !s.contains('/') && !s.contains(".."))
    else {
        return;
    };

    if let Err(e) = tokio::fs::remove_file(upload_dir.join(stored_name)).await {
        tracing::warn!("Failed to remove upload {stored_name}: {e}");
    }
}

/// Keep only characters that are safe in a file name.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '-');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Human readable size using decimal units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let formatted = format!("{value:.2}");
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{formatted} {}", UNITS[unit])
}
