//! Common utilities for the direct-upload handler

use axum::extract::Multipart;
use lane_core::AppError;

/// Extract the storage key and file payload from the direct-upload multipart
/// form. Exactly one `key` field and one `file` field are accepted.
pub async fn extract_direct_upload(
    mut multipart: Multipart,
) -> Result<(String, Vec<u8>, String), AppError> {
    let mut key: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "key" => {
                if key.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple key fields are not allowed".to_string(),
                    ));
                }
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read key: {}", e)))?;
                key = Some(value);
            }
            "file" => {
                if file_data.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                content_type = field.content_type().map(|s: &str| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;
                file_data = Some(data.to_vec());
            }
            _ => {}
        }
    }

    let key = key.ok_or_else(|| {
        AppError::InvalidInput("Missing 'key' field from upload descriptor".to_string())
    })?;
    let file_data =
        file_data.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    Ok((key, file_data, content_type))
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Normalize MIME type by stripping parameters
/// (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Validate content type against the configured allowlist. Compares the
/// normalized MIME type only (no parameter bypass).
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<(), AppError> {
    let normalized = normalize_mime_type(content_type).to_lowercase();
    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type. Allowed types: {}",
            allowed_types.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_size_is_bounded() {
        assert!(validate_file_size(10, 100).is_ok());
        assert!(validate_file_size(100, 100).is_ok());
        assert!(matches!(
            validate_file_size(101, 100),
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn content_type_parameters_do_not_bypass_allowlist() {
        let allowed = vec!["image/jpeg".to_string()];
        assert!(validate_content_type("image/jpeg", &allowed).is_ok());
        assert!(validate_content_type("IMAGE/JPEG; charset=utf-8", &allowed).is_ok());
        assert!(validate_content_type("text/html", &allowed).is_err());
    }
}
