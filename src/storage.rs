//! Homework attachment storage.

use base64::prelude::*;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::model::upload_response::UploadResponse;

/// Extension of the stored copy, `bin` when the original name has none.
fn extension_of(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((_, extension)) if !extension.is_empty() && !extension.contains('/') => extension,
        _ => "bin",
    }
}

pub fn stored_name(file_name: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension_of(file_name))
}

/// Stores an uploaded file and returns where clients can fetch it from.
///
/// With an upload directory configured the file lands there under a fresh name; otherwise its bytes
/// are embedded in a `data:` URL.
pub async fn store(
    config: &StorageConfig,
    file_name: &str,
    data: &[u8],
) -> Result<UploadResponse, String> {
    if data.is_empty() {
        return Err("No file found in request".into());
    }

    let Some(upload_dir) = config.upload_dir.as_ref() else {
        return Ok(UploadResponse {
            url: format!(
                "data:application/octet-stream;base64,{}",
                BASE64_STANDARD.encode(data)
            ),
            filename: file_name.into(),
            size: data.len(),
        });
    };

    let stored_name = stored_name(file_name);

    if let Err(e) = tokio::fs::create_dir_all(upload_dir).await {
        return Err(format!("Could not create {}: {e}", upload_dir.display()));
    }
    if let Err(e) = tokio::fs::write(upload_dir.join(&stored_name), data).await {
        return Err(format!("Could not write {stored_name}: {e}"));
    }

    tracing::info!("Stored upload {file_name} as {stored_name} ({} bytes)", data.len());

    Ok(UploadResponse {
        url: format!(
            "{}/{}",
            config.public_base_url.trim_end_matches('/'),
            stored_name
        ),
        filename: file_name.into(),
        size: data.len(),
    })
}
