use axum::{
    body::Body,
    extract::Multipart,
    http::{Response, StatusCode},
};

use crate::{
    config,
    endpoints::{error_response, internal_error, json_response},
    storage,
};

/// Stores the first multipart part that carries a filename and returns its public URL.
pub async fn upload_file(mut multipart: Multipart) -> Response<Body> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed upload: {e}");
                return error_response(StatusCode::BAD_REQUEST, "Malformed multipart body.");
            }
        };

        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Could not read upload {file_name}: {e}");
                return error_response(StatusCode::BAD_REQUEST, "Could not read uploaded file.");
            }
        };
        if data.is_empty() {
            break;
        }

        return match storage::store(&config::get().storage, &file_name, &data).await {
            Ok(uploaded) => json_response(StatusCode::OK, &uploaded),
            Err(e) => internal_error("Upload failed", e),
        };
    }

    error_response(StatusCode::BAD_REQUEST, "No file found in request")
}
