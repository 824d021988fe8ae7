use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;

/// Accepted upload types and the extension they are stored with.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("application/pdf", "pdf"),
];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

pub async fn upload(
    auth: AuthUser,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| AppError::BadRequest("Expected a multipart/form-data body".to_string()))?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let ext = field
            .content_type()
            .and_then(|mime| extension_for(mime.as_ref()))
            .ok_or_else(|| AppError::field("file", "Only PNG, JPEG, GIF, WEBP and PDF files are allowed"))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Field read error: {e}")))?;

        if data.is_empty() {
            return Err(AppError::field("file", "File is empty"));
        }
        if data.len() > state.config.upload_max_bytes {
            return Err(AppError::field("file", "File is too large"));
        }

        let name = format!("{}.{ext}", Uuid::now_v7());
        let url = state
            .storage
            .save(&name, &data)
            .await
            .map_err(AppError::Internal)?;

        tracing::info!(user_id = %auth.id(), %url, size = data.len(), "File uploaded");
        return Ok((StatusCode::CREATED, Json(json!({ "url": url }))));
    }

    Err(AppError::field("file", "A file field is required"))
}
