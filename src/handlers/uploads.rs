use crate::entities::uploaded_asset::{self, AssetStatus};
use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::services::uploads::IncomingUpload;
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
};
use bytes::Bytes;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub id: Uuid,
    pub url: String,
    pub filename: String,
    pub size: i64,
    pub status: AssetStatus,
}

impl From<uploaded_asset::Model> for UploadResponse {
    fn from(asset: uploaded_asset::Model) -> Self {
        Self {
            id: asset.id,
            url: asset.url,
            filename: asset.filename,
            size: asset.size,
            status: asset.status,
        }
    }
}

/// POST /api/upload
///
/// Multipart form with a `file` part and an optional `sessionId` part.
///
/// The service enforces the 10 MiB file ceiling as a 400. Bodies over the
/// route's 12 MiB transport limit (file plus multipart framing) never reach
/// this handler; the framework rejects them with 413 before extraction.
#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored upload metadata", body = UploadResponse),
        (status = 400, description = "Missing file, disallowed type or oversize", body = crate::errors::ErrorResponse),
        (status = 413, description = "Body exceeds the transport limit")
    ),
    tag = "Uploads"
)]
pub async fn upload_asset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<(Option<String>, Option<String>, Bytes)> = None;
    let mut session_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read file: {}", e)))?;
                file = Some((filename, content_type, bytes));
            }
            Some("sessionId") => {
                session_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("invalid sessionId: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    let asset = state
        .services
        .uploads
        .store(IncomingUpload {
            filename,
            content_type,
            bytes,
            session_id,
        })
        .await
        .map_err(map_service_error)?;

    Ok(success_response(UploadResponse::from(asset)))
}
