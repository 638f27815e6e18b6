use crate::entities::uploaded_asset::{self, AssetStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use bytes::Bytes;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/heic"];

/// A customer photo as received from the multipart form, before validation.
#[derive(Debug)]
pub struct IncomingUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub session_id: Option<String>,
}

/// Writes validated uploads to local disk and records their metadata with
/// status `pending`. Only the declared content-type string is checked; the
/// bytes themselves are not sniffed.
#[derive(Clone)]
pub struct UploadService {
    db: Arc<DatabaseConnection>,
    upload_dir: PathBuf,
    base_url: String,
    event_sender: Option<EventSender>,
}

impl UploadService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        upload_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            upload_dir: upload_dir.into(),
            base_url: base_url.into(),
            event_sender,
        }
    }

    #[instrument(skip(self, upload), fields(size = upload.bytes.len()))]
    pub async fn store(&self, upload: IncomingUpload) -> Result<uploaded_asset::Model, ServiceError> {
        let content_type = upload
            .content_type
            .as_deref()
            .filter(|ct| ALLOWED_CONTENT_TYPES.contains(ct))
            .ok_or_else(|| {
                ServiceError::InvalidInput(
                    "Invalid file type. Only JPG, PNG, and HEIC are allowed.".to_string(),
                )
            })?
            .to_string();

        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ServiceError::InvalidInput(
                "File too large. Maximum size is 10MB.".to_string(),
            ));
        }

        let asset_id = Uuid::new_v4();
        let filename = match extension_of(upload.filename.as_deref()) {
            Some(ext) => format!("{}.{}", asset_id, ext),
            None => asset_id.to_string(),
        };

        tokio::fs::create_dir_all(&self.upload_dir).await.map_err(|e| {
            error!(error = %e, "failed to create upload directory");
            ServiceError::InternalError("upload storage unavailable".to_string())
        })?;

        let path = self.upload_dir.join(&filename);
        tokio::fs::write(&path, &upload.bytes).await.map_err(|e| {
            error!(error = %e, path = %path.display(), "failed to write upload");
            ServiceError::InternalError("upload storage unavailable".to_string())
        })?;

        let asset = uploaded_asset::ActiveModel {
            id: Set(asset_id),
            filename: Set(filename.clone()),
            url: Set(format!("{}/{}", self.base_url.trim_end_matches('/'), filename)),
            size: Set(upload.bytes.len() as i64),
            content_type: Set(content_type),
            session_id: Set(upload.session_id),
            status: Set(AssetStatus::Pending),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?;

        info!(asset_id = %asset.id, filename = %asset.filename, "upload stored");
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::AssetUploaded(asset.id)).await {
                error!("Failed to send event: {}", e);
            }
        }

        Ok(asset)
    }
}

/// File extension from the client-supplied name, lowercased. The stored name
/// never reuses anything else from the client.
fn extension_of(filename: Option<&str>) -> Option<String> {
    Path::new(filename?)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
