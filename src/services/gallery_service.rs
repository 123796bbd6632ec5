//! Gallery uploads. Files go to the upload directory with a timestamp prefix;
//! deleting an item removes only its row, the file stays on disk.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::fs;
use tracing::info;

use crate::database::gallery_repo;
use crate::error::AppError;
use crate::models::{GalleryItemRow, GalleryKind};

/// Public URL prefix under which the upload directory is served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

pub struct NewUpload<'a> {
    pub kind: GalleryKind,
    pub title: &'a str,
    pub original_name: &'a str,
    pub bytes: &'a [u8],
}

pub async fn list_gallery(pool: &SqlitePool) -> Result<Vec<GalleryItemRow>, AppError> {
    Ok(gallery_repo::list_gallery(pool).await?)
}

/// Writes the file, then records it. Returns the new item id.
pub async fn add_gallery_item(
    pool: &SqlitePool,
    upload_dir: &Path,
    upload: NewUpload<'_>,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let file_name = stored_file_name(upload.original_name, now);

    fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Upload(format!("cannot create {}: {e}", upload_dir.display())))?;
    fs::write(upload_dir.join(&file_name), upload.bytes)
        .await
        .map_err(|e| AppError::Upload(format!("cannot write {file_name}: {e}")))?;

    let url = format!("{UPLOADS_URL_PREFIX}/{file_name}");
    let id = gallery_repo::insert_gallery_item(pool, upload.kind, &url, upload.title.trim()).await?;
    info!(gallery_id = id, url = %url, bytes = upload.bytes.len(), "gallery item added");
    Ok(id)
}

/// Unknown ids are a no-op.
pub async fn delete_gallery_item(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let removed = gallery_repo::delete_gallery_item(pool, id).await?;
    info!(gallery_id = id, removed, "gallery item deleted");
    Ok(())
}

/// `<unix millis>-<sanitized name>`; the prefix keeps concurrent uploads apart.
pub fn stored_file_name(original_name: &str, now: DateTime<Utc>) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    let sanitized = if sanitized.is_empty() {
        "arquivo"
    } else {
        sanitized
    };
    format!("{}-{}", now.timestamp_millis(), sanitized)
}
