use sqlx::SqlitePool;

use crate::models::{GalleryItemRow, GalleryKind};

const SQL_LIST_GALLERY: &str = r#"
SELECT id, kind, url, title
FROM gallery
ORDER BY id DESC
"#;

const SQL_INSERT_GALLERY_ITEM: &str = r#"
INSERT INTO gallery (kind, url, title)
VALUES (?, ?, ?)
RETURNING id
"#;

const SQL_DELETE_GALLERY_ITEM: &str = r#"
DELETE FROM gallery
WHERE id = ?
"#;

pub async fn list_gallery(pool: &SqlitePool) -> sqlx::Result<Vec<GalleryItemRow>> {
    sqlx::query_as::<_, GalleryItemRow>(SQL_LIST_GALLERY)
        .fetch_all(pool)
        .await
}

pub async fn insert_gallery_item(
    pool: &SqlitePool,
    kind: GalleryKind,
    url: &str,
    title: &str,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_INSERT_GALLERY_ITEM)
        .bind(kind.as_str())
        .bind(url)
        .bind(title)
        .fetch_one(pool)
        .await
}

pub async fn delete_gallery_item(pool: &SqlitePool, id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_GALLERY_ITEM)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
