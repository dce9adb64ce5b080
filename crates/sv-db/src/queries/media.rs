//! Catalog media records.
//!
//! The catalog itself is owned elsewhere; these functions only register and
//! read the fields the delivery path needs.

use chrono::Utc;
use rusqlite::Connection;
use sv_core::{Error, MediaId, MediaKind, Result};

use crate::models::MediaItem;

const COLS: &str = "id, title, kind, storage_path, content_type, thumbnail, created_at";

/// Fields required to register a media record.
#[derive(Debug, Clone)]
pub struct NewMedia<'a> {
    pub title: &'a str,
    pub kind: MediaKind,
    pub storage_path: &'a str,
    pub content_type: Option<&'a str>,
    pub thumbnail: Option<&'a str>,
}

pub fn create_media(conn: &Connection, new: &NewMedia<'_>) -> Result<MediaItem> {
    let id = MediaId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO media_items (id, title, kind, storage_path, content_type, thumbnail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            id.to_string(),
            new.title,
            new.kind.as_str(),
            new.storage_path,
            new.content_type,
            new.thumbnail,
            created_at,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(MediaItem {
        id,
        title: new.title.to_string(),
        kind: new.kind,
        storage_path: new.storage_path.to_string(),
        content_type: new.content_type.map(str::to_string),
        thumbnail: new.thumbnail.map(str::to_string),
        created_at,
    })
}

pub fn get_media(conn: &Connection, id: MediaId) -> Result<Option<MediaItem>> {
    let q = format!("SELECT {COLS} FROM media_items WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], MediaItem::from_row) {
        Ok(m) => Ok(Some(m)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List media records, newest first.
pub fn list_media(conn: &Connection) -> Result<Vec<MediaItem>> {
    let q = format!("SELECT {COLS} FROM media_items ORDER BY created_at DESC, title ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], MediaItem::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let m = create_media(
            &conn,
            &NewMedia {
                title: "Quarterly review",
                kind: MediaKind::Presentation,
                storage_path: "decks/q3.pdf",
                content_type: Some("application/pdf"),
                thumbnail: None,
            },
        )
        .unwrap();

        let found = get_media(&conn, m.id).unwrap().unwrap();
        assert_eq!(found.title, "Quarterly review");
        assert_eq!(found.kind, MediaKind::Presentation);
        assert_eq!(found.content_type.as_deref(), Some("application/pdf"));
        assert!(found.thumbnail.is_none());
    }

    #[test]
    fn missing_media_is_none() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        assert!(get_media(&conn, MediaId::new()).unwrap().is_none());
    }

    #[test]
    fn list_returns_all() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        for title in ["a", "b"] {
            create_media(
                &conn,
                &NewMedia {
                    title,
                    kind: MediaKind::Video,
                    storage_path: "v.mp4",
                    content_type: None,
                    thumbnail: Some("thumbs/v.jpg"),
                },
            )
            .unwrap();
        }
        assert_eq!(list_media(&conn).unwrap().len(), 2);
    }
}
