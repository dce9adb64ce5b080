//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use sv_core::{MediaId, MediaKind, Role, SessionId, UserId};

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse a typed id or `FromStr` enum stored as text.
fn parse_text<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = sv_core::Error>,
{
    let s: String = row.get(idx)?;
    s.parse().map_err(|e: sv_core::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: String,
}

impl User {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_text(row, 0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            role: parse_text(row, 3)?,
            created_at: row.get(4)?,
        })
    }
}

// ---------------------------------------------------------------------------
// AuthToken
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuthToken {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: String,
}

impl AuthToken {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_text(row, 0)?,
            user_id: parse_text(row, 1)?,
            token: row.get(2)?,
            expires_at: row.get(3)?,
        })
    }
}

// ---------------------------------------------------------------------------
// MediaItem
// ---------------------------------------------------------------------------

/// Read-only view of a catalog record.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub id: MediaId,
    pub title: String,
    pub kind: MediaKind,
    /// Byte-store location, relative to the media root or absolute.
    pub storage_path: String,
    pub content_type: Option<String>,
    pub thumbnail: Option<String>,
    pub created_at: String,
}

impl MediaItem {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_text(row, 0)?,
            title: row.get(1)?,
            kind: parse_text(row, 2)?,
            storage_path: row.get(3)?,
            content_type: row.get(4)?,
            thumbnail: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

// ---------------------------------------------------------------------------
// AccessGrant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub user_id: UserId,
    pub media_id: MediaId,
    pub granted_by: UserId,
    pub granted_at: String,
}

impl AccessGrant {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: parse_text(row, 0)?,
            media_id: parse_text(row, 1)?,
            granted_by: parse_text(row, 2)?,
            granted_at: row.get(3)?,
        })
    }
}
