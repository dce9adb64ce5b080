//! Access grant operations.
//!
//! Every mutation commits atomically, so a grant racing a revoke for the
//! same pair resolves to whichever commits last.

use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use sv_core::{Error, MediaId, Result, UserId};

use crate::models::AccessGrant;

const COLS: &str = "user_id, media_id, granted_by, granted_at";

fn user_exists(conn: &Connection, id: UserId) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [id.to_string()],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

fn media_exists(conn: &Connection, id: MediaId) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM media_items WHERE id = ?1)",
        [id.to_string()],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

fn ensure_user(conn: &Connection, id: UserId) -> Result<()> {
    if user_exists(conn, id)? {
        Ok(())
    } else {
        Err(Error::not_found("user", id))
    }
}

fn ensure_media(conn: &Connection, id: MediaId) -> Result<()> {
    if media_exists(conn, id)? {
        Ok(())
    } else {
        Err(Error::not_found("media", id))
    }
}

/// Grant `user_id` access to `media_id`.
///
/// Idempotent: an existing pair keeps its original `granted_by` and
/// `granted_at`. The returned flag is `true` only when a new row was written.
///
/// The insert and the read-back share one `BEGIN IMMEDIATE` transaction, so a
/// concurrent revoke lands either before (and the grant recreates the row) or
/// after (and removes it).
pub fn grant(
    conn: &Connection,
    user_id: UserId,
    media_id: MediaId,
    granted_by: UserId,
) -> Result<(AccessGrant, bool)> {
    ensure_user(conn, user_id)?;
    ensure_media(conn, media_id)?;
    ensure_user(conn, granted_by)?;

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| Error::database(e.to_string()))?;

    let now = Utc::now().to_rfc3339();
    let n = tx
        .execute(
            "INSERT OR IGNORE INTO access_grants (user_id, media_id, granted_by, granted_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                user_id.to_string(),
                media_id.to_string(),
                granted_by.to_string(),
                &now
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let grant = get_grant(&tx, user_id, media_id)?
        .ok_or_else(|| Error::Internal(format!("grant {user_id}/{media_id} missing after insert")))?;
    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok((grant, n > 0))
}

/// Revoke a grant. Returns `true` if a row was removed; revoking a missing
/// grant succeeds with `false`.
pub fn revoke(conn: &Connection, user_id: UserId, media_id: MediaId) -> Result<bool> {
    ensure_user(conn, user_id)?;
    ensure_media(conn, media_id)?;

    let n = conn
        .execute(
            "DELETE FROM access_grants WHERE user_id = ?1 AND media_id = ?2",
            rusqlite::params![user_id.to_string(), media_id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Whether `user_id` holds a grant on `media_id`.
///
/// One round trip: the existence of both referents is read alongside the
/// grant so unknown ids surface as `NotFound` rather than `false`.
pub fn check(conn: &Connection, user_id: UserId, media_id: MediaId) -> Result<bool> {
    let (user, media, granted): (bool, bool, bool) = conn
        .query_row(
            "SELECT
                EXISTS(SELECT 1 FROM users WHERE id = ?1),
                EXISTS(SELECT 1 FROM media_items WHERE id = ?2),
                EXISTS(SELECT 1 FROM access_grants WHERE user_id = ?1 AND media_id = ?2)",
            rusqlite::params![user_id.to_string(), media_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if !user {
        return Err(Error::not_found("user", user_id));
    }
    if !media {
        return Err(Error::not_found("media", media_id));
    }
    Ok(granted)
}

pub fn get_grant(
    conn: &Connection,
    user_id: UserId,
    media_id: MediaId,
) -> Result<Option<AccessGrant>> {
    let q = format!("SELECT {COLS} FROM access_grants WHERE user_id = ?1 AND media_id = ?2");
    let result = conn.query_row(
        &q,
        rusqlite::params![user_id.to_string(), media_id.to_string()],
        AccessGrant::from_row,
    );
    match result {
        Ok(g) => Ok(Some(g)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Media ids `user_id` may view.
pub fn list_for_user(conn: &Connection, user_id: UserId) -> Result<BTreeSet<MediaId>> {
    ensure_user(conn, user_id)?;
    let mut stmt = conn
        .prepare("SELECT media_id FROM access_grants WHERE user_id = ?1")
        .map_err(|e| Error::database(e.to_string()))?;
    let ids = stmt
        .query_map([user_id.to_string()], |row| row.get::<_, String>(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    ids.iter()
        .map(|s| {
            s.parse::<MediaId>()
                .map_err(|e| Error::database(format!("bad media id {s}: {e}")))
        })
        .collect()
}

/// User ids that may view `media_id`.
pub fn list_for_media(conn: &Connection, media_id: MediaId) -> Result<BTreeSet<UserId>> {
    ensure_media(conn, media_id)?;
    let mut stmt = conn
        .prepare("SELECT user_id FROM access_grants WHERE media_id = ?1")
        .map_err(|e| Error::database(e.to_string()))?;
    let ids = stmt
        .query_map([media_id.to_string()], |row| row.get::<_, String>(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    ids.iter()
        .map(|s| {
            s.parse::<UserId>()
                .map_err(|e| Error::database(format!("bad user id {s}: {e}")))
        })
        .collect()
}
