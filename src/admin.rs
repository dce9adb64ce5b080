//! Offline catalog and account administration, shared by the CLI
//! subcommands.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use rand::RngCore;
use sv_access::{AccessGrantStore, SqliteGrantStore};
use sv_core::config::Config;
use sv_core::events::EventBus;
use sv_core::{MediaId, MediaKind, Role, UserId};
use sv_db::models::{AccessGrant, MediaItem, User};
use sv_db::pool::{get_conn, DbPool};
use sv_db::queries::{media, users};

/// Open (and migrate) the database named in `config`.
pub fn open_db(config: &Config) -> Result<DbPool> {
    let path = &config.server.db_path;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(sv_db::pool::init_pool(&path.to_string_lossy())?)
}

pub fn create_user(
    db: &DbPool,
    username: &str,
    password: &str,
    role: Role,
    cost: u32,
) -> Result<User> {
    if username.trim().is_empty() {
        bail!("username must not be empty");
    }
    if password.is_empty() {
        bail!("password must not be empty");
    }
    let hash = bcrypt::hash(password, cost)?;
    let conn = get_conn(db)?;
    Ok(users::create_user(&conn, username.trim(), &hash, role)?)
}

/// Catalog entry to register.
#[derive(Debug, Clone)]
pub struct MediaSpec {
    pub title: String,
    pub kind: MediaKind,
    pub path: String,
    pub content_type: Option<String>,
    pub thumbnail: Option<String>,
}

pub fn add_media(config: &Config, db: &DbPool, spec: &MediaSpec) -> Result<MediaItem> {
    let resolved = config
        .storage
        .resolve(&spec.path)
        .ok_or_else(|| anyhow!("media path {} escapes the media root", spec.path))?;
    if !resolved.is_file() {
        tracing::warn!(
            "{} does not exist yet; streams will 404 until it does",
            resolved.display()
        );
    }

    let conn = get_conn(db)?;
    Ok(media::create_media(
        &conn,
        &media::NewMedia {
            title: &spec.title,
            kind: spec.kind,
            storage_path: &spec.path,
            content_type: spec.content_type.as_deref(),
            thumbnail: spec.thumbnail.as_deref(),
        },
    )?)
}

/// Look a user up by id, falling back to username.
pub fn find_user(db: &DbPool, ident: &str) -> Result<User> {
    let conn = get_conn(db)?;
    let found = match ident.parse::<UserId>() {
        Ok(id) => users::get_user_by_id(&conn, id)?,
        Err(_) => users::get_user_by_username(&conn, ident)?,
    };
    found.ok_or_else(|| anyhow!("no such user: {ident}"))
}

fn first_admin(db: &DbPool) -> Result<User> {
    let conn = get_conn(db)?;
    users::list_users(&conn)?
        .into_iter()
        .find(|u| u.role.is_admin())
        .ok_or_else(|| anyhow!("no admin account exists; create one with `create-user --admin`"))
}

fn store(db: &DbPool) -> SqliteGrantStore {
    SqliteGrantStore::new(db.clone(), Arc::new(EventBus::default()))
}

pub fn grant(db: &DbPool, user: &str, media_id: &str, by: Option<&str>) -> Result<AccessGrant> {
    let user = find_user(db, user)?;
    let media_id: MediaId = media_id
        .parse()
        .map_err(|_| anyhow!("invalid media id: {media_id}"))?;
    let grantor = match by {
        Some(ident) => find_user(db, ident)?,
        None => first_admin(db)?,
    };
    if !grantor.role.is_admin() {
        bail!("{} is not an admin", grantor.username);
    }
    Ok(store(db).grant(user.id, media_id, grantor.id)?)
}

pub fn revoke(db: &DbPool, user: &str, media_id: &str) -> Result<()> {
    let user = find_user(db, user)?;
    let media_id: MediaId = media_id
        .parse()
        .map_err(|_| anyhow!("invalid media id: {media_id}"))?;
    Ok(store(db).revoke(user.id, media_id)?)
}

/// 32 random bytes, hex encoded, for `streaming.token_secret`.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
