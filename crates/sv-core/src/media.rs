//! Role and media-kind enums shared across the workspace.
//!
//! Both serialize in lowercase and round-trip through the same strings that
//! are stored in the database and embedded in stream tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role. Admins bypass grant checks; clients are watermarked.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Client => "client",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "client" => Ok(Self::Client),
            other => Err(Error::Validation(format!("unknown role '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// Declared type of a catalog media item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Document,
    Image,
    Presentation,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Document => "document",
            Self::Image => "image",
            Self::Presentation => "presentation",
        }
    }

    /// MIME type used when neither the record nor the file extension says
    /// anything more specific.
    pub fn fallback_content_type(&self) -> &'static str {
        match self {
            Self::Video => "video/mp4",
            Self::Document | Self::Presentation => "application/pdf",
            Self::Image => "image/jpeg",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            "image" => Ok(Self::Image),
            "presentation" => Ok(Self::Presentation),
            other => Err(Error::Validation(format!("unknown media kind '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        for role in [Role::Admin, Role::Client] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Client).unwrap(), "\"client\"");
    }

    #[test]
    fn only_admin_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Client.is_admin());
    }

    #[test]
    fn media_kind_round_trip() {
        for kind in [
            MediaKind::Video,
            MediaKind::Document,
            MediaKind::Image,
            MediaKind::Presentation,
        ] {
            assert_eq!(kind.to_string().parse::<MediaKind>().unwrap(), kind);
        }
        assert!("playlist".parse::<MediaKind>().is_err());
    }

    #[test]
    fn fallback_content_types() {
        assert_eq!(MediaKind::Video.fallback_content_type(), "video/mp4");
        assert_eq!(MediaKind::Document.fallback_content_type(), "application/pdf");
    }
}
