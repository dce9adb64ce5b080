//! Uuid-backed ids, one type per entity so a `UserId` cannot be passed
//! where a `MediaId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Declare UUID-backed ids. Each one is `Copy`, ordered (ids live in
/// `BTreeSet`s), serializes as its bare UUID string and parses into
/// [`Error::Validation`] naming the entity.
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident => $entity:literal),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl $name {
                #[must_use]
                pub fn new() -> Self {
                    Self(Uuid::new_v4())
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }

            impl FromStr for $name {
                type Err = Error;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    Uuid::parse_str(s)
                        .map(Self)
                        .map_err(|_| Error::Validation(format!("invalid {} id: {s}", $entity)))
                }
            }
        )+
    };
}

typed_id! {
    /// A user account.
    UserId => "user",
    /// A catalog media item.
    MediaId => "media",
    /// A login session row.
    SessionId => "session",
}
