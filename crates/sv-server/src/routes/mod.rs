//! Route handlers for the HTTP API.

pub mod admin;
pub mod audit;
pub mod auth;
pub mod health;
pub mod playback;
pub mod stream;
pub mod viewer;

use std::str::FromStr;

use sv_core::Error;

/// Parse a path segment into a typed id, mapping failure to a 400.
pub(crate) fn parse_id<T: FromStr>(raw: &str, entity: &str) -> Result<T, Error> {
    raw.parse()
        .map_err(|_| Error::Validation(format!("Invalid {entity} id: {raw}")))
}
