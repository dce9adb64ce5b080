//! sv-access: who may view what, and for how long.
//!
//! [`AccessGrantStore`] persists (user, media) grants. [`StreamTokenService`]
//! consults it once per issuance and mints a self-contained HMAC-signed
//! token; validation afterwards is a pure computation that never touches the
//! grant store again.

pub mod codec;
pub mod grants;
pub mod tokens;

pub use codec::{StreamClaims, TokenCodec, TokenError};
pub use grants::{AccessGrantStore, SqliteGrantStore};
pub use tokens::{IssuedStream, StreamTokenService, TokenSettings};

/// Route prefix under which stream tokens are redeemed.
pub const STREAM_ROUTE: &str = "/api/stream";

/// Route prefix for (re-)issuance; the viewer polls this to refresh.
pub const PLAYBACK_ROUTE: &str = "/api/playback";
