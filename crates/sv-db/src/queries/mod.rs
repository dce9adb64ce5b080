//! Database query modules.

pub mod auth;
pub mod grants;
pub mod media;
pub mod users;
