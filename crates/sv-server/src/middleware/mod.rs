//! HTTP middleware: request ID, authentication, rate limiting, and
//! response hardening headers.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
