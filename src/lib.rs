//! SealView - secure media delivery.
//!
//! The binary's offline administration helpers live here so integration
//! tests can drive them without spawning the CLI.

pub mod admin;
