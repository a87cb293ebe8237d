//! Network layer subsystem.
//!
//! Plain TCP is handled by `axum::serve`; this module only prepares the
//! optional rustls configuration for `axum-server`.

pub mod tls;
