//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Requires a valid token.
//! - [`auth::RequestCaller`] -- Anonymous when no `Authorization` header is sent.
//! - [`origin::ClientOrigin`] -- Scheme and host the client used.

pub mod auth;
pub mod origin;
