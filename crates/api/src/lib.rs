//! Storefront catalog API server library.
//!
//! Exposes config, state, error handling, the catalog service, and routes so
//! integration tests and the binary entrypoint share the same building blocks.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod presentation;
pub mod router;
pub mod routes;
pub mod services;
pub mod state;
