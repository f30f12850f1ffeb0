//! # inkwell-api
//!
//! HTTP surface for inkwell: templates, notes built from them, and the
//! accounts that own both.
//!
//! Handlers are generic over [`inkwell_core::Storage`], so the same router
//! serves PostgreSQL in production and the in-memory store in tests.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{router, AppState, RouterOptions};
