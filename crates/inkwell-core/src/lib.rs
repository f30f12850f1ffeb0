//! # inkwell-core
//!
//! Core types, traits, and abstractions for inkwell.
//!
//! This crate provides the data model (accounts, templates, notes), the error
//! taxonomy, and the store and transaction traits that the database layer
//! implements and the API layer consumes.

pub mod error;
pub mod logging;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{ConstraintKind, Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::new_v7;
