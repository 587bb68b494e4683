//! IronView Common - Core types and utilities shared across all crates
//!
//! This crate provides the foundational types used throughout IronView:
//! - `LogicalType`: The catalog type system and metastore type-descriptor mapping
//! - `Error`: Unified error types, including the sanitized `TableLoadingError`

pub mod error;
pub mod types;

pub use error::{Error, Result, TableLoadingError, TableLoadingErrorKind};
pub use types::LogicalType;
