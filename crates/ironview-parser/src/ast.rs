//! Re-export of the sqlparser AST.
//!
//! Catalog code refers to statements and queries through this module so the
//! AST version is pinned in one place.

pub use sqlparser::ast::*;
