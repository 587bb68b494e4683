//! Catalog configuration

use ironview_parser::ParserOptions;
use serde::Deserialize;

/// Settings for a [`Catalog`](crate::Catalog).
///
/// Deserializable so an embedding service can keep it in its own config file;
/// missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Schema used for unqualified names
    pub default_schema: String,
    /// How stored view definitions are parsed
    pub parser: ParserOptions,
    /// Maximum depth of views nested inside view definitions
    pub max_view_nesting: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            default_schema: "default".to_string(),
            parser: ParserOptions::default(),
            max_view_nesting: 32,
        }
    }
}

impl CatalogConfig {
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into().to_lowercase();
        self
    }

    pub fn with_parser_options(mut self, parser: ParserOptions) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_max_view_nesting(mut self, depth: usize) -> Self {
        self.max_view_nesting = depth;
        self
    }
}
