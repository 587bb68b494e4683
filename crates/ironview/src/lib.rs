//! IronView - View loading and substitution for a distributed SQL catalog
//!
//! IronView keeps the table-like objects of a catalog backed by a metastore:
//! - Base tables with their columns, clustering columns and partitions
//! - Views, loaded lazily from their stored definition text
//! - Substitution of view references in queries handed to the planner
//!
//! # Example
//!
//! ```rust
//! use ironview::catalog::{FieldSchema, InMemoryMetaStore, MetaStoreTable};
//! use ironview::Database;
//! use std::sync::Arc;
//!
//! let store = InMemoryMetaStore::new();
//! store.put_table(
//!     MetaStoreTable::view("default", "recent", "select id from orders", "SELECT id FROM orders"),
//!     vec![FieldSchema::new("id", "bigint")],
//! );
//!
//! let db = Database::new(Arc::new(store));
//! db.catalog().load("default", "recent").unwrap();
//!
//! let query = db.prepare("SELECT id FROM recent").unwrap();
//! assert_eq!(query.to_string(), "SELECT id FROM (SELECT id FROM orders) AS recent");
//! ```

pub use ironview_catalog as catalog;
pub use ironview_common as common;
pub use ironview_parser as parser;

use ironview_catalog::{Catalog, CatalogConfig, LocalViews, MetaStore, View, ViewSubstitutor};
use ironview_common::{Error, Result};
use ironview_parser::ast::{Query, Statement};
use std::sync::Arc;
use tracing::debug;

/// Entry point for preparing queries against a catalog
pub struct Database {
    catalog: Arc<Catalog>,
}

impl Database {
    /// Create a database over `metastore` with the default configuration
    pub fn new(metastore: Arc<dyn MetaStore>) -> Self {
        Self::with_config(CatalogConfig::default(), metastore)
    }

    pub fn with_config(config: CatalogConfig, metastore: Arc<dyn MetaStore>) -> Self {
        Database {
            catalog: Arc::new(Catalog::new(config, metastore)),
        }
    }

    /// Get the catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Parse `sql` and substitute the catalog views it references
    pub fn prepare(&self, sql: &str) -> Result<Query> {
        let mut query = self.parse_query(sql)?;
        self.catalog.substitute_views(&mut query)?;
        debug!(sql, "prepared query");
        Ok(query)
    }

    /// Like [`prepare`](Self::prepare), with query-scoped views in front of
    /// the catalog. Each local view is a `(name, definition)` pair.
    pub fn prepare_with_local_views(&self, sql: &str, views: &[(&str, &str)]) -> Result<Query> {
        let mut local = LocalViews::new(self.catalog.as_ref());
        for (name, definition) in views {
            local.add(View::local(*name, self.parse_query(definition)?))?;
        }

        let config = self.catalog.config();
        let mut query = self.parse_query(sql)?;
        ViewSubstitutor::with_local_views(&local, &config.default_schema, config.max_view_nesting)
            .substitute(&mut query)?;
        debug!(sql, local_views = views.len(), "prepared query");
        Ok(query)
    }

    fn parse_query(&self, sql: &str) -> Result<Query> {
        match parser::parse_statement(sql, &self.catalog.config().parser)? {
            Statement::Query(query) => Ok(*query),
            other => Err(Error::Parse(format!("Expected a query, got: {}", other))),
        }
    }
}
