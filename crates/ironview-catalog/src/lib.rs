//! IronView Catalog - Schema, table and view management
//!
//! The catalog holds the table-like objects of each schema. Base tables are
//! scanned; views are substituted into referencing queries. View definitions
//! are loaded from the metastore on first use and replaced wholesale on
//! refresh, so a failed refresh never disturbs the previously loaded view.

use hashbrown::HashMap;
use ironview_common::{Error, Result};
use ironview_parser::ast::Query;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

mod column;
mod config;
mod entry;
mod loader;
pub mod metastore;
mod schema;
mod serialized;
mod substitute;
mod table;
mod view;

pub use column::{materialize_columns, Column, ColumnId};
pub use config::CatalogConfig;
pub use entry::{CatalogObjectKind, CatalogTable};
pub use loader::{ViewLoader, DIAGNOSTICS_TARGET};
pub use metastore::{
    FieldSchema, InMemoryMetaStore, MetaStore, MetaStoreTable, MetaStoreTableType,
};
pub use schema::{Schema, SchemaId};
pub use serialized::{SerializedTable, TableKind};
pub use substitute::{LocalViews, ViewResolver, ViewSubstitutor};
pub use table::{Partition, PartitionId, ScanDescriptor, Table, TableId};
pub use view::{View, ViewDefinition, ViewId};

/// Unique identifier for catalog entries
pub type CatalogId = u64;

/// The main catalog that holds all database objects
pub struct Catalog {
    config: CatalogConfig,
    metastore: Arc<dyn MetaStore>,
    loader: ViewLoader,
    /// All schemas in the catalog
    schemas: RwLock<HashMap<String, Arc<Schema>>>,
    /// Next available ID for new objects
    next_id: AtomicU64,
}

impl Catalog {
    /// Create a catalog over `metastore` with the configured default schema
    pub fn new(config: CatalogConfig, metastore: Arc<dyn MetaStore>) -> Self {
        let default_schema = config.default_schema.to_lowercase();
        let catalog = Catalog {
            loader: ViewLoader::new(config.parser.clone()),
            config,
            metastore,
            schemas: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        };

        catalog.schemas.write().insert(
            default_schema.clone(),
            Arc::new(Schema::new(0, default_schema)),
        );

        catalog
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Get the next unique ID
    fn next_id(&self) -> CatalogId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Get a schema by name (case-insensitive)
    pub fn get_schema(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.read().get(&name.to_lowercase()).cloned()
    }

    fn schema(&self, name: &str) -> Result<Arc<Schema>> {
        self.get_schema(name)
            .ok_or_else(|| Error::SchemaNotFound(name.to_string()))
    }

    /// Create a new schema (name is normalized to lowercase)
    pub fn create_schema(&self, name: &str) -> Result<Arc<Schema>> {
        let mut schemas = self.schemas.write();
        let name_lower = name.to_lowercase();
        if schemas.contains_key(&name_lower) {
            return Err(Error::SchemaAlreadyExists(name.to_string()));
        }

        let schema = Arc::new(Schema::new(self.next_id(), name_lower.clone()));
        schemas.insert(name_lower, schema.clone());
        Ok(schema)
    }

    /// List all schema names
    pub fn list_schemas(&self) -> Vec<String> {
        self.schemas.read().keys().cloned().collect()
    }

    /// Get an entry by schema and name
    pub fn get_entry(&self, schema_name: &str, name: &str) -> Option<Arc<CatalogTable>> {
        self.get_schema(schema_name)?.get_entry(name)
    }

    /// Register a persisted view without loading its definition
    pub fn register_view(
        &self,
        schema_name: &str,
        view_name: &str,
        owner: Option<String>,
    ) -> Result<ViewId> {
        let schema = self.schema(schema_name)?;
        let id = self.next_id();
        let view = View::new(id, schema.name.clone(), view_name.to_lowercase(), owner);
        schema.add_entry(view_name, CatalogTable::View(Arc::new(view)))?;
        Ok(id)
    }

    /// Load `schema.name` from the metastore, whichever kind of object it is.
    ///
    /// Views get an unloaded entry first and are then refreshed; base tables
    /// are installed directly.
    pub fn load(&self, schema_name: &str, name: &str) -> Result<Arc<CatalogTable>> {
        let schema = self.schema(schema_name)?;
        let name = name.to_lowercase();
        let ms_table = self.metastore.get_table(&schema.name, &name)?;

        if ms_table.is_view() {
            let owner = ms_table.owner.clone();
            schema.get_or_add(&name, || {
                let view = View::new(self.next_id(), schema.name.clone(), name.clone(), owner);
                CatalogTable::View(Arc::new(view))
            });
            self.refresh_view(&schema.name, &name)?;
            return schema
                .get_entry(&name)
                .ok_or_else(|| Error::ViewNotFound(format!("{}.{}", schema.name, name)));
        }

        let id = schema
            .get_entry(&name)
            .and_then(|entry| entry.id())
            .unwrap_or_else(|| self.next_id());
        let mut fields = ms_table.partition_keys.clone();
        fields.extend(self.metastore.get_fields(&schema.name, &name)?);
        let columns = materialize_columns(&fields)?;
        let partitions = self.metastore.get_partitions(&schema.name, &name)?;

        let mut table = Table::new(id, schema.name.clone(), name.clone(), columns)
            .with_clustering_columns(ms_table.partition_keys.len())
            .with_partitions(partitions);
        table.owner = ms_table.owner;
        debug!(table = %table.qualified_name(), "loaded table");
        Ok(schema.replace_entry(&name, CatalogTable::Base(table)))
    }

    /// Reload the definition of a registered view.
    ///
    /// On success the entry is replaced by a newly loaded view. On failure the
    /// existing entry, loaded or not, stays exactly as it was.
    pub fn refresh_view(&self, schema_name: &str, view_name: &str) -> Result<Arc<View>> {
        let schema = self.schema(schema_name)?;
        let current = match schema.get_entry(view_name).as_deref() {
            Some(CatalogTable::View(view)) if !view.is_local() => view.clone(),
            _ => return Err(Error::ViewNotFound(format!("{}.{}", schema.name, view_name))),
        };

        let definition = self
            .loader
            .load_persisted(self.metastore.as_ref(), current.schema_name(), current.name())
            .map_err(|e| {
                warn!(view = %current.qualified_name(), error = %e, "failed to load view");
                Error::TableLoading(e)
            })?;

        let loaded = Arc::new(current.with_definition(definition));
        schema.replace_entry(view_name, CatalogTable::View(loaded.clone()));
        Ok(loaded)
    }

    /// Get a view, loading its definition if it has not been loaded yet
    pub fn get_view(&self, schema_name: &str, view_name: &str) -> Result<Arc<View>> {
        match self.get_entry(schema_name, view_name).as_deref() {
            Some(CatalogTable::View(view)) if view.is_loaded() => Ok(view.clone()),
            Some(CatalogTable::View(_)) => self.refresh_view(schema_name, view_name),
            _ => Err(Error::ViewNotFound(format!("{}.{}", schema_name, view_name))),
        }
    }

    /// Drop the loaded state of an entry.
    ///
    /// A view goes back to an unloaded entry with the same identity; a base
    /// table is evicted and must be loaded again.
    pub fn invalidate(&self, schema_name: &str, name: &str) -> Result<()> {
        let schema = self.schema(schema_name)?;
        match schema.get_entry(name).as_deref() {
            Some(CatalogTable::View(view)) => {
                schema.replace_entry(name, CatalogTable::View(Arc::new(view.unloaded())));
            }
            Some(CatalogTable::Base(_)) => {
                schema.remove_entry(name);
            }
            None => return Err(Error::TableNotFound(format!("{}.{}", schema.name, name))),
        }
        debug!(schema = %schema.name, name, "invalidated catalog entry");
        Ok(())
    }

    /// Serialize an entry for shipping to another process
    pub fn serialize_entry(&self, schema_name: &str, name: &str) -> Result<String> {
        let entry = self
            .get_entry(schema_name, name)
            .ok_or_else(|| Error::TableNotFound(format!("{}.{}", schema_name, name)))?;
        entry.to_serialized()?.to_json()
    }

    /// Install an entry received in serialized form.
    ///
    /// Views are re-parsed and re-validated locally rather than trusted.
    pub fn apply_serialized(&self, json: &str) -> Result<Arc<CatalogTable>> {
        let serialized = SerializedTable::from_json(json)?;
        let schema = self.schema(&serialized.schema)?;
        let entry = match serialized.table_kind {
            TableKind::View => {
                let view = self.loader.load_serialized(&serialized).map_err(|e| {
                    warn!(
                        view = %format!("{}.{}", serialized.schema, serialized.name),
                        error = %e,
                        "failed to load serialized view"
                    );
                    Error::TableLoading(e)
                })?;
                CatalogTable::View(Arc::new(view))
            }
            TableKind::Table => CatalogTable::Base(serialized.to_table()?),
        };
        Ok(schema.replace_entry(&serialized.name, entry))
    }

    /// Replace references to catalog views in `query` with their definitions
    pub fn substitute_views(&self, query: &mut Query) -> Result<()> {
        ViewSubstitutor::new(self, &self.config.default_schema, self.config.max_view_nesting)
            .substitute(query)
    }
}

impl ViewResolver for Catalog {
    /// Base tables and unknown names resolve to None. Unloaded views are
    /// loaded here, so a broken definition fails the resolution.
    fn resolve_view(&self, schema: &str, name: &str) -> Result<Option<Arc<View>>> {
        match self.get_entry(schema, name).as_deref() {
            Some(CatalogTable::View(_)) => self.get_view(schema, name).map(Some),
            _ => Ok(None),
        }
    }
}
