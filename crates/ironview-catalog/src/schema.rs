//! Schema management

use super::{CatalogId, CatalogTable};
use hashbrown::HashMap;
use ironview_common::{Error, Result};
use parking_lot::RwLock;
use std::sync::Arc;

pub type SchemaId = CatalogId;

/// A schema (database) holding tables and views.
///
/// Entries are immutable once inserted; reloading an object swaps in a new
/// `Arc` so readers holding the old one are unaffected.
pub struct Schema {
    /// Unique identifier
    pub id: SchemaId,
    /// Schema name
    pub name: String,
    entries: RwLock<HashMap<String, Arc<CatalogTable>>>,
}

impl Schema {
    pub fn new(id: SchemaId, name: String) -> Self {
        Schema {
            id,
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Add an entry under `name` (case-insensitive)
    pub fn add_entry(&self, name: &str, entry: CatalogTable) -> Result<Arc<CatalogTable>> {
        let mut entries = self.entries.write();
        let name_lower = name.to_lowercase();
        if entries.contains_key(&name_lower) {
            return Err(Error::TableAlreadyExists(format!("{}.{}", self.name, name_lower)));
        }
        let entry = Arc::new(entry);
        entries.insert(name_lower, entry.clone());
        Ok(entry)
    }

    /// Get the entry under `name`, adding the one built by `make` if there is
    /// none. Lookup and insert happen under one write lock.
    pub fn get_or_add(
        &self,
        name: &str,
        make: impl FnOnce() -> CatalogTable,
    ) -> Arc<CatalogTable> {
        self.entries
            .write()
            .entry(name.to_lowercase())
            .or_insert_with(|| Arc::new(make()))
            .clone()
    }

    /// Insert or replace the entry under `name`
    pub fn replace_entry(&self, name: &str, entry: CatalogTable) -> Arc<CatalogTable> {
        let entry = Arc::new(entry);
        self.entries
            .write()
            .insert(name.to_lowercase(), entry.clone());
        entry
    }

    /// Get an entry by name (case-insensitive)
    pub fn get_entry(&self, name: &str) -> Option<Arc<CatalogTable>> {
        self.entries.read().get(&name.to_lowercase()).cloned()
    }

    pub fn remove_entry(&self, name: &str) -> Option<Arc<CatalogTable>> {
        self.entries.write().remove(&name.to_lowercase())
    }

    /// List all entry names in this schema
    pub fn list_entries(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}
