//! Metastore interface
//!
//! The metastore is the external source of truth for persisted tables and
//! views. The catalog only reads from it: column schemas, the table type and,
//! for views, the original and expanded definition text.

use crate::table::Partition;
use hashbrown::HashMap;
use ironview_common::{Error, Result};
use parking_lot::RwLock;

/// Raw column schema as stored in the metastore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    /// Unparsed type, e.g. `int` or `map<string,bigint>`
    pub type_descriptor: String,
    pub comment: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, type_descriptor: impl Into<String>) -> Self {
        FieldSchema {
            name: name.into(),
            type_descriptor: type_descriptor.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Kind of object recorded in the metastore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaStoreTableType {
    ManagedTable,
    ExternalTable,
    VirtualView,
}

/// Table-level metastore record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaStoreTable {
    pub db_name: String,
    pub table_name: String,
    pub owner: Option<String>,
    pub table_type: MetaStoreTableType,
    /// Partition key columns; they precede the regular columns
    pub partition_keys: Vec<FieldSchema>,
    /// View definition as the user wrote it
    pub view_original_text: Option<String>,
    /// View definition rewritten for substitution
    pub view_expanded_text: Option<String>,
}

impl MetaStoreTable {
    pub fn table(db_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        MetaStoreTable {
            db_name: db_name.into(),
            table_name: table_name.into(),
            owner: None,
            table_type: MetaStoreTableType::ManagedTable,
            partition_keys: Vec::new(),
            view_original_text: None,
            view_expanded_text: None,
        }
    }

    pub fn view(
        db_name: impl Into<String>,
        table_name: impl Into<String>,
        original_text: impl Into<String>,
        expanded_text: impl Into<String>,
    ) -> Self {
        MetaStoreTable {
            table_type: MetaStoreTableType::VirtualView,
            view_original_text: Some(original_text.into()),
            view_expanded_text: Some(expanded_text.into()),
            ..MetaStoreTable::table(db_name, table_name)
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_partition_keys(mut self, keys: Vec<FieldSchema>) -> Self {
        self.partition_keys = keys;
        self
    }

    pub fn is_view(&self) -> bool {
        self.table_type == MetaStoreTableType::VirtualView
    }
}

/// Read access to the metastore.
///
/// Calls are blocking. Implementations must be safe to share between threads;
/// the catalog never holds its own locks while calling into the metastore.
pub trait MetaStore: Send + Sync {
    /// Fetch the table-level record of `db.table`
    fn get_table(&self, db: &str, table: &str) -> Result<MetaStoreTable>;

    /// Fetch the regular (non-partition) columns of `db.table`, in order
    fn get_fields(&self, db: &str, table: &str) -> Result<Vec<FieldSchema>>;

    /// Fetch the partitions of a base table
    fn get_partitions(&self, _db: &str, _table: &str) -> Result<Vec<Partition>> {
        Ok(Vec::new())
    }
}

struct StoredTable {
    table: MetaStoreTable,
    fields: Vec<FieldSchema>,
    partitions: Vec<Partition>,
}

/// A metastore kept in memory, for embedding and tests
#[derive(Default)]
pub struct InMemoryMetaStore {
    tables: RwLock<HashMap<(String, String), StoredTable>>,
}

impl InMemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a table record together with its columns
    pub fn put_table(&self, table: MetaStoreTable, fields: Vec<FieldSchema>) {
        self.put_table_with_partitions(table, fields, Vec::new());
    }

    pub fn put_table_with_partitions(
        &self,
        table: MetaStoreTable,
        fields: Vec<FieldSchema>,
        partitions: Vec<Partition>,
    ) {
        let key = Self::key(&table.db_name, &table.table_name);
        self.tables.write().insert(
            key,
            StoredTable {
                table,
                fields,
                partitions,
            },
        );
    }

    pub fn remove_table(&self, db: &str, table: &str) -> bool {
        self.tables.write().remove(&Self::key(db, table)).is_some()
    }

    fn key(db: &str, table: &str) -> (String, String) {
        (db.to_lowercase(), table.to_lowercase())
    }

    fn with_table<T>(
        &self,
        db: &str,
        table: &str,
        f: impl FnOnce(&StoredTable) -> T,
    ) -> Result<T> {
        self.tables
            .read()
            .get(&Self::key(db, table))
            .map(f)
            .ok_or_else(|| Error::Metastore(format!("no such table: {}.{}", db, table)))
    }
}

impl MetaStore for InMemoryMetaStore {
    fn get_table(&self, db: &str, table: &str) -> Result<MetaStoreTable> {
        self.with_table(db, table, |stored| stored.table.clone())
    }

    fn get_fields(&self, db: &str, table: &str) -> Result<Vec<FieldSchema>> {
        self.with_table(db, table, |stored| stored.fields.clone())
    }

    fn get_partitions(&self, db: &str, table: &str) -> Result<Vec<Partition>> {
        self.with_table(db, table, |stored| stored.partitions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_lookup_is_case_insensitive() {
        let store = InMemoryMetaStore::new();
        store.put_table(
            MetaStoreTable::view("Sales", "Totals", "SELECT 1", "SELECT 1"),
            vec![FieldSchema::new("x", "int")],
        );

        let table = store.get_table("sales", "TOTALS").unwrap();
        assert!(table.is_view());
        assert_eq!(table.view_expanded_text.as_deref(), Some("SELECT 1"));
        assert_eq!(store.get_fields("SALES", "totals").unwrap().len(), 1);
        assert!(store.get_partitions("sales", "totals").unwrap().is_empty());
    }

    #[test]
    fn test_missing_table() {
        let store = InMemoryMetaStore::new();
        assert!(matches!(
            store.get_table("db", "nope"),
            Err(Error::Metastore(_))
        ));
        store.put_table(MetaStoreTable::table("db", "t"), Vec::new());
        assert!(store.remove_table("db", "t"));
        assert!(store.get_fields("db", "t").is_err());
    }
}
