//! End-to-end view loading through the public API

use ironview::catalog::{
    CatalogTable, FieldSchema, InMemoryMetaStore, MetaStore, MetaStoreTable, Partition, View,
};
use ironview::common::{Error, LogicalType, Result, TableLoadingErrorKind};
use ironview::parser::ast::Statement;
use ironview::parser::{parse_statement, ParserOptions};
use ironview::Database;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Metastore wrapper counting table lookups
#[derive(Default)]
struct CountingMetaStore {
    inner: InMemoryMetaStore,
    lookups: AtomicUsize,
}

impl CountingMetaStore {
    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl MetaStore for CountingMetaStore {
    fn get_table(&self, db: &str, table: &str) -> Result<MetaStoreTable> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_table(db, table)
    }

    fn get_fields(&self, db: &str, table: &str) -> Result<Vec<FieldSchema>> {
        self.inner.get_fields(db, table)
    }

    fn get_partitions(&self, db: &str, table: &str) -> Result<Vec<Partition>> {
        self.inner.get_partitions(db, table)
    }
}

fn database_with_view(
    expanded: &str,
    fields: Vec<FieldSchema>,
) -> (Database, Arc<CountingMetaStore>) {
    init_logging();
    let store = Arc::new(CountingMetaStore::default());
    store.inner.put_table(
        MetaStoreTable::view("default", "v", "select * from t", expanded),
        fields,
    );
    let db = Database::new(store.clone());
    db.catalog().register_view("default", "v", None).unwrap();
    (db, store)
}

fn loading_error(err: Error) -> (TableLoadingErrorKind, String) {
    match err {
        Error::TableLoading(e) => (e.kind(), e.to_string()),
        other => panic!("expected a table loading error, got: {other}"),
    }
}

#[test]
fn select_view_loads_columns_and_query() {
    let (db, _) = database_with_view(
        "SELECT a, b FROM t",
        vec![FieldSchema::new("a", "INT"), FieldSchema::new("b", "STRING")],
    );
    let view = db.catalog().get_view("default", "v").unwrap();

    let direct = match parse_statement("SELECT a, b FROM t", &ParserOptions::default()).unwrap() {
        Statement::Query(query) => *query,
        other => panic!("not a query: {other}"),
    };
    assert_eq!(view.query(), Some(&direct));

    let columns: Vec<_> = view
        .columns()
        .iter()
        .map(|c| (c.name.as_str(), c.logical_type.clone(), c.position))
        .collect();
    assert_eq!(
        columns,
        vec![("a", LogicalType::Integer, 0), ("b", LogicalType::Varchar, 1)]
    );
    assert_eq!(view.original_definition_text(), Some("select * from t"));
}

#[test]
fn column_positions_follow_input_order() {
    let fields: Vec<_> = (0..12)
        .map(|i| FieldSchema::new(format!("c{i}"), "bigint"))
        .collect();
    let (db, _) = database_with_view("SELECT 1", fields);
    let view = db.catalog().get_view("default", "v").unwrap();

    assert_eq!(view.columns().len(), 12);
    for (i, column) in view.columns().iter().enumerate() {
        assert_eq!(column.position as usize, i);
        assert_eq!(column.name, format!("c{i}"));
    }
}

#[test]
fn insert_definition_is_not_a_query() {
    let (db, _) = database_with_view("INSERT INTO t VALUES (1)", Vec::new());
    let (kind, message) = loading_error(db.catalog().get_view("default", "v").unwrap_err());
    assert_eq!(kind, TableLoadingErrorKind::NotAQuery);
    assert!(message.ends_with("is not a query statement"), "{message}");
}

#[test]
fn unparsable_definition_hides_diagnostics() {
    let (db, _) = database_with_view("SELECT FROM (((", Vec::new());
    let (kind, message) = loading_error(db.catalog().get_view("default", "v").unwrap_err());
    assert_eq!(kind, TableLoadingErrorKind::DefinitionParse);
    assert_eq!(
        message,
        "Failed to parse view-definition statement of view: default.v"
    );
    assert!(!message.contains("((("));
    assert!(!message.to_lowercase().contains("expected"));
}

#[test]
fn scans_fail_on_views() {
    let (db, _) = database_with_view("SELECT 1", Vec::new());
    let shell = db.catalog().get_entry("default", "v").unwrap();
    let loaded = db.catalog().load("default", "v").unwrap();

    for entry in [shell, loaded] {
        assert!(matches!(
            entry.estimated_scan_node_count(),
            Err(Error::InvalidOperation { .. })
        ));
        assert!(matches!(
            entry.physical_scan_descriptor(&BTreeSet::new()),
            Err(Error::InvalidOperation { .. })
        ));
    }
}

#[test]
fn repeated_loads_are_equal() {
    let (db, store) = database_with_view(
        "SELECT a FROM t WHERE a > 0",
        vec![FieldSchema::new("a", "decimal(12,2)")],
    );
    let first = db.catalog().refresh_view("default", "v").unwrap();
    let second = db.catalog().refresh_view("default", "v").unwrap();
    assert_eq!(first, second);
    assert_eq!(store.lookups(), 2);
}

#[test]
fn local_view_never_touches_the_metastore() {
    let (db, store) = database_with_view("SELECT 1", Vec::new());
    let query = db
        .prepare_with_local_views("SELECT x FROM recent", &[("recent", "SELECT 1 AS x")])
        .unwrap();
    assert_eq!(query.to_string(), "SELECT x FROM (SELECT 1 AS x) AS recent");
    assert_eq!(store.lookups(), 0);

    let local = match parse_statement("SELECT 1 AS x", &ParserOptions::default()).unwrap() {
        Statement::Query(query) => View::local("recent", *query),
        other => panic!("not a query: {other}"),
    };
    assert!(local.is_local());
    assert!(local.is_loaded());
    assert_eq!(local.id(), None);
}

#[test]
fn failed_refresh_keeps_serving_previous_definition() {
    let (db, store) = database_with_view("SELECT a FROM t", vec![FieldSchema::new("a", "int")]);
    assert_eq!(
        db.prepare("SELECT a FROM v").unwrap().to_string(),
        "SELECT a FROM (SELECT a FROM t) AS v"
    );

    store.inner.put_table(
        MetaStoreTable::view("default", "v", "broken", "SELECT a FROM"),
        vec![FieldSchema::new("a", "int")],
    );
    assert!(db.catalog().refresh_view("default", "v").is_err());
    assert_eq!(
        db.prepare("SELECT a FROM v").unwrap().to_string(),
        "SELECT a FROM (SELECT a FROM t) AS v"
    );
}

#[test]
fn serialized_view_travels_between_catalogs() {
    let (source, _) = database_with_view("SELECT a FROM t", vec![FieldSchema::new("a", "int")]);
    source.catalog().get_view("default", "v").unwrap();
    let json = source.catalog().serialize_entry("default", "v").unwrap();

    let target = Database::new(Arc::new(InMemoryMetaStore::new()));
    let entry = target.catalog().apply_serialized(&json).unwrap();
    assert!(matches!(entry.as_ref(), CatalogTable::View(view) if view.is_loaded()));
    assert_eq!(
        target.prepare("SELECT a FROM v").unwrap().to_string(),
        "SELECT a FROM (SELECT a FROM t) AS v"
    );
}
