//! Serialized form of catalog tables and views
//!
//! This is what catalog objects look like when shipped between processes.
//! Views travel with their definition text only; the receiver re-parses it
//! (see [`ViewLoader::load_serialized`](crate::ViewLoader::load_serialized)).

use crate::table::{Partition, Table};
use crate::view::View;
use crate::column::{has_dense_positions, Column};
use ironview_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Discriminator telling the receiver how to rebuild the object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableKind {
    Table,
    View,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedTable {
    pub table_kind: TableKind,
    pub id: Option<u64>,
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub num_clustering_columns: usize,
    #[serde(default)]
    pub num_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_original_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_expanded_text: Option<String>,
    /// Scan metadata, base tables only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitions: Option<Vec<Partition>>,
}

impl SerializedTable {
    pub fn from_table(table: &Table) -> Self {
        SerializedTable {
            table_kind: TableKind::Table,
            id: Some(table.id),
            schema: table.schema.clone(),
            name: table.name.clone(),
            owner: table.owner.clone(),
            columns: table.columns.clone(),
            num_clustering_columns: table.num_clustering_columns,
            num_rows: table.num_rows,
            view_original_text: None,
            view_expanded_text: None,
            partitions: Some(table.partitions.clone()),
        }
    }

    /// Serialize a loaded catalog view.
    ///
    /// Local views live for one query and unloaded views have nothing to ship,
    /// so both are rejected.
    pub fn from_view(view: &View) -> Result<Self> {
        if view.is_local() {
            return Err(Error::Internal(format!(
                "local view {} cannot be serialized",
                view.name()
            )));
        }
        let (Some(id), Some(definition)) = (view.id(), view.definition()) else {
            return Err(Error::Internal(format!(
                "view {} is not loaded",
                view.qualified_name()
            )));
        };
        Ok(SerializedTable {
            table_kind: TableKind::View,
            id: Some(id),
            schema: view.schema_name().to_string(),
            name: view.name().to_string(),
            owner: view.owner().map(str::to_string),
            columns: definition.columns.clone(),
            num_clustering_columns: view.num_clustering_columns(),
            num_rows: view.num_rows(),
            view_original_text: definition.original_text.clone(),
            view_expanded_text: Some(definition.expanded_text.clone()),
            partitions: None,
        })
    }

    /// Rebuild a base table. Views go through the loader instead.
    pub fn to_table(&self) -> Result<Table> {
        let id = match (self.table_kind, self.id) {
            (TableKind::Table, Some(id)) => id,
            (TableKind::View, _) => {
                return Err(Error::Serialization(format!(
                    "{}.{} is a view, not a table",
                    self.schema, self.name
                )))
            }
            (TableKind::Table, None) => {
                return Err(Error::Serialization("serialized table has no id".to_string()))
            }
        };
        if !has_dense_positions(&self.columns) {
            return Err(Error::Serialization(format!(
                "column positions of {}.{} are not dense",
                self.schema, self.name
            )));
        }
        Ok(Table {
            id,
            schema: self.schema.clone(),
            name: self.name.clone(),
            owner: self.owner.clone(),
            columns: self.columns.clone(),
            num_clustering_columns: self.num_clustering_columns,
            num_rows: self.num_rows,
            partitions: self.partitions.clone().unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewDefinition;
    use ironview_common::LogicalType;
    use ironview_parser::ast::Statement;
    use ironview_parser::{parse_statement, ParserOptions};

    fn loaded_view() -> View {
        let query = match parse_statement("SELECT id FROM orders", &ParserOptions::default()) {
            Ok(Statement::Query(query)) => *query,
            other => panic!("unexpected parse result: {other:?}"),
        };
        View::new(4, "shop".to_string(), "recent".to_string(), Some("ops".to_string()))
            .with_definition(ViewDefinition {
                original_text: Some("select id from orders".to_string()),
                expanded_text: "SELECT id FROM orders".to_string(),
                query,
                columns: vec![Column::new("id".to_string(), LogicalType::BigInt, 0)],
            })
    }

    #[test]
    fn test_view_sets_kind_and_leaves_scan_fields_unset() {
        let serialized = SerializedTable::from_view(&loaded_view()).unwrap();
        assert_eq!(serialized.table_kind, TableKind::View);
        assert_eq!(serialized.partitions, None);
        assert_eq!(serialized.num_rows, None);
        assert_eq!(serialized.num_clustering_columns, 0);

        let json = serialized.to_json().unwrap();
        assert!(json.contains(r#""table_kind":"VIEW""#));
        assert!(!json.contains("partitions"));
        assert_eq!(SerializedTable::from_json(&json).unwrap(), serialized);
    }

    #[test]
    fn test_unloaded_and_local_views_are_rejected() {
        let shell = loaded_view().unloaded();
        assert!(SerializedTable::from_view(&shell).is_err());

        let query = loaded_view().query().cloned().unwrap();
        assert!(SerializedTable::from_view(&View::local("l", query)).is_err());
    }

    #[test]
    fn test_table_round_trip() {
        let table = Table::new(
            2,
            "shop".to_string(),
            "orders".to_string(),
            vec![Column::new("id".to_string(), LogicalType::BigInt, 0)],
        )
        .with_partitions(vec![Partition::new(1, "node-a")]);

        let serialized = SerializedTable::from_table(&table);
        assert_eq!(serialized.table_kind, TableKind::Table);
        assert_eq!(serialized.to_table().unwrap(), table);
    }

    #[test]
    fn test_table_with_gapped_positions_is_rejected() {
        let table = Table::new(
            2,
            "shop".to_string(),
            "orders".to_string(),
            vec![
                Column::new("id".to_string(), LogicalType::BigInt, 0),
                Column::new("total".to_string(), LogicalType::Double, 1),
            ],
        );
        let mut serialized = SerializedTable::from_table(&table);
        serialized.columns[1].position = 3;
        assert!(matches!(serialized.to_table(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_view_cannot_become_table() {
        let serialized = SerializedTable::from_view(&loaded_view()).unwrap();
        assert!(matches!(serialized.to_table(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SerializedTable::from_json("{\"table_kind\":\"SEQUENCE\"}"),
            Err(Error::Serialization(_))
        ));
    }
}
