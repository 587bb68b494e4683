//! Base tables backed by physical storage

use super::{CatalogId, Column};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub type TableId = CatalogId;
pub type PartitionId = u64;

/// A physical partition of a base table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub id: PartitionId,
    /// Host holding the partition's data
    pub host: String,
}

impl Partition {
    pub fn new(id: PartitionId, host: impl Into<String>) -> Self {
        Partition {
            id,
            host: host.into(),
        }
    }
}

/// What the planner needs to scan a base table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDescriptor {
    pub table_id: TableId,
    pub qualified_name: String,
    pub num_columns: usize,
    pub num_clustering_columns: usize,
    /// Only the partitions the query references
    pub partitions: Vec<Partition>,
}

/// A table in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Unique identifier
    pub id: TableId,
    /// Schema (database) name
    pub schema: String,
    /// Table name
    pub name: String,
    pub owner: Option<String>,
    /// Columns in this table, clustering columns first
    pub columns: Vec<Column>,
    pub num_clustering_columns: usize,
    /// Row count statistic, None if unknown
    pub num_rows: Option<u64>,
    pub partitions: Vec<Partition>,
}

impl Table {
    pub fn new(id: TableId, schema: String, name: String, columns: Vec<Column>) -> Self {
        Table {
            id,
            schema,
            name,
            owner: None,
            columns,
            num_clustering_columns: 0,
            num_rows: None,
            partitions: Vec::new(),
        }
    }

    pub fn with_clustering_columns(mut self, count: usize) -> Self {
        self.num_clustering_columns = count;
        self
    }

    pub fn with_partitions(mut self, partitions: Vec<Partition>) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of distinct hosts a scan of this table touches, at least 1
    pub fn estimated_scan_node_count(&self) -> usize {
        let hosts: HashSet<&str> = self.partitions.iter().map(|p| p.host.as_str()).collect();
        hosts.len().max(1)
    }

    /// Describe a scan over the referenced partitions.
    /// Ids that match no partition are ignored.
    pub fn physical_scan_descriptor(&self, referenced: &BTreeSet<PartitionId>) -> ScanDescriptor {
        ScanDescriptor {
            table_id: self.id,
            qualified_name: self.qualified_name(),
            num_columns: self.columns.len(),
            num_clustering_columns: self.num_clustering_columns,
            partitions: self
                .partitions
                .iter()
                .filter(|p| referenced.contains(&p.id))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironview_common::LogicalType;

    fn sales() -> Table {
        Table::new(
            7,
            "shop".to_string(),
            "sales".to_string(),
            vec![
                Column::new("day".to_string(), LogicalType::Date, 0),
                Column::new("amount".to_string(), LogicalType::Double, 1),
            ],
        )
        .with_clustering_columns(1)
        .with_partitions(vec![
            Partition::new(1, "node-a"),
            Partition::new(2, "node-b"),
            Partition::new(3, "node-a"),
        ])
    }

    #[test]
    fn test_scan_node_count_counts_distinct_hosts() {
        assert_eq!(sales().estimated_scan_node_count(), 2);

        let empty = Table::new(1, "s".to_string(), "t".to_string(), Vec::new());
        assert_eq!(empty.estimated_scan_node_count(), 1);
    }

    #[test]
    fn test_scan_descriptor_keeps_referenced_partitions() {
        let table = sales();
        let referenced: BTreeSet<PartitionId> = [1, 3, 99].into_iter().collect();
        let desc = table.physical_scan_descriptor(&referenced);

        assert_eq!(desc.table_id, 7);
        assert_eq!(desc.qualified_name, "shop.sales");
        assert_eq!(desc.num_columns, 2);
        assert_eq!(desc.num_clustering_columns, 1);
        let ids: Vec<_> = desc.partitions.iter().map(|p| p.id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn test_get_column() {
        let table = sales();
        assert_eq!(table.get_column("amount").map(|c| c.position), Some(1));
        assert!(table.get_column("missing").is_none());
    }
}
