//! Catalog entries: the closed set of table-like objects

use crate::serialized::SerializedTable;
use crate::{CatalogId, Column, PartitionId, ScanDescriptor, Table, View};
use ironview_common::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Kind of catalog object, for code that walks the catalog generically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogObjectKind {
    Table,
    View,
}

/// A table-like catalog entry.
///
/// Scan-only operations succeed for base tables and fail with
/// `Error::InvalidOperation` for views.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogTable {
    Base(Table),
    View(Arc<View>),
}

impl CatalogTable {
    pub fn id(&self) -> Option<CatalogId> {
        match self {
            CatalogTable::Base(table) => Some(table.id),
            CatalogTable::View(view) => view.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CatalogTable::Base(table) => &table.name,
            CatalogTable::View(view) => view.name(),
        }
    }

    pub fn qualified_name(&self) -> String {
        match self {
            CatalogTable::Base(table) => table.qualified_name(),
            CatalogTable::View(view) => view.qualified_name(),
        }
    }

    pub fn object_kind(&self) -> CatalogObjectKind {
        match self {
            CatalogTable::Base(_) => CatalogObjectKind::Table,
            CatalogTable::View(_) => CatalogObjectKind::View,
        }
    }

    pub fn columns(&self) -> &[Column] {
        match self {
            CatalogTable::Base(table) => &table.columns,
            CatalogTable::View(view) => view.columns(),
        }
    }

    /// True when the entry must be substituted rather than scanned
    pub fn is_virtual(&self) -> bool {
        match self {
            CatalogTable::Base(_) => false,
            CatalogTable::View(view) => view.is_virtual(),
        }
    }

    pub fn num_clustering_columns(&self) -> usize {
        match self {
            CatalogTable::Base(table) => table.num_clustering_columns,
            CatalogTable::View(view) => view.num_clustering_columns(),
        }
    }

    pub fn num_rows(&self) -> Option<u64> {
        match self {
            CatalogTable::Base(table) => table.num_rows,
            CatalogTable::View(view) => view.num_rows(),
        }
    }

    pub fn estimated_scan_node_count(&self) -> Result<usize> {
        match self {
            CatalogTable::Base(table) => Ok(table.estimated_scan_node_count()),
            CatalogTable::View(view) => view.estimated_scan_node_count(),
        }
    }

    pub fn physical_scan_descriptor(
        &self,
        referenced: &BTreeSet<PartitionId>,
    ) -> Result<ScanDescriptor> {
        match self {
            CatalogTable::Base(table) => Ok(table.physical_scan_descriptor(referenced)),
            CatalogTable::View(view) => view.physical_scan_descriptor(referenced),
        }
    }

    pub fn to_serialized(&self) -> Result<SerializedTable> {
        match self {
            CatalogTable::Base(table) => Ok(SerializedTable::from_table(table)),
            CatalogTable::View(view) => SerializedTable::from_view(view),
        }
    }

    pub fn as_view(&self) -> Option<&View> {
        match self {
            CatalogTable::View(view) => Some(view.as_ref()),
            CatalogTable::Base(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            CatalogTable::Base(table) => Some(table),
            CatalogTable::View(_) => None,
        }
    }
}
