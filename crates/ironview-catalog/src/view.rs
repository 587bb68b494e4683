//! View definition
//!
//! A view is a catalog object whose rows come from a stored query. Query
//! analysis never scans a view; it substitutes the view's parsed query
//! wherever the view is referenced. Refreshing or invalidating a view reloads
//! its own definition only, never the tables the definition refers to.
//!
//! A catalog view starts as an unloaded shell that knows its identity and
//! where its definition lives. Loading produces a new `View` holding every
//! definition field at once; an existing `View` is never filled in piecemeal.

use super::{CatalogId, Column, PartitionId, ScanDescriptor};
use ironview_common::{Error, Result};
use ironview_parser::ast::Query;
use std::collections::BTreeSet;

/// Unique identifier for a view
pub type ViewId = CatalogId;

/// Everything a successful load produces, installed together
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDefinition {
    /// The definition as the user wrote it. Never parsed.
    pub original_text: Option<String>,
    /// The canonical definition that `query` was parsed from
    pub expanded_text: String,
    pub query: Query,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
enum ViewState {
    /// Identity only, definition not loaded yet
    Unloaded,
    Loaded(ViewDefinition),
    /// Query-scoped view built from an already parsed query (WITH clause)
    Local(Query),
}

/// A view in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    id: Option<ViewId>,
    schema: String,
    name: String,
    owner: Option<String>,
    state: ViewState,
}

impl View {
    /// An unloaded catalog view
    pub fn new(id: ViewId, schema: String, name: String, owner: Option<String>) -> Self {
        View {
            id: Some(id),
            schema,
            name,
            owner,
            state: ViewState::Unloaded,
        }
    }

    /// A local view for a WITH-clause entry that already has a parsed query
    pub fn local(alias: impl Into<String>, query: Query) -> Self {
        View {
            id: None,
            schema: String::new(),
            name: alias.into(),
            owner: None,
            state: ViewState::Local(query),
        }
    }

    /// A copy of this view's identity carrying `definition`.
    ///
    /// `self` is left untouched, so a reader holding the old view keeps a
    /// consistent picture while the new one is installed.
    pub fn with_definition(&self, definition: ViewDefinition) -> View {
        View {
            state: ViewState::Loaded(definition),
            ..self.unloaded()
        }
    }

    /// A fresh unloaded shell with this view's identity
    pub fn unloaded(&self) -> View {
        View {
            id: self.id,
            schema: self.schema.clone(),
            name: self.name.clone(),
            owner: self.owner.clone(),
            state: ViewState::Unloaded,
        }
    }

    pub fn id(&self) -> Option<ViewId> {
        self.id
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// `schema.name`, or just the alias for local views
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.state, ViewState::Local(_))
    }

    /// True once the view has a query to substitute
    pub fn is_loaded(&self) -> bool {
        !matches!(self.state, ViewState::Unloaded)
    }

    /// Views are always virtual: nothing may plan a direct scan of them
    pub fn is_virtual(&self) -> bool {
        true
    }

    /// The parsed query to substitute for references to this view
    pub fn query(&self) -> Option<&Query> {
        match &self.state {
            ViewState::Loaded(def) => Some(&def.query),
            ViewState::Local(query) => Some(query),
            ViewState::Unloaded => None,
        }
    }

    pub fn original_definition_text(&self) -> Option<&str> {
        match &self.state {
            ViewState::Loaded(def) => def.original_text.as_deref(),
            _ => None,
        }
    }

    pub fn expanded_definition_text(&self) -> Option<&str> {
        match &self.state {
            ViewState::Loaded(def) => Some(&def.expanded_text),
            _ => None,
        }
    }

    pub fn definition(&self) -> Option<&ViewDefinition> {
        match &self.state {
            ViewState::Loaded(def) => Some(def),
            _ => None,
        }
    }

    /// Descriptive column list. Empty for local and unloaded views.
    pub fn columns(&self) -> &[Column] {
        match &self.state {
            ViewState::Loaded(def) => &def.columns,
            _ => &[],
        }
    }

    pub fn num_clustering_columns(&self) -> usize {
        0
    }

    /// Views carry no row count statistic
    pub fn num_rows(&self) -> Option<u64> {
        None
    }

    pub fn estimated_scan_node_count(&self) -> Result<usize> {
        Err(Error::InvalidOperation {
            operation: "estimated_scan_node_count",
        })
    }

    pub fn physical_scan_descriptor(
        &self,
        _referenced: &BTreeSet<PartitionId>,
    ) -> Result<ScanDescriptor> {
        Err(Error::InvalidOperation {
            operation: "physical_scan_descriptor",
        })
    }
}
