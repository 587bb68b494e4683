//! View definition loading
//!
//! Turns stored definition text into a validated [`ViewDefinition`]:
//! fetch columns and text, materialize the columns, parse the expanded text
//! and check that it is a query.
//!
//! Errors leaving this module are what the user who triggered the load gets
//! to see. Parser diagnostics can mention tables inside the view definition
//! that the user has no privileges on, so they are replaced by a fixed message
//! and only ever logged under [`DIAGNOSTICS_TARGET`].

use crate::column::{has_dense_positions, materialize_columns};
use crate::metastore::MetaStore;
use crate::serialized::{SerializedTable, TableKind};
use crate::view::{View, ViewDefinition};
use ironview_common::{Error, TableLoadingError};
use ironview_parser::ast::{Query, Statement};
use ironview_parser::{parse_statement, ParserOptions};
use tracing::debug;

/// Log target for diagnostics that must not reach the requesting user
pub const DIAGNOSTICS_TARGET: &str = "ironview::diagnostics";

/// Loads view definitions.
///
/// Each call does at most one metastore round trip and one parse. The loader
/// holds no state between calls; serializing concurrent loads of the same view
/// is up to the catalog.
#[derive(Debug, Clone, Default)]
pub struct ViewLoader {
    parser: ParserOptions,
}

impl ViewLoader {
    pub fn new(parser: ParserOptions) -> Self {
        ViewLoader { parser }
    }

    /// Load the definition of the persisted view `schema.name`.
    ///
    /// Reloading never touches the metadata of tables the view refers to.
    pub fn load_persisted(
        &self,
        metastore: &dyn MetaStore,
        schema: &str,
        name: &str,
    ) -> Result<ViewDefinition, TableLoadingError> {
        let qualified = format!("{}.{}", schema, name);
        debug!(view = %qualified, "loading view definition");

        let fetched = metastore.get_table(schema, name).and_then(|table| {
            let fields = metastore.get_fields(schema, name)?;
            let columns = materialize_columns(&fields)?;
            Ok((table, columns))
        });
        let (table, columns) =
            fetched.map_err(|e| TableLoadingError::metadata(&qualified, e))?;

        if !table.is_view() {
            return Err(TableLoadingError::metadata(
                &qualified,
                Error::Metastore(format!("{} is not a view", qualified)),
            ));
        }

        let expanded_text = table.view_expanded_text.unwrap_or_default();
        let query = self.parse_definition(&qualified, &expanded_text)?;
        debug!(view = %qualified, columns = columns.len(), "loaded view definition");

        Ok(ViewDefinition {
            original_text: table.view_original_text,
            expanded_text,
            query,
            columns,
        })
    }

    /// Rebuild a view from its serialized form.
    ///
    /// The parsed query is not part of the serialized form. It is recomputed
    /// from the expanded text with the same checks as a metastore load.
    pub fn load_serialized(&self, serialized: &SerializedTable) -> Result<View, TableLoadingError> {
        let qualified = format!("{}.{}", serialized.schema, serialized.name);

        if serialized.table_kind != TableKind::View {
            return Err(TableLoadingError::metadata(
                &qualified,
                Error::Serialization(format!("{} is not a serialized view", qualified)),
            ));
        }
        let id = serialized.id.ok_or_else(|| {
            TableLoadingError::metadata(
                &qualified,
                Error::Serialization("serialized view has no id".to_string()),
            )
        })?;
        if !has_dense_positions(&serialized.columns) {
            return Err(TableLoadingError::metadata(
                &qualified,
                Error::Serialization("column positions are not dense".to_string()),
            ));
        }

        let expanded_text = serialized.view_expanded_text.clone().unwrap_or_default();
        let query = self.parse_definition(&qualified, &expanded_text)?;

        let shell = View::new(
            id,
            serialized.schema.clone(),
            serialized.name.clone(),
            serialized.owner.clone(),
        );
        Ok(shell.with_definition(ViewDefinition {
            original_text: serialized.view_original_text.clone(),
            expanded_text,
            query,
            columns: serialized.columns.clone(),
        }))
    }

    /// Parse `text` and make sure it is a query
    fn parse_definition(&self, qualified: &str, text: &str) -> Result<Query, TableLoadingError> {
        let statement = match parse_statement(text, &self.parser) {
            Ok(statement) => statement,
            Err(e) => {
                debug!(
                    target: DIAGNOSTICS_TARGET,
                    view = %qualified,
                    error = %e,
                    "view definition failed to parse"
                );
                return Err(TableLoadingError::definition_parse(qualified));
            }
        };

        match statement {
            Statement::Query(query) => Ok(*query),
            _ => Err(TableLoadingError::not_a_query(qualified)),
        }
    }
}
