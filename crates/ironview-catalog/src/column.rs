//! Column definition and materialization of metastore column schemas

use crate::metastore::FieldSchema;
use ironview_common::{Error, LogicalType, Result};
use serde::{Deserialize, Serialize};

pub type ColumnId = u32;

/// A column of a table or view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Column type
    pub logical_type: LogicalType,
    /// Comment attached in the metastore
    pub comment: Option<String>,
    /// Ordinal position, dense and starting at 0
    pub position: ColumnId,
}

impl Column {
    pub fn new(name: String, logical_type: LogicalType, position: ColumnId) -> Self {
        Column {
            name,
            logical_type,
            comment: None,
            position,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Turn raw metastore column schemas into typed columns.
///
/// The position of each column is its index in `fields`. Any column whose type
/// descriptor cannot be mapped fails the whole batch.
pub fn materialize_columns(fields: &[FieldSchema]) -> Result<Vec<Column>> {
    fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let logical_type = LogicalType::from_type_descriptor(&field.type_descriptor)
                .ok_or_else(|| Error::TypeResolution {
                    column: field.name.clone(),
                    descriptor: field.type_descriptor.clone(),
                })?;
            let position = ColumnId::try_from(idx)
                .map_err(|_| Error::Internal(format!("too many columns: {}", fields.len())))?;
            Ok(Column {
                name: field.name.clone(),
                logical_type,
                comment: field.comment.clone(),
                position,
            })
        })
        .collect()
}

/// Check that column positions are exactly 0..len in order
pub(crate) fn has_dense_positions(columns: &[Column]) -> bool {
    columns
        .iter()
        .enumerate()
        .all(|(idx, col)| col.position as usize == idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_input_order() {
        let fields = vec![
            FieldSchema::new("id", "bigint"),
            FieldSchema::new("name", "string").with_comment("display name"),
            FieldSchema::new("price", "decimal(10,2)"),
        ];
        let columns = materialize_columns(&fields).unwrap();

        assert_eq!(columns.len(), 3);
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "price"]);
        let positions: Vec<_> = columns.iter().map(|c| c.position).collect();
        assert_eq!(positions, [0, 1, 2]);
        assert_eq!(columns[1].comment.as_deref(), Some("display name"));
        assert_eq!(
            columns[2].logical_type,
            LogicalType::Decimal { width: 10, scale: 2 }
        );
        assert!(has_dense_positions(&columns));
    }

    #[test]
    fn test_empty_schema() {
        assert!(materialize_columns(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_unmappable_type_fails_whole_batch() {
        let fields = vec![
            FieldSchema::new("a", "int"),
            FieldSchema::new("shape", "geometry"),
        ];
        let err = materialize_columns(&fields).unwrap_err();
        match err {
            Error::TypeResolution { column, descriptor } => {
                assert_eq!(column, "shape");
                assert_eq!(descriptor, "geometry");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dense_position_check() {
        let columns = vec![
            Column::new("a".to_string(), LogicalType::Integer, 0),
            Column::new("b".to_string(), LogicalType::Integer, 2),
        ];
        assert!(!has_dense_positions(&columns));
    }
}
