//! Error types for IronView

use thiserror::Error;

/// The main error type for IronView operations
#[derive(Error, Debug)]
pub enum Error {
    // Parser errors
    #[error("Parse error: {0}")]
    Parse(String),

    // Catalog errors
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("View not found: {0}")]
    ViewNotFound(String),

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Schema already exists: {0}")]
    SchemaAlreadyExists(String),

    /// A metastore column type that has no catalog equivalent
    #[error("Unsupported type '{descriptor}' for column {column}")]
    TypeResolution { column: String, descriptor: String },

    /// A scan-only operation was called on a catalog object without physical storage.
    /// This is a caller defect, never a data error.
    #[error("Cannot call {operation}() on a view")]
    InvalidOperation { operation: &'static str },

    #[error(transparent)]
    TableLoading(#[from] TableLoadingError),

    #[error("View nesting exceeds the limit of {0} levels")]
    ViewRecursionLimit(usize),

    // External collaborators
    #[error("Metastore error: {0}")]
    Metastore(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using IronView's Error
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong while loading a catalog object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLoadingErrorKind {
    /// Columns or definition text could not be fetched or mapped
    Metadata,
    /// The expanded view definition failed to parse
    DefinitionParse,
    /// The expanded view definition parsed into something other than a query
    NotAQuery,
}

/// Failure to load the metadata of a single catalog object.
///
/// The message is what callers get to see. For `DefinitionParse` failures it is
/// a fixed string and no cause is retained: parser diagnostics can name objects
/// the requesting user has no privileges on.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TableLoadingError {
    kind: TableLoadingErrorKind,
    message: String,
    #[source]
    cause: Option<Box<Error>>,
}

impl TableLoadingError {
    /// Wrap a metadata failure for `view`, keeping the cause.
    ///
    /// A cause that already is a loading error is passed through unchanged.
    pub fn metadata(view: &str, cause: Error) -> Self {
        match cause {
            Error::TableLoading(inner) => inner,
            cause => TableLoadingError {
                kind: TableLoadingErrorKind::Metadata,
                message: format!("Failed to load metadata for view: {}", view),
                cause: Some(Box::new(cause)),
            },
        }
    }

    pub fn definition_parse(view: &str) -> Self {
        TableLoadingError {
            kind: TableLoadingErrorKind::DefinitionParse,
            message: format!(
                "Failed to parse view-definition statement of view: {}",
                view
            ),
            cause: None,
        }
    }

    pub fn not_a_query(view: &str) -> Self {
        TableLoadingError {
            kind: TableLoadingErrorKind::NotAQuery,
            message: format!("View definition of {} is not a query statement", view),
            cause: None,
        }
    }

    pub fn kind(&self) -> TableLoadingErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying failure, if one was retained
    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }
}
