//! Error types for reconciliation and merge operations

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the comparison and merge operations
#[derive(Debug, Error)]
pub enum Error {
    /// The two tables given to a reconciliation do not share the same columns
    #[error(
        "schema mismatch: '{left_table}' has {left_columns} columns, '{right_table}' has {right_columns} ({details})"
    )]
    SchemaMismatch {
        left_table: String,
        left_columns: usize,
        right_table: String,
        right_columns: usize,
        details: String,
    },

    /// A key or select column is missing from its table
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { column: String, table: String },

    /// One of the input tables has no data rows
    #[error("table '{table}' has no rows")]
    EmptyInput { table: String },

    /// Any other condition that prevents the operation from completing
    #[error("comparison failed: {0}")]
    ComparisonFailed(String),
}

impl Error {
    pub(crate) fn column_not_found(column: impl Into<String>, table: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            column: column.into(),
            table: table.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = Error::column_not_found("id", "orders.xlsx");
        assert_eq!(err.to_string(), "column 'id' not found in table 'orders.xlsx'");

        let err = Error::EmptyInput {
            table: "target".into(),
        };
        assert_eq!(err.to_string(), "table 'target' has no rows");
    }
}
