//! Schema comparison logic

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Table;

/// Types of schema changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaChange {
    /// Column only present in the target table
    ColumnAdded { name: String, index: usize },
    /// Column only present in the source table
    ColumnRemoved { name: String, index: usize },
    /// Column present in both tables at different positions
    ColumnMoved {
        name: String,
        from_index: usize,
        to_index: usize,
    },
}

impl std::fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaChange::ColumnAdded { name, index } => {
                write!(f, "+ {} (new column at position {})", name, index)
            }
            SchemaChange::ColumnRemoved { name, index } => {
                write!(f, "- {} (removed from position {})", name, index)
            }
            SchemaChange::ColumnMoved {
                name,
                from_index,
                to_index,
            } => {
                write!(f, "↔ {} (moved from {} to {})", name, from_index, to_index)
            }
        }
    }
}

/// Schema comparison engine
pub struct SchemaDiff;

impl SchemaDiff {
    /// Compare schemas of two tables
    pub fn compare(old_table: &Table, new_table: &Table) -> Vec<SchemaChange> {
        let mut changes = Vec::new();

        let old_names: Vec<_> = old_table.columns.iter().map(|c| &c.name).collect();
        let new_names: Vec<_> = new_table.columns.iter().map(|c| &c.name).collect();

        // Find removed columns
        for (old_idx, old_name) in old_names.iter().enumerate() {
            if !new_names.contains(old_name) {
                changes.push(SchemaChange::ColumnRemoved {
                    name: (*old_name).clone(),
                    index: old_idx,
                });
            }
        }

        // Find added columns
        for (new_idx, new_name) in new_names.iter().enumerate() {
            if !old_names.contains(new_name) {
                changes.push(SchemaChange::ColumnAdded {
                    name: (*new_name).clone(),
                    index: new_idx,
                });
            }
        }

        // Find moved columns
        for (old_idx, old_name) in old_names.iter().enumerate() {
            if let Some(new_idx) = new_names.iter().position(|n| n == old_name) {
                if old_idx != new_idx {
                    changes.push(SchemaChange::ColumnMoved {
                        name: (*old_name).clone(),
                        from_index: old_idx,
                        to_index: new_idx,
                    });
                }
            }
        }

        changes
    }

    /// Require identical column names, count, and order
    pub fn ensure_identical(source: &Table, target: &Table) -> Result<()> {
        let same = source.column_count() == target.column_count()
            && source.column_names().eq(target.column_names());
        if same {
            return Ok(());
        }

        // Repeated header names can change the count without any add/remove/move
        let changes = Self::compare(source, target);
        let details = if changes.is_empty() {
            format!(
                "column count differs: {} vs {}",
                source.column_count(),
                target.column_count()
            )
        } else {
            changes
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        };

        Err(Error::SchemaMismatch {
            left_table: source.name.clone(),
            left_columns: source.column_count(),
            right_table: target.name.clone(),
            right_columns: target.column_count(),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn table(name: &str, headers: &[&str]) -> Table {
        let cells = headers.iter().map(|_| CellValue::Null).collect();
        Table::from_rows(name, headers.iter().copied(), vec![cells])
    }

    #[test]
    fn test_identical_schemas_pass() {
        let a = table("a", &["id", "name"]);
        let b = table("b", &["id", "name"]);
        assert!(SchemaDiff::ensure_identical(&a, &b).is_ok());
    }

    #[test]
    fn test_added_column_is_rejected() {
        let a = table("a", &["id", "name"]);
        let b = table("b", &["id", "name", "email"]);
        let err = SchemaDiff::ensure_identical(&a, &b).unwrap_err();
        match err {
            Error::SchemaMismatch {
                left_columns,
                right_columns,
                details,
                ..
            } => {
                assert_eq!(left_columns, 2);
                assert_eq!(right_columns, 3);
                assert!(details.contains("+ email"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reordered_columns_are_rejected() {
        let a = table("a", &["id", "name"]);
        let b = table("b", &["name", "id"]);
        let changes = SchemaDiff::compare(&a, &b);
        assert_eq!(changes.len(), 2);
        assert!(matches!(changes[0], SchemaChange::ColumnMoved { .. }));
        assert!(SchemaDiff::ensure_identical(&a, &b).is_err());
    }

    #[test]
    fn test_duplicate_header_count_is_rejected() {
        let a = table("a", &["x", "y"]);
        let b = table("b", &["x", "y", "y"]);
        assert!(SchemaDiff::compare(&a, &b).is_empty());
        let err = SchemaDiff::ensure_identical(&a, &b).unwrap_err();
        assert!(err.to_string().contains("column count differs: 2 vs 3"));
    }
}
