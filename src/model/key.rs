//! Composite key handling

use crate::error::{Error, Result};

use super::table::{CellValue, Table};

/// Separator placed between key components in a synthetic key
pub const KEY_SEPARATOR: &str = "_";

/// Builder for computing composite keys
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    column_indices: Vec<usize>,
    separator: String,
}

impl KeyBuilder {
    /// Resolve key columns by name, failing on the first one the table lacks
    pub fn for_columns(table: &Table, names: &[String]) -> Result<Self> {
        let column_indices = names
            .iter()
            .map(|name| {
                table
                    .column_index(name)
                    .ok_or_else(|| Error::column_not_found(name, &table.name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            column_indices,
            separator: KEY_SEPARATOR.to_string(),
        })
    }

    /// Set the separator between key components
    pub fn with_separator(mut self, sep: impl Into<String>) -> Self {
        self.separator = sep.into();
        self
    }

    /// Build a key string from cell values
    pub fn build_key(&self, cells: &[CellValue]) -> String {
        self.column_indices
            .iter()
            .map(|&i| cells.get(i).map(|c| c.key_text()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    /// Get the column indices
    pub fn column_indices(&self) -> &[usize] {
        &self.column_indices
    }
}
