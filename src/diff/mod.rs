//! Row-set reconciliation of two tables

pub mod cell_diff;
mod row_diff;
mod schema_diff;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{columns_from_names, CellValue, Column, Row, Table};

pub use cell_diff::{CellAlignment, CellHighlighter, Emphasis, EmphasisSet};
pub use row_diff::{RowMatcher, RowPartition};
pub use schema_diff::{SchemaChange, SchemaDiff};

/// Name of the trailing column holding each diff row's tag
pub const MERGE_OUTPUT_COLUMN: &str = "Merge_Output";

/// Where a row's exact value tuple was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowTag {
    SourceOnly,
    TargetOnly,
    Both,
}

impl RowTag {
    /// Label written into the `Merge_Output` column
    pub fn label(self) -> &'static str {
        match self {
            RowTag::SourceOnly => "Source Only",
            RowTag::TargetOnly => "Target Only",
            RowTag::Both => "Both",
        }
    }
}

impl std::fmt::Display for RowTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A row of the diff table with its tag
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRow {
    pub tag: RowTag,
    pub row: Row,
}

impl DiffRow {
    /// Row cells followed by the tag label
    pub fn cells_with_tag(&self) -> Vec<CellValue> {
        let mut cells = self.row.cells.clone();
        cells.push(CellValue::from(self.tag.label()));
        cells
    }
}

/// Rows present on one side only.
///
/// `columns` are the data columns shared by both inputs; the `Merge_Output`
/// column is implied and produced by [`DiffTable::header`] and
/// [`DiffRow::cells_with_tag`].
#[derive(Debug, Clone, Default)]
pub struct DiffTable {
    pub columns: Vec<Column>,
    pub rows: Vec<DiffRow>,
}

impl DiffTable {
    /// Column names including the trailing `Merge_Output`
    pub fn header(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.name.clone())
            .chain(std::iter::once(MERGE_OUTPUT_COLUMN.to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with the given tag, in output order
    pub fn rows_tagged(&self, tag: RowTag) -> impl Iterator<Item = &DiffRow> {
        self.rows.iter().filter(move |r| r.tag == tag)
    }

    /// Flatten into a plain table with the tag as its last column
    pub fn into_table(self, name: impl Into<String>) -> Table {
        let mut table = Table::new(name, columns_from_names(self.header()));
        for diff_row in self.rows {
            let cells = diff_row.cells_with_tag();
            table.add_row(cells, diff_row.row.source_line);
        }
        table
    }
}

/// Statistics about a reconciliation
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub source_rows: usize,
    pub target_rows: usize,
    pub source_only: usize,
    pub target_only: usize,
    pub matched_source_rows: usize,
    pub matched_target_rows: usize,
    pub cells_changed: usize,
}

/// Result of reconciling two tables
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Source table after whitespace normalization
    pub source: Table,
    /// Target table after whitespace normalization
    pub target: Table,
    /// Source-only rows followed by target-only rows
    pub differences: DiffTable,
    /// Row and cell emphasis for `differences`
    pub emphasis: EmphasisSet,
    /// How rows were paired when marking changed cells
    pub alignment: CellAlignment,
    pub stats: ReconcileStats,
}

impl Reconciliation {
    /// Number of rows in the diff table
    pub fn count(&self) -> usize {
        self.differences.len()
    }

    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }
}

/// Reconciles two tables with identical columns by full-row equality
#[derive(Debug, Clone, Default)]
pub struct SetReconciler {
    key_columns: Vec<String>,
}

impl SetReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare key columns used to pair differing rows for cell comparison.
    ///
    /// Keys never affect which rows are reported, only which cells are
    /// marked as changed. Without keys the positional fallback is used.
    pub fn with_key_columns(mut self, keys: Vec<String>) -> Self {
        self.key_columns = keys;
        self
    }

    /// Partition the rows of both tables and build the annotated diff table
    pub fn reconcile(&self, mut source: Table, mut target: Table) -> Result<Reconciliation> {
        for table in [&source, &target] {
            if table.is_empty() {
                return Err(Error::EmptyInput {
                    table: table.name.clone(),
                });
            }
        }
        SchemaDiff::ensure_identical(&source, &target)?;

        let highlighter = if self.key_columns.is_empty() {
            CellHighlighter::positional()
        } else {
            CellHighlighter::keyed(&source, &self.key_columns)?
        };

        source.normalize();
        target.normalize();

        let partition = RowMatcher::partition(&source, &target);
        let differences = build_diff_table(&source, &target, &partition);
        let (emphasis, alignment) = highlighter.highlight(&differences);

        let stats = ReconcileStats {
            source_rows: source.row_count(),
            target_rows: target.row_count(),
            source_only: partition.source_only(),
            target_only: partition.target_only(),
            matched_source_rows: source.row_count() - partition.source_only(),
            matched_target_rows: target.row_count() - partition.target_only(),
            cells_changed: emphasis.changed_count(),
        };

        tracing::debug!(
            source = %source.name,
            target = %target.name,
            source_only = stats.source_only,
            target_only = stats.target_only,
            "reconciled tables"
        );

        Ok(Reconciliation {
            source,
            target,
            differences,
            emphasis,
            alignment,
            stats,
        })
    }
}

fn build_diff_table(source: &Table, target: &Table, partition: &RowPartition) -> DiffTable {
    let tagged = source
        .rows
        .iter()
        .zip(&partition.source)
        .chain(target.rows.iter().zip(&partition.target));

    let rows = tagged
        .filter(|(_, tag)| **tag != RowTag::Both)
        .map(|(row, tag)| DiffRow {
            tag: *tag,
            row: row.clone(),
        })
        .collect();

    DiffTable {
        columns: source.columns.clone(),
        rows,
    }
}

/// Reconcile two tables, returning the diff table and its row count
pub fn reconcile(source: Table, target: Table) -> Result<(DiffTable, usize)> {
    let result = SetReconciler::new().reconcile(source, target)?;
    let count = result.count();
    Ok((result.differences, count))
}
