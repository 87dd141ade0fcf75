//! Cell-level emphasis for rows that differ

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{KeyBuilder, Table};

use super::{DiffTable, RowTag};

/// A row- or cell-level marker handed to renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emphasis {
    /// Row exists only in the source table
    SourceOnly,
    /// Row exists only in the target table
    TargetOnly,
    /// Cell value differs from its counterpart
    CellChanged,
}

impl Emphasis {
    pub fn for_tag(tag: RowTag) -> Option<Self> {
        match tag {
            RowTag::SourceOnly => Some(Emphasis::SourceOnly),
            RowTag::TargetOnly => Some(Emphasis::TargetOnly),
            RowTag::Both => None,
        }
    }
}

/// How rows of the diff table were paired for cell comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CellAlignment {
    /// Source-only and target-only rows sharing a key were compared
    Keyed { columns: Vec<String> },
    /// Each row's first half of columns was compared with its second half.
    ///
    /// Only meaningful when the schema is a repeated source/target pair of the
    /// same columns. Columns past `2 * half` are never compared.
    Positional {
        half: usize,
        uncompared: Vec<String>,
    },
}

impl CellAlignment {
    pub fn is_positional(&self) -> bool {
        matches!(self, CellAlignment::Positional { .. })
    }
}

impl std::fmt::Display for CellAlignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellAlignment::Keyed { columns } => write!(f, "keyed on {}", columns.join(", ")),
            CellAlignment::Positional { half, .. } => {
                write!(f, "positional (column i vs column i + {})", half)
            }
        }
    }
}

/// Emphasis markers for a diff table, indexed by diff row and column
#[derive(Debug, Clone, Default)]
pub struct EmphasisSet {
    rows: Vec<Option<Emphasis>>,
    cells: FxHashSet<(usize, usize)>,
}

impl EmphasisSet {
    /// Row-level emphasis for every row of the diff table
    pub fn for_rows(diff: &DiffTable) -> Self {
        Self {
            rows: diff.rows.iter().map(|r| Emphasis::for_tag(r.tag)).collect(),
            cells: FxHashSet::default(),
        }
    }

    pub fn mark_cell(&mut self, row: usize, column: usize) {
        self.cells.insert((row, column));
    }

    /// Row-level emphasis
    pub fn row(&self, row: usize) -> Option<Emphasis> {
        self.rows.get(row).copied().flatten()
    }

    /// Effective emphasis for a cell; a changed cell overrides its row
    pub fn cell(&self, row: usize, column: usize) -> Option<Emphasis> {
        if self.is_changed(row, column) {
            Some(Emphasis::CellChanged)
        } else {
            self.row(row)
        }
    }

    pub fn is_changed(&self, row: usize, column: usize) -> bool {
        self.cells.contains(&(row, column))
    }

    /// Changed cells in row-major order
    pub fn changed_cells(&self) -> Vec<(usize, usize)> {
        let mut cells: Vec<_> = self.cells.iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    pub fn changed_count(&self) -> usize {
        self.cells.len()
    }
}

/// Marks differing cells of source-only / target-only rows
pub struct CellHighlighter {
    keys: Option<(KeyBuilder, Vec<String>)>,
}

impl CellHighlighter {
    /// Pair rows by their first-half / second-half columns
    pub fn positional() -> Self {
        Self { keys: None }
    }

    /// Pair source-only and target-only rows by the given key columns
    pub fn keyed(table: &Table, key_columns: &[String]) -> Result<Self> {
        let builder = KeyBuilder::for_columns(table, key_columns)?;
        Ok(Self {
            keys: Some((builder, key_columns.to_vec())),
        })
    }

    /// Build the full emphasis set and report which alignment produced it
    pub fn highlight(&self, diff: &DiffTable) -> (EmphasisSet, CellAlignment) {
        let mut emphasis = EmphasisSet::for_rows(diff);
        let alignment = match &self.keys {
            Some((builder, columns)) => {
                mark_keyed(diff, builder, &mut emphasis);
                CellAlignment::Keyed {
                    columns: columns.clone(),
                }
            }
            None => mark_positional(diff, &mut emphasis),
        };
        (emphasis, alignment)
    }
}

fn mark_keyed(diff: &DiffTable, builder: &KeyBuilder, emphasis: &mut EmphasisSet) {
    let mut unpaired: FxHashMap<String, VecDeque<usize>> = FxHashMap::default();
    for (idx, row) in diff.rows.iter().enumerate() {
        if row.tag == RowTag::SourceOnly {
            unpaired
                .entry(builder.build_key(&row.row.cells))
                .or_default()
                .push_back(idx);
        }
    }

    let mut pairs = 0usize;
    for (target_idx, row) in diff.rows.iter().enumerate() {
        if row.tag != RowTag::TargetOnly {
            continue;
        }
        let key = builder.build_key(&row.row.cells);
        let Some(source_idx) = unpaired.get_mut(&key).and_then(|q| q.pop_front()) else {
            continue;
        };
        pairs += 1;

        let source_cells = &diff.rows[source_idx].row.cells;
        for (col, (old, new)) in source_cells.iter().zip(&row.row.cells).enumerate() {
            if old != new {
                emphasis.mark_cell(source_idx, col);
                emphasis.mark_cell(target_idx, col);
            }
        }
    }

    tracing::debug!(pairs, "paired rows by key for cell comparison");
}

fn mark_positional(diff: &DiffTable, emphasis: &mut EmphasisSet) -> CellAlignment {
    let column_count = diff.columns.len();
    let half = column_count / 2;
    let uncompared: Vec<String> = diff.columns[2 * half..]
        .iter()
        .map(|c| c.name.clone())
        .collect();

    tracing::warn!(
        half,
        "no key columns given; comparing each row's first half of columns against its second half"
    );
    if !uncompared.is_empty() {
        tracing::warn!(columns = ?uncompared, "odd column count; trailing columns are not compared");
    }

    for (idx, row) in diff.rows.iter().enumerate() {
        for col in 0..half {
            if row.row.cells.get(col) != row.row.cells.get(col + half) {
                emphasis.mark_cell(idx, col);
                emphasis.mark_cell(idx, col + half);
            }
        }
    }

    CellAlignment::Positional { half, uncompared }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffRow;
    use crate::model::{columns_from_names, CellValue, Row};

    fn diff_table(headers: &[&str], rows: Vec<(RowTag, Vec<CellValue>)>) -> DiffTable {
        DiffTable {
            columns: columns_from_names(headers.iter().copied()),
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, (tag, cells))| DiffRow {
                    tag,
                    row: Row::new(cells, i + 2),
                })
                .collect(),
        }
    }

    #[test]
    fn test_keyed_marks_only_changed_columns() {
        let diff = diff_table(
            &["id", "val"],
            vec![
                (RowTag::SourceOnly, vec![CellValue::Int(1), "x".into()]),
                (RowTag::TargetOnly, vec![CellValue::Int(1), "y".into()]),
            ],
        );
        let table = Table::from_rows("t", ["id", "val"], vec![]);
        let highlighter = CellHighlighter::keyed(&table, &["id".into()]).unwrap();

        let (emphasis, alignment) = highlighter.highlight(&diff);
        assert_eq!(emphasis.changed_cells(), vec![(0, 1), (1, 1)]);
        assert_eq!(emphasis.cell(0, 0), Some(Emphasis::SourceOnly));
        assert_eq!(emphasis.cell(1, 0), Some(Emphasis::TargetOnly));
        assert_eq!(emphasis.cell(1, 1), Some(Emphasis::CellChanged));
        assert!(!alignment.is_positional());
    }

    #[test]
    fn test_keyed_pairs_first_unpaired_occurrence() {
        let diff = diff_table(
            &["id", "val"],
            vec![
                (RowTag::SourceOnly, vec![CellValue::Int(1), "a".into()]),
                (RowTag::SourceOnly, vec![CellValue::Int(1), "b".into()]),
                (RowTag::SourceOnly, vec![CellValue::Int(2), "c".into()]),
                (RowTag::TargetOnly, vec![CellValue::Int(1), "b2".into()]),
            ],
        );
        let table = Table::from_rows("t", ["id", "val"], vec![]);
        let (emphasis, _) = CellHighlighter::keyed(&table, &["id".into()])
            .unwrap()
            .highlight(&diff);

        assert_eq!(emphasis.changed_cells(), vec![(0, 1), (3, 1)]);
        assert_eq!(emphasis.row(2), Some(Emphasis::SourceOnly));
    }

    #[test]
    fn test_positional_compares_halves() {
        let diff = diff_table(
            &["name_src", "qty_src", "name_tgt", "qty_tgt"],
            vec![(
                RowTag::SourceOnly,
                vec!["bolt".into(), CellValue::Int(4), "bolt".into(), CellValue::Int(5)],
            )],
        );
        let (emphasis, alignment) = CellHighlighter::positional().highlight(&diff);

        assert_eq!(emphasis.changed_cells(), vec![(0, 1), (0, 3)]);
        assert_eq!(
            alignment,
            CellAlignment::Positional {
                half: 2,
                uncompared: vec![]
            }
        );
    }

    #[test]
    fn test_positional_skips_trailing_odd_column() {
        let diff = diff_table(
            &["a", "b", "c"],
            vec![(
                RowTag::TargetOnly,
                vec!["x".into(), "x".into(), "zzz".into()],
            )],
        );
        let (emphasis, alignment) = CellHighlighter::positional().highlight(&diff);

        assert_eq!(emphasis.changed_count(), 0);
        assert_eq!(emphasis.row(0), Some(Emphasis::TargetOnly));
        assert_eq!(
            alignment,
            CellAlignment::Positional {
                half: 1,
                uncompared: vec!["c".into()]
            }
        );
    }
}
