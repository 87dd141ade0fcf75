//! Key-based join of two tables with column projection

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{columns_from_names, CellValue, KeyBuilder, Table};

/// Name of the synthetic key column leading every merged row
pub const UNIQUE_KEY_COLUMN: &str = "UniqueKey";

/// Suffix applied to left-side columns whose names collide
pub const LEFT_SUFFIX: &str = "_A";
/// Suffix applied to right-side columns whose names collide
pub const RIGHT_SUFFIX: &str = "_B";

/// Which left rows survive the join
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    /// Every left row is kept; unmatched right columns are null
    #[default]
    Left,
    /// Only keys present on both sides are kept
    Inner,
}

impl std::str::FromStr for JoinKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(JoinKind::Left),
            "inner" => Ok(JoinKind::Inner),
            _ => Err(format!("Unknown join kind: {}", s)),
        }
    }
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinKind::Left => write!(f, "left"),
            JoinKind::Inner => write!(f, "inner"),
        }
    }
}

/// Key and projection columns for a merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSpec {
    pub left_keys: Vec<String>,
    pub right_keys: Vec<String>,
    pub left_select: Vec<String>,
    pub right_select: Vec<String>,
    pub join_kind: JoinKind,
}

impl MergeSpec {
    pub fn new(left_keys: Vec<String>, right_keys: Vec<String>) -> Self {
        Self {
            left_keys,
            right_keys,
            ..Default::default()
        }
    }

    pub fn with_select(mut self, left: Vec<String>, right: Vec<String>) -> Self {
        self.left_select = left;
        self.right_select = right;
        self
    }

    pub fn with_join_kind(mut self, join_kind: JoinKind) -> Self {
        self.join_kind = join_kind;
        self
    }
}

/// Statistics about a merge
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub left_rows: usize,
    pub right_rows: usize,
    pub output_rows: usize,
    /// Distinct left keys with no right match
    pub unmatched_left_keys: usize,
    /// Joined rows dropped because their key was already emitted
    pub duplicates_dropped: usize,
}

/// Result of a keyed merge
#[derive(Debug, Clone)]
pub struct MergedTable {
    pub table: Table,
    pub join_kind: JoinKind,
    pub stats: MergeStats,
}

/// Joins two tables on a synthetic key built from paired key columns
#[derive(Debug, Clone)]
pub struct KeyedMerger {
    spec: MergeSpec,
}

impl KeyedMerger {
    pub fn new(spec: MergeSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &MergeSpec {
        &self.spec
    }

    /// Join `left` and `right`, keeping the first row per synthetic key
    pub fn merge(&self, left: &Table, right: &Table) -> Result<MergedTable> {
        let spec = &self.spec;
        for table in [left, right] {
            if table.is_empty() {
                return Err(Error::EmptyInput {
                    table: table.name.clone(),
                });
            }
        }
        if spec.left_keys.is_empty() || spec.right_keys.is_empty() {
            return Err(Error::ComparisonFailed(
                "at least one key column is required on each side".to_string(),
            ));
        }
        if spec.left_keys.len() != spec.right_keys.len() {
            return Err(Error::ComparisonFailed(format!(
                "key column lists differ in length: {} on '{}', {} on '{}'",
                spec.left_keys.len(),
                left.name,
                spec.right_keys.len(),
                right.name
            )));
        }

        let left_keys = KeyBuilder::for_columns(left, &spec.left_keys)?;
        let right_keys = KeyBuilder::for_columns(right, &spec.right_keys)?;
        let left_select = resolve_columns(left, &spec.left_select)?;
        let right_select = resolve_columns(right, &spec.right_select)?;

        let mut left = left.clone();
        let mut right = right.clone();
        left.normalize();
        right.normalize();

        let mut right_index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (idx, row) in right.rows.iter().enumerate() {
            right_index
                .entry(right_keys.build_key(&row.cells))
                .or_default()
                .push(idx);
        }

        let header = output_header(&left_select, &right_select);
        let mut output = Table::new("Merged", columns_from_names(header));
        let mut emitted: FxHashSet<String> = FxHashSet::default();
        let mut unmatched: FxHashSet<String> = FxHashSet::default();
        let mut duplicates_dropped = 0usize;

        for row in &left.rows {
            let key = left_keys.build_key(&row.cells);
            let matches = right_index.get(&key).map(Vec::as_slice).unwrap_or_default();

            if matches.is_empty() {
                unmatched.insert(key.clone());
                if spec.join_kind == JoinKind::Inner {
                    continue;
                }
            }

            // Rows sharing an emitted key are what deduplication removes
            let joined = matches.len().max(1);
            if !emitted.insert(key.clone()) {
                duplicates_dropped += joined;
                continue;
            }
            duplicates_dropped += joined - 1;

            let mut cells = Vec::with_capacity(output.column_count());
            cells.push(CellValue::from(key));
            cells.extend(left_select.iter().map(|(_, i)| cell_at(&row.cells, *i)));
            match matches.first() {
                Some(&right_idx) => {
                    let right_row = &right.rows[right_idx];
                    cells.extend(right_select.iter().map(|(_, i)| cell_at(&right_row.cells, *i)));
                }
                None => cells.extend(right_select.iter().map(|_| CellValue::Null)),
            }
            output.add_row(cells, row.source_line);
        }

        let stats = MergeStats {
            left_rows: left.row_count(),
            right_rows: right.row_count(),
            output_rows: output.row_count(),
            unmatched_left_keys: unmatched.len(),
            duplicates_dropped,
        };

        tracing::debug!(
            left = %left.name,
            right = %right.name,
            join = %spec.join_kind,
            output_rows = stats.output_rows,
            duplicates_dropped = stats.duplicates_dropped,
            "merged tables"
        );

        Ok(MergedTable {
            table: output,
            join_kind: spec.join_kind,
            stats,
        })
    }
}

fn cell_at(cells: &[CellValue], index: usize) -> CellValue {
    cells.get(index).cloned().unwrap_or(CellValue::Null)
}

/// Resolve selected column names to indices, collapsing repeats
fn resolve_columns(table: &Table, names: &[String]) -> Result<Vec<(String, usize)>> {
    let unique: IndexSet<&String> = names.iter().collect();
    unique
        .into_iter()
        .map(|name| {
            table
                .column_index(name)
                .map(|i| (name.clone(), i))
                .ok_or_else(|| Error::column_not_found(name, &table.name))
        })
        .collect()
}

/// `UniqueKey`, left selection, right selection; colliding names get side
/// suffixes, and a name still taken after that gets a numeric suffix
fn output_header(left: &[(String, usize)], right: &[(String, usize)]) -> Vec<String> {
    let left_names: FxHashSet<&str> = left.iter().map(|(n, _)| n.as_str()).collect();
    let right_names: FxHashSet<&str> = right.iter().map(|(n, _)| n.as_str()).collect();
    let collides = |name: &str, other: &FxHashSet<&str>| {
        name == UNIQUE_KEY_COLUMN || other.contains(name)
    };

    let candidates = left
        .iter()
        .map(|(name, _)| {
            if collides(name, &right_names) {
                format!("{}{}", name, LEFT_SUFFIX)
            } else {
                name.clone()
            }
        })
        .chain(right.iter().map(|(name, _)| {
            if collides(name, &left_names) {
                format!("{}{}", name, RIGHT_SUFFIX)
            } else {
                name.clone()
            }
        }));

    let mut header: IndexSet<String> = IndexSet::new();
    header.insert(UNIQUE_KEY_COLUMN.to_string());
    for candidate in candidates {
        let mut name = candidate.clone();
        let mut n = 2;
        while header.contains(&name) {
            name = format!("{}_{}", candidate, n);
            n += 1;
        }
        header.insert(name);
    }
    header.into_iter().collect()
}

/// Merge two tables on positionally paired key columns
pub fn merge(
    left: &Table,
    left_keys: &[String],
    right: &Table,
    right_keys: &[String],
    left_select: &[String],
    right_select: &[String],
    join_kind: JoinKind,
) -> Result<Table> {
    let spec = MergeSpec::new(left_keys.to_vec(), right_keys.to_vec())
        .with_select(left_select.to_vec(), right_select.to_vec())
        .with_join_kind(join_kind);
    KeyedMerger::new(spec).merge(left, right).map(|m| m.table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn people(name: &str, rows: &[(i64, &str)]) -> Table {
        Table::from_rows(
            name,
            ["id", "n"],
            rows.iter()
                .map(|(id, n)| vec![CellValue::Int(*id), CellValue::from(*n)])
                .collect(),
        )
    }

    fn run(left: &Table, right: &Table, join_kind: JoinKind) -> MergedTable {
        let spec = MergeSpec::new(strings(&["id"]), strings(&["id"]))
            .with_select(strings(&["n"]), strings(&["n"]))
            .with_join_kind(join_kind);
        KeyedMerger::new(spec).merge(left, right).unwrap()
    }

    #[test]
    fn test_colliding_selection_gets_suffixes() {
        let a = people("a", &[(1, "a")]);
        let b = people("b", &[(1, "b")]);

        for join_kind in [JoinKind::Inner, JoinKind::Left] {
            let merged = run(&a, &b, join_kind);
            let names: Vec<_> = merged.table.column_names().collect();
            assert_eq!(names, vec!["UniqueKey", "n_A", "n_B"]);
            assert_eq!(
                merged.table.rows[0].cells,
                vec![CellValue::from("1"), CellValue::from("a"), CellValue::from("b")]
            );
        }
    }

    #[test]
    fn test_suffixed_name_already_selected_stays_unique() {
        let a = Table::from_rows(
            "a",
            ["id", "n", "n_A"],
            vec![vec![CellValue::Int(1), "a".into(), "extra".into()]],
        );
        let b = people("b", &[(1, "b")]);
        let spec = MergeSpec::new(strings(&["id"]), strings(&["id"]))
            .with_select(strings(&["n", "n_A"]), strings(&["n"]));
        let merged = KeyedMerger::new(spec).merge(&a, &b).unwrap();

        let names: Vec<_> = merged.table.column_names().collect();
        assert_eq!(names, vec!["UniqueKey", "n_A", "n_A_2", "n_B"]);
        assert_eq!(
            merged.table.rows[0].cells,
            vec![
                CellValue::from("1"),
                CellValue::from("a"),
                CellValue::from("extra"),
                CellValue::from("b")
            ]
        );
    }

    #[test]
    fn test_inner_join_keeps_shared_keys_only() {
        let a = people("a", &[(1, "a"), (2, "b"), (3, "c")]);
        let b = people("b", &[(3, "z"), (1, "y")]);

        let merged = run(&a, &b, JoinKind::Inner);
        let keys: Vec<_> = merged
            .table
            .rows
            .iter()
            .map(|r| r.cells[0].to_string())
            .collect();
        assert_eq!(keys, vec!["1", "3"]);
        assert_eq!(merged.stats.unmatched_left_keys, 1);
    }

    #[test]
    fn test_left_join_null_fills_unmatched() {
        let a = people("a", &[(1, "a"), (2, "b"), (2, "b again")]);
        let b = people("b", &[(1, "y")]);

        let merged = run(&a, &b, JoinKind::Left);
        assert_eq!(merged.table.row_count(), 2);
        assert_eq!(merged.table.rows[1].cells[1], CellValue::from("b"));
        assert!(merged.table.rows[1].cells[2].is_null());
        assert_eq!(merged.stats.duplicates_dropped, 1);
    }

    #[test]
    fn test_duplicate_keys_keep_first_occurrence() {
        let a = people("a", &[(1, "first"), (1, "second")]);
        let b = people("b", &[(1, "x"), (1, "y")]);

        let merged = run(&a, &b, JoinKind::Inner);
        assert_eq!(merged.table.row_count(), 1);
        assert_eq!(merged.table.rows[0].cells[1], CellValue::from("first"));
        assert_eq!(merged.table.rows[0].cells[2], CellValue::from("x"));
        assert_eq!(merged.stats.duplicates_dropped, 3);
    }

    #[test]
    fn test_composite_key_joins_with_underscore() {
        let a = Table::from_rows(
            "a",
            ["region", "code", "qty"],
            vec![vec!["EU".into(), CellValue::Int(7), CellValue::Int(10)]],
        );
        let b = Table::from_rows(
            "b",
            ["area", "sku", "price"],
            vec![vec![" EU ".into(), CellValue::Float(7.0), CellValue::Float(2.5)]],
        );

        let table = merge(
            &a,
            &strings(&["region", "code"]),
            &b,
            &strings(&["area", "sku"]),
            &strings(&["qty"]),
            &strings(&["price"]),
            JoinKind::Inner,
        )
        .unwrap();

        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec!["UniqueKey", "qty", "price"]);
        assert_eq!(table.rows[0].cells[0], CellValue::from("EU_7"));
        assert_eq!(table.rows[0].cells[2], CellValue::Float(2.5));
    }

    #[test]
    fn test_key_arity_mismatch_is_rejected() {
        let a = people("a", &[(1, "a")]);
        let b = people("b", &[(1, "b")]);
        let spec = MergeSpec::new(strings(&["id", "n"]), strings(&["id"]));

        let err = KeyedMerger::new(spec).merge(&a, &b).unwrap_err();
        assert!(matches!(err, Error::ComparisonFailed(_)));
    }

    #[test]
    fn test_missing_select_column_names_its_table() {
        let a = people("orders", &[(1, "a")]);
        let b = people("customers", &[(1, "b")]);
        let spec = MergeSpec::new(strings(&["id"]), strings(&["id"]))
            .with_select(strings(&["n"]), strings(&["email"]));

        let err = KeyedMerger::new(spec).merge(&a, &b).unwrap_err();
        assert_eq!(
            err.to_string(),
            "column 'email' not found in table 'customers'"
        );
    }

    #[test]
    fn test_empty_right_table_is_rejected() {
        let a = people("a", &[(1, "a")]);
        let b = people("b", &[]);
        let spec = MergeSpec::new(strings(&["id"]), strings(&["id"]));

        let err = KeyedMerger::new(spec).merge(&a, &b).unwrap_err();
        assert!(matches!(err, Error::EmptyInput { .. }));
    }
}
