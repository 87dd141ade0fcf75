//! Row matching by full-row value equality

use rustc_hash::FxHashSet;

use crate::model::{CellValue, Table};

use super::RowTag;

/// Tag assigned to every row of both tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPartition {
    /// One tag per source row, in source order
    pub source: Vec<RowTag>,
    /// One tag per target row, in target order
    pub target: Vec<RowTag>,
}

impl RowPartition {
    pub fn source_only(&self) -> usize {
        self.source.iter().filter(|t| **t == RowTag::SourceOnly).count()
    }

    pub fn target_only(&self) -> usize {
        self.target.iter().filter(|t| **t == RowTag::TargetOnly).count()
    }
}

/// Row matcher using hash-based lookup of whole value tuples
pub struct RowMatcher;

impl RowMatcher {
    /// Tag each row as present on one side only or on both.
    ///
    /// Two rows match iff every cell is equal. Multiplicity is ignored for
    /// matching: a tuple present once in the target matches every identical
    /// source row. Unmatched duplicates keep one tag each.
    pub fn partition(source: &Table, target: &Table) -> RowPartition {
        let source_set: FxHashSet<&[CellValue]> =
            source.rows.iter().map(|r| r.cells.as_slice()).collect();
        let target_set: FxHashSet<&[CellValue]> =
            target.rows.iter().map(|r| r.cells.as_slice()).collect();

        let source_tags = source
            .rows
            .iter()
            .map(|row| {
                if target_set.contains(row.cells.as_slice()) {
                    RowTag::Both
                } else {
                    RowTag::SourceOnly
                }
            })
            .collect();

        let target_tags = target
            .rows
            .iter()
            .map(|row| {
                if source_set.contains(row.cells.as_slice()) {
                    RowTag::Both
                } else {
                    RowTag::TargetOnly
                }
            })
            .collect();

        RowPartition {
            source: source_tags,
            target: target_tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(i64, &str)]) -> Table {
        Table::from_rows(
            "t",
            ["id", "name"],
            rows.iter()
                .map(|(id, name)| vec![CellValue::Int(*id), CellValue::from(*name)])
                .collect(),
        )
    }

    #[test]
    fn test_partition_tags_each_side() {
        let source = table(&[(1, "a"), (2, "b"), (3, "c")]);
        let target = table(&[(2, "b"), (3, "C"), (4, "d")]);

        let partition = RowMatcher::partition(&source, &target);
        assert_eq!(
            partition.source,
            vec![RowTag::SourceOnly, RowTag::Both, RowTag::SourceOnly]
        );
        assert_eq!(
            partition.target,
            vec![RowTag::Both, RowTag::TargetOnly, RowTag::TargetOnly]
        );
        assert_eq!(partition.source_only(), 2);
        assert_eq!(partition.target_only(), 2);
    }

    #[test]
    fn test_duplicates_keep_their_multiplicity() {
        let source = table(&[(1, "a"), (1, "a"), (2, "b")]);
        let target = table(&[(2, "b")]);

        let partition = RowMatcher::partition(&source, &target);
        assert_eq!(partition.source_only(), 2);
        assert_eq!(partition.target_only(), 0);
    }

    #[test]
    fn test_single_match_covers_all_duplicates() {
        let source = table(&[(1, "a"), (1, "a")]);
        let target = table(&[(1, "a")]);

        let partition = RowMatcher::partition(&source, &target);
        assert_eq!(partition.source, vec![RowTag::Both, RowTag::Both]);
        assert_eq!(partition.target, vec![RowTag::Both]);
    }
}
