//! JSON output format

use anyhow::Result;
use serde::Serialize;
use termcolor::WriteColor;

use crate::diff::{CellAlignment, ReconcileStats, Reconciliation};
use crate::merge::{JoinKind, MergeStats, MergedTable};
use crate::model::{CellValue, Table};

use super::OutputFormatter;

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    fn write<T: Serialize>(&self, value: &T, writer: &mut dyn WriteColor) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, value)?;
        } else {
            serde_json::to_writer(&mut *writer, value)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonDiffRow {
    tag: &'static str,
    source_line: usize,
    cells: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    changed_columns: Vec<String>,
}

#[derive(Serialize)]
struct JsonReconciliation<'a> {
    source_file: &'a str,
    target_file: &'a str,
    differences: usize,
    alignment: &'a CellAlignment,
    stats: &'a ReconcileStats,
    rows: Vec<JsonDiffRow>,
}

#[derive(Serialize)]
struct JsonMerge<'a> {
    join: JoinKind,
    columns: Vec<&'a str>,
    stats: &'a MergeStats,
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

fn cell_value_to_json(value: &CellValue) -> serde_json::Value {
    match value {
        CellValue::Null => serde_json::Value::Null,
        CellValue::Bool(b) => serde_json::Value::Bool(*b),
        CellValue::Int(i) => serde_json::json!(*i),
        CellValue::Float(f) => serde_json::json!(*f),
        CellValue::String(s) => serde_json::Value::String(s.to_string()),
        CellValue::Date(d) => serde_json::Value::String(d.to_string()),
        CellValue::DateTime(dt) => serde_json::Value::String(dt.to_string()),
    }
}

fn row_object(names: &[&str], cells: &[CellValue]) -> serde_json::Map<String, serde_json::Value> {
    names
        .iter()
        .zip(cells)
        .map(|(name, cell)| (name.to_string(), cell_value_to_json(cell)))
        .collect()
}

fn column_names(table: &Table) -> Vec<&str> {
    table.column_names().collect()
}

impl OutputFormatter for JsonOutput {
    fn render_reconciliation(
        &self,
        result: &Reconciliation,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        let diff = &result.differences;
        let names: Vec<&str> = diff.columns.iter().map(|c| c.name.as_str()).collect();

        let rows = diff
            .rows
            .iter()
            .enumerate()
            .map(|(row_idx, diff_row)| JsonDiffRow {
                tag: diff_row.tag.label(),
                source_line: diff_row.row.source_line,
                cells: row_object(&names, &diff_row.row.cells),
                changed_columns: names
                    .iter()
                    .enumerate()
                    .filter(|(col, _)| result.emphasis.is_changed(row_idx, *col))
                    .map(|(_, name)| name.to_string())
                    .collect(),
            })
            .collect();

        let output = JsonReconciliation {
            source_file: &result.source.name,
            target_file: &result.target.name,
            differences: result.count(),
            alignment: &result.alignment,
            stats: &result.stats,
            rows,
        };
        self.write(&output, writer)
    }

    fn render_merge(&self, merged: &MergedTable, writer: &mut dyn WriteColor) -> Result<()> {
        let columns = column_names(&merged.table);
        let rows = merged
            .table
            .rows
            .iter()
            .map(|row| row_object(&columns, &row.cells))
            .collect();

        let output = JsonMerge {
            join: merged.join_kind,
            columns,
            stats: &merged.stats,
            rows,
        };
        self.write(&output, writer)
    }
}
