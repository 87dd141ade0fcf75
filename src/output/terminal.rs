//! Colored terminal output

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::diff::{Reconciliation, RowTag};
use crate::merge::MergedTable;
use crate::model::Table;

use super::OutputFormatter;

/// Suffix appended to changed cells in row tables
const CHANGED_MARKER: &str = " *";

/// Terminal output with colors
pub struct TerminalOutput {
    stats_only: bool,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self { stats_only: false }
    }

    /// Only print the header and counts
    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }

    fn write_header(&self, writer: &mut dyn WriteColor, left: &str, right: &str) -> Result<()> {
        writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(writer, " sheetdiff: {} → {}", left, right)?;
        writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_summary(&self, result: &Reconciliation, writer: &mut dyn WriteColor) -> Result<()> {
        let stats = &result.stats;
        writeln!(
            writer,
            "Summary: {} source only, {} target only, {} matched (out of {} → {} rows)",
            stats.source_only,
            stats.target_only,
            stats.matched_source_rows,
            stats.source_rows,
            stats.target_rows
        )?;
        writeln!(writer, "Cells changed: {}", stats.cells_changed)?;
        writeln!(writer, "Cell highlighting: {}", result.alignment)?;
        if result.alignment.is_positional() {
            with_color(writer, Color::Yellow, |w| {
                writeln!(
                    w,
                    "  note: no key columns given; cells were compared across the two halves of each row"
                )
            })?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_tagged_rows(
        &self,
        result: &Reconciliation,
        tag: RowTag,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        let diff = &result.differences;
        let indexed: Vec<_> = diff
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.tag == tag)
            .collect();
        if indexed.is_empty() {
            return Ok(());
        }

        with_color(writer, tag_color(tag), |w| {
            writeln!(w, "{} ({}):", tag.label(), indexed.len())
        })?;

        let mut data = vec![diff.header()];
        for (row_idx, diff_row) in indexed {
            let mut cells: Vec<String> = diff_row
                .row
                .cells
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    if result.emphasis.is_changed(row_idx, col) {
                        format!("{}{}", cell.display(), CHANGED_MARKER)
                    } else {
                        cell.display().into_owned()
                    }
                })
                .collect();
            cells.push(diff_row.tag.label().to_string());
            data.push(cells);
        }
        writeln!(writer, "{}", build_table(data))?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_table(&self, table: &Table, writer: &mut dyn WriteColor) -> Result<()> {
        let mut data = vec![table.column_names().map(str::to_string).collect::<Vec<_>>()];
        data.extend(table.rows.iter().map(|row| {
            row.cells
                .iter()
                .map(|c| c.display().into_owned())
                .collect::<Vec<_>>()
        }));
        writeln!(writer, "{}", build_table(data))?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render_reconciliation(
        &self,
        result: &Reconciliation,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        self.write_header(writer, &result.source.name, &result.target.name)?;

        if !result.has_differences() {
            with_color(writer, Color::Green, |w| writeln!(w, "No differences found."))?;
            return Ok(());
        }

        with_color(writer, Color::Red, |w| {
            writeln!(w, "Found {} differences.", result.count())
        })?;
        self.write_summary(result, writer)?;

        if self.stats_only {
            return Ok(());
        }

        self.write_tagged_rows(result, RowTag::SourceOnly, writer)?;
        self.write_tagged_rows(result, RowTag::TargetOnly, writer)?;
        Ok(())
    }

    fn render_merge(&self, merged: &MergedTable, writer: &mut dyn WriteColor) -> Result<()> {
        let stats = &merged.stats;
        writeln!(
            writer,
            "Merged {} → {} rows ({} join, {} left / {} right rows)",
            stats.left_rows, stats.output_rows, merged.join_kind, stats.left_rows, stats.right_rows
        )?;
        writeln!(
            writer,
            "Unmatched left keys: {}, duplicate rows dropped: {}",
            stats.unmatched_left_keys, stats.duplicates_dropped
        )?;
        writeln!(writer)?;

        if self.stats_only || merged.table.is_empty() {
            return Ok(());
        }
        self.write_table(&merged.table, writer)
    }
}

fn tag_color(tag: RowTag) -> Color {
    match tag {
        RowTag::SourceOnly => Color::Yellow,
        RowTag::TargetOnly => Color::Magenta,
        RowTag::Both => Color::White,
    }
}

/// Run `f` with the foreground color set, resetting afterwards
fn with_color<F>(writer: &mut dyn WriteColor, color: Color, f: F) -> Result<()>
where
    F: FnOnce(&mut dyn WriteColor) -> std::io::Result<()>,
{
    writer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    let written = f(&mut *writer);
    writer.reset()?;
    written?;
    Ok(())
}

/// Build a formatted table from rows of text, header first
fn build_table(data: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    for record in data {
        builder.push_record(record);
    }
    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}
