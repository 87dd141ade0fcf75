//! Workbook output with emphasis fills
//!
//! Workbooks are built entirely in memory and returned as bytes, so a failed
//! render never leaves a partial file behind and concurrent runs never share
//! an output path.

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

use crate::diff::{Emphasis, Reconciliation};
use crate::merge::MergedTable;
use crate::model::{CellValue, Table};

pub const SOURCE_SHEET: &str = "Source";
pub const TARGET_SHEET: &str = "Target";
pub const DIFFERENCES_SHEET: &str = "Differences";
pub const MERGED_SHEET: &str = "Merged";

/// Written below the header of an empty Differences sheet
pub const NO_DIFFERENCES_NOTE: &str = "No difference found between source and target files.";

const YELLOW: u32 = 0xFFFF00;
const PINK: u32 = 0xFFC0CB;
const RED: u32 = 0xFF0000;

/// Fill color for an emphasis marker
pub fn emphasis_color(emphasis: Emphasis) -> u32 {
    match emphasis {
        Emphasis::SourceOnly => YELLOW,
        Emphasis::TargetOnly => PINK,
        Emphasis::CellChanged => RED,
    }
}

fn fill(emphasis: Emphasis) -> Format {
    Format::new().set_background_color(Color::RGB(emphasis_color(emphasis)))
}

/// Build the Source / Target / Differences workbook for a reconciliation
pub fn reconciliation_workbook(result: &Reconciliation) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    write_table_sheet(workbook.add_worksheet(), SOURCE_SHEET, &result.source)?;
    write_table_sheet(workbook.add_worksheet(), TARGET_SHEET, &result.target)?;
    write_differences_sheet(workbook.add_worksheet(), result)?;

    workbook
        .save_to_buffer()
        .context("Failed to build differences workbook")
}

/// Build the single-sheet workbook for a merge
pub fn merge_workbook(merged: &MergedTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    write_table_sheet(workbook.add_worksheet(), MERGED_SHEET, &merged.table)?;
    workbook
        .save_to_buffer()
        .context("Failed to build merged workbook")
}

/// Store a rendered workbook at a caller-chosen path
pub fn write_workbook(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write workbook: {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote workbook");
    Ok(())
}

fn write_header<'a, I>(worksheet: &mut Worksheet, names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let bold = Format::new().set_bold();
    for (col, name) in names.into_iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &bold)
            .with_context(|| format!("Failed to write header cell {}", col))?;
    }
    Ok(())
}

fn write_table_sheet(worksheet: &mut Worksheet, name: &str, table: &Table) -> Result<()> {
    worksheet
        .set_name(name)
        .with_context(|| format!("Failed to create sheet '{}'", name))?;
    write_header(worksheet, table.column_names())?;

    let plain = Format::new();
    for (idx, row) in table.rows.iter().enumerate() {
        for (col, cell) in row.cells.iter().enumerate() {
            write_cell(worksheet, idx + 1, col, cell, &plain)?;
        }
    }
    Ok(())
}

fn write_differences_sheet(worksheet: &mut Worksheet, result: &Reconciliation) -> Result<()> {
    let diff = &result.differences;
    worksheet
        .set_name(DIFFERENCES_SHEET)
        .with_context(|| format!("Failed to create sheet '{}'", DIFFERENCES_SHEET))?;
    let header = diff.header();
    write_header(worksheet, header.iter().map(String::as_str))?;

    if diff.is_empty() {
        worksheet
            .write_string(1, 0, NO_DIFFERENCES_NOTE)
            .context("Failed to write no-differences note")?;
        return Ok(());
    }

    let plain = Format::new();
    for (idx, diff_row) in diff.rows.iter().enumerate() {
        for (col, cell) in diff_row.cells_with_tag().iter().enumerate() {
            let format = result.emphasis.cell(idx, col).map(fill);
            write_cell(worksheet, idx + 1, col, cell, format.as_ref().unwrap_or(&plain))?;
        }
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: usize,
    col: usize,
    cell: &CellValue,
    format: &Format,
) -> Result<()> {
    let (row32, col16) = (row as u32, col as u16);
    let written = match cell {
        CellValue::Null => worksheet.write_blank(row32, col16, format),
        CellValue::Bool(b) => worksheet.write_boolean_with_format(row32, col16, *b, format),
        CellValue::Int(i) => worksheet.write_number_with_format(row32, col16, *i as f64, format),
        CellValue::Float(f) => worksheet.write_number_with_format(row32, col16, *f, format),
        other => worksheet.write_string_with_format(row32, col16, other.display().into_owned(), format),
    };
    written.with_context(|| format!("Failed to write cell ({}, {})", row, col))?;
    Ok(())
}
