//! Excel file parser (xlsx, xls, ods)

use std::borrow::Cow;
use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::model::{columns_from_names, CellValue, Table};

use super::{Parser, ReadOptions};

/// Parser for Excel files
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Table> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

        // Get sheet name
        let sheet_name = if let Some(ref name) = options.sheet_name {
            name.clone()
        } else {
            // Use first sheet
            let sheets = workbook.sheet_names();
            if sheets.is_empty() {
                bail!("No sheets found in workbook");
            }
            sheets[0].clone()
        };

        // Get the sheet range
        let range: Range<Data> = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

        parse_range(&range, path.display().to_string())
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "ods" | "xlsm")
    }
}

/// Convert a sheet range into a table; the first row is the header
pub fn parse_range(range: &Range<Data>, name: String) -> Result<Table> {
    let (row_count, col_count) = range.get_size();

    if row_count == 0 {
        bail!("Empty sheet");
    }

    let header_row = range.rows().next().context("No header row found")?;
    let headers = header_row.iter().enumerate().map(|(i, cell)| {
        let name = cell_to_string(cell);
        if name.trim().is_empty() {
            format!("Column{}", i + 1)
        } else {
            name
        }
    });

    let mut table = Table::new(name, columns_from_names(headers));

    // Read data rows
    for (line_num, row) in range.rows().skip(1).enumerate() {
        let cells: Vec<CellValue> = row.iter().take(col_count).map(convert_cell).collect();
        table.add_row(cells, line_num + 2); // +2 for 1-indexing and header
    }

    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        // Kept verbatim; whitespace is normalized by the comparison itself
        Data::String(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Float(f) => {
            // Check if it's actually an integer
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(ref dt) => {
            // calamine ExcelDateTime - use Display to convert and parse
            let s = format!("{}", dt);
            if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f") {
                CellValue::DateTime(datetime)
            } else if let Ok(datetime) =
                chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
            {
                CellValue::DateTime(datetime)
            } else if let Ok(date) = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                CellValue::Date(date)
            } else {
                CellValue::String(Cow::Owned(s))
            }
        }
        Data::DateTimeIso(s) => {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                CellValue::DateTime(dt)
            } else if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                CellValue::Date(d)
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::DurationIso(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Error(e) => CellValue::String(Cow::Owned(format!("#{:?}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cell_keeps_text_verbatim() {
        assert_eq!(
            convert_cell(&Data::String("  padded ".into())),
            CellValue::from("  padded ")
        );
        assert_eq!(convert_cell(&Data::Float(4.0)), CellValue::Int(4));
        assert_eq!(convert_cell(&Data::Float(4.25)), CellValue::Float(4.25));
        assert_eq!(convert_cell(&Data::Empty), CellValue::Null);
    }

    #[test]
    fn test_parse_workbook_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "id").unwrap();
        sheet.write_string(0, 2, "name").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_string(1, 2, " alice ").unwrap();
        workbook.save(&path).unwrap();

        let table = ExcelParser.parse(&path, &ReadOptions::default()).unwrap();
        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec!["id", "Column2", "name"]);
        assert_eq!(
            table.rows[0].cells,
            vec![CellValue::Int(1), CellValue::Null, CellValue::from(" alice ")]
        );
    }
}
