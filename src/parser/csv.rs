//! CSV file parser

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{columns_from_names, CellValue, Table};

use super::{Parser, ReadOptions};

/// Parser for CSV files
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, path: &Path, _options: &ReadOptions) -> Result<Table> {
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        };
        read_csv(
            BufReader::new(file),
            delimiter,
            path.display().to_string(),
        )
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

/// Read delimited text with a header row into a table
pub fn read_csv<R: Read>(reader: R, delimiter: u8, name: String) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    // Read headers
    let headers = csv_reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let mut table = Table::new(name, columns_from_names(headers.iter()));

    // Read rows
    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", line_num + 2))?; // +2 for 1-indexing and header

        let cells: Vec<CellValue> = record
            .iter()
            .take(table.column_count())
            .map(parse_cell_value)
            .collect();

        table.add_row(cells, line_num + 2);
    }

    Ok(table)
}

/// Parse a field: blanks and null markers become Null. A field becomes a
/// number only when the number prints back as the same text, so `007`,
/// `1.0` and `+5` stay strings. Everything else is kept verbatim.
fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed == "NA" {
        return CellValue::Null;
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        if i.to_string() == trimmed {
            return CellValue::Int(i);
        }
    } else if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() && f.to_string() == trimmed {
            return CellValue::Float(f);
        }
    }

    CellValue::String(Cow::Owned(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_value() {
        assert_eq!(parse_cell_value(""), CellValue::Null);
        assert_eq!(parse_cell_value("null"), CellValue::Null);
        assert_eq!(parse_cell_value("42"), CellValue::Int(42));
        assert_eq!(parse_cell_value(" 3.5 "), CellValue::Float(3.5));
        assert_eq!(
            parse_cell_value(" hello "),
            CellValue::String(Cow::Owned(" hello ".to_string()))
        );
        assert_eq!(parse_cell_value("inf"), CellValue::from("inf"));
    }

    #[test]
    fn test_numbers_must_print_back_unchanged() {
        assert_eq!(parse_cell_value("007"), CellValue::from("007"));
        assert_eq!(parse_cell_value("1.0"), CellValue::from("1.0"));
        assert_eq!(parse_cell_value("+5"), CellValue::from("+5"));
        assert_eq!(parse_cell_value("1e3"), CellValue::from("1e3"));
        assert_eq!(parse_cell_value("-12"), CellValue::Int(-12));
        assert_eq!(parse_cell_value("0.25"), CellValue::Float(0.25));
    }

    #[test]
    fn test_leading_zeros_and_decimal_zeros_are_differences() {
        let source = read_csv("code,qty\n007,1.0\n".as_bytes(), b',', "a.csv".into()).unwrap();
        let target = read_csv("code,qty\n7,1\n".as_bytes(), b',', "b.csv".into()).unwrap();
        assert_eq!(source.rows[0].cells, vec![CellValue::from("007"), CellValue::from("1.0")]);

        let result = crate::diff::SetReconciler::new().reconcile(source, target).unwrap();
        assert_eq!(result.count(), 2);
    }

    #[test]
    fn test_read_csv_pads_and_truncates_rows() {
        let data = "id,name,qty\n1,bolt\n2,nut,5,extra\n";
        let table = read_csv(data.as_bytes(), b',', "parts.csv".into()).unwrap();

        assert_eq!(table.name, "parts.csv");
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.rows[0].cells[2], CellValue::Null);
        assert_eq!(table.rows[1].cells.len(), 3);
        assert_eq!(table.rows[1].cells[2], CellValue::Int(5));
        assert_eq!(table.rows[1].source_line, 3);
    }

    #[test]
    fn test_read_tab_delimited() {
        let data = "a\tb\nx\t1\n";
        let table = read_csv(data.as_bytes(), b'\t', "t.tsv".into()).unwrap();
        assert_eq!(table.rows[0].cells, vec![CellValue::from("x"), CellValue::Int(1)]);
    }
}
