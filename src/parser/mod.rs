//! Parser layer for reading spreadsheet formats

mod csv;
mod excel;

use std::path::Path;

use anyhow::{bail, Result};

use crate::model::Table;

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;

/// Options that affect how a file is read
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// For workbooks: which sheet to read (first sheet when unset)
    pub sheet_name: Option<String>,
}

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table named after the path
    fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Table>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for creating parsers based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(CsvParser), Box::new(ExcelParser)],
        }
    }

    /// Get a parser for the given file path
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        for parser in &self.parsers {
            if parser.supports_extension(&ext) {
                return Ok(parser.as_ref());
            }
        }

        bail!(
            "Unsupported file format: {}",
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
        )
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Table> {
        let parser = self.get_parser(path)?;
        let table = parser.parse(path, options)?;
        tracing::debug!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "read table"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_dispatches_on_extension() {
        let factory = ParserFactory::new();
        assert!(factory.get_parser(Path::new("data.CSV")).is_ok());
        assert!(factory.get_parser(Path::new("book.xlsx")).is_ok());
        assert!(factory.get_parser(Path::new("data.parquet")).is_err());
        assert!(factory.get_parser(Path::new("noext")).is_err());
    }
}
