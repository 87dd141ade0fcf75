//! Configuration handling for sheetdiff

use std::path::PathBuf;

use crate::merge::{JoinKind, MergeSpec};
use crate::parser::ReadOptions;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    /// Workbook with styled sheets; requires an output path
    Xlsx,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Configuration for a compare run
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path to the source file
    pub source_file: PathBuf,
    /// Path to the target file
    pub target_file: PathBuf,
    /// Columns used to pair differing rows for cell highlighting
    pub key_columns: Vec<String>,
    /// Output format
    pub output_format: OutputFormat,
    /// Where to write the workbook, if anywhere
    pub output_path: Option<PathBuf>,
    /// For Excel files: which sheet to compare
    pub sheet_name: Option<String>,
    /// Only show statistics, not detailed rows
    pub stats_only: bool,
}

impl Config {
    /// Create a new Config with file paths
    pub fn new(source_file: PathBuf, target_file: PathBuf) -> Self {
        Self {
            source_file,
            target_file,
            ..Default::default()
        }
    }

    /// Set key columns for cell highlighting
    pub fn with_key_columns(mut self, keys: Vec<String>) -> Self {
        self.key_columns = keys;
        self
    }

    /// Set output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set workbook output path
    pub fn with_output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }

    /// Set Excel sheet name
    pub fn with_sheet_name(mut self, name: String) -> Self {
        self.sheet_name = Some(name);
        self
    }

    /// Enable stats-only mode
    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            sheet_name: self.sheet_name.clone(),
        }
    }
}

/// Configuration for a merge run
#[derive(Debug, Clone, Default)]
pub struct MergeConfig {
    pub left_file: PathBuf,
    pub right_file: PathBuf,
    pub left_keys: Vec<String>,
    pub right_keys: Vec<String>,
    /// Columns kept from the left file; defaults to its keys
    pub left_select: Vec<String>,
    /// Columns kept from the right file; defaults to its keys
    pub right_select: Vec<String>,
    pub join_kind: JoinKind,
    pub output_format: OutputFormat,
    pub output_path: Option<PathBuf>,
    pub sheet_name: Option<String>,
}

impl MergeConfig {
    pub fn new(left_file: PathBuf, right_file: PathBuf) -> Self {
        Self {
            left_file,
            right_file,
            ..Default::default()
        }
    }

    pub fn with_keys(mut self, left: Vec<String>, right: Vec<String>) -> Self {
        self.left_keys = left;
        self.right_keys = right;
        self
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

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }

    pub fn with_sheet_name(mut self, name: String) -> Self {
        self.sheet_name = Some(name);
        self
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            sheet_name: self.sheet_name.clone(),
        }
    }

    /// Merge spec with empty selections falling back to each side's keys
    pub fn merge_spec(&self) -> MergeSpec {
        let pick = |select: &[String], keys: &[String]| {
            if select.is_empty() {
                keys.to_vec()
            } else {
                select.to_vec()
            }
        };
        MergeSpec::new(self.left_keys.clone(), self.right_keys.clone())
            .with_select(
                pick(&self.left_select, &self.left_keys),
                pick(&self.right_select, &self.right_keys),
            )
            .with_join_kind(self.join_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("excel".parse::<OutputFormat>(), Ok(OutputFormat::Xlsx));
        assert!("html".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_merge_spec_defaults_selection_to_keys() {
        let config = MergeConfig::new("a.csv".into(), "b.csv".into())
            .with_keys(vec!["id".into()], vec!["cust_id".into()])
            .with_select(vec![], vec!["email".into()])
            .with_join_kind(JoinKind::Inner);

        let spec = config.merge_spec();
        assert_eq!(spec.left_select, vec!["id".to_string()]);
        assert_eq!(spec.right_select, vec!["email".to_string()]);
        assert_eq!(spec.join_kind, JoinKind::Inner);
    }
}
