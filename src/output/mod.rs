//! Output formatting for reconciliation and merge results

mod json;
mod terminal;
pub mod xlsx;

use anyhow::Result;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::config::OutputFormat;
use crate::diff::Reconciliation;
use crate::merge::MergedTable;

pub use json::JsonOutput;
pub use terminal::TerminalOutput;
pub use xlsx::{merge_workbook, reconciliation_workbook};

/// Trait for report formatters
pub trait OutputFormatter {
    /// Render a reconciliation to a writer
    fn render_reconciliation(
        &self,
        result: &Reconciliation,
        writer: &mut dyn WriteColor,
    ) -> Result<()>;

    /// Render a merged table to a writer
    fn render_merge(&self, merged: &MergedTable, writer: &mut dyn WriteColor) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create the stdout formatter for a format.
    ///
    /// Workbook output goes to a file, so stdout only gets the summary.
    pub fn create(format: OutputFormat, stats_only: bool) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new().with_stats_only(stats_only)),
            OutputFormat::Json => Box::new(JsonOutput::new()),
            OutputFormat::Xlsx => Box::new(TerminalOutput::new().with_stats_only(true)),
        }
    }
}

fn stdout() -> StandardStream {
    let choice = if std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Render a reconciliation to stdout
pub fn render_reconciliation_to_stdout(
    result: &Reconciliation,
    format: OutputFormat,
    stats_only: bool,
) -> Result<()> {
    let formatter = OutputFactory::create(format, stats_only);
    formatter.render_reconciliation(result, &mut stdout())
}

/// Render a merged table to stdout
pub fn render_merge_to_stdout(merged: &MergedTable, format: OutputFormat) -> Result<()> {
    let formatter = OutputFactory::create(format, false);
    formatter.render_merge(merged, &mut stdout())
}
