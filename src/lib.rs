//! sheetdiff - Spreadsheet reconciliation and keyed merge
//!
//! Compares two tables of identical shape as multisets of rows, reporting the
//! rows present on only one side with per-cell highlighting, and joins two
//! tables on a synthetic key built from chosen columns.

pub mod config;
pub mod diff;
pub mod error;
pub mod merge;
pub mod model;
pub mod output;
pub mod parser;

pub use config::{Config, MergeConfig};
pub use diff::{reconcile, Reconciliation, SetReconciler};
pub use error::{Error, Result};
pub use merge::{merge, JoinKind, KeyedMerger, MergeSpec};
pub use model::{CellValue, Table};
