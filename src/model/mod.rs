//! Data model for tabular data representation

mod key;
mod schema;
mod table;

pub use key::{KeyBuilder, KEY_SEPARATOR};
pub use schema::{columns_from_names, Column};
pub use table::{CellValue, Row, Table};
