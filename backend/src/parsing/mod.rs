//! Parsers for uploaded dashboard data.
//!
//! Uploads are CSV text with a header row. Polars does the tokenizing and
//! dtype inference; the result is converted to the dashboard [`Table`] model
//! right away so the rest of the crate never touches DataFrames.
//!
//! [`Table`]: crate::models::Table

pub mod csv_parser;


pub use csv_parser::{parse_csv, parse_csv_dataframe};
