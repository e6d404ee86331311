use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::models::{Column as TableColumn, Table};

fn parse_error(err: PolarsError) -> DashboardError {
    DashboardError::Parse(err.to_string())
}

/// Parse uploaded CSV bytes into a Polars DataFrame.
///
/// The header row is required. Types are inferred from every row so a late
/// decimal value still makes the whole column float.
pub fn parse_csv_dataframe(content: &[u8]) -> Result<DataFrame> {
    if content.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(DashboardError::Parse("uploaded file is empty".to_string()));
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(content.to_vec()))
        .finish()
        .map_err(parse_error)
}

/// Parse uploaded CSV bytes into a [`Table`].
pub fn parse_csv(content: &[u8]) -> Result<Table> {
    let df = parse_csv_dataframe(content)?;
    let table = dataframe_to_table(&df)?;
    debug!(
        rows = table.height(),
        columns = table.width(),
        "parsed CSV upload"
    );
    Ok(table)
}

/// Convert a Polars DataFrame to the dashboard table model.
pub fn dataframe_to_table(df: &DataFrame) -> Result<Table> {
    let columns = df
        .get_columns()
        .iter()
        .map(convert_column)
        .collect::<Result<Vec<_>>>()?;
    Table::new(columns)
}

fn convert_column(column: &Column) -> Result<TableColumn> {
    let name = column.name().to_string();
    let dtype = column.dtype();

    // An empty column is inferred as text; report it as null instead.
    let all_missing = column.len() > 0 && column.null_count() == column.len();
    if all_missing || matches!(dtype, DataType::Null) {
        return Ok(TableColumn::null(name, column.len()));
    }

    let converted = if dtype.is_integer() {
        let cast = column.cast(&DataType::Int64).map_err(parse_error)?;
        let values = cast.i64().map_err(parse_error)?.into_iter().collect();
        TableColumn::integer(name, values)
    } else if dtype.is_float() {
        let cast = column.cast(&DataType::Float64).map_err(parse_error)?;
        let values = cast.f64().map_err(parse_error)?.into_iter().collect();
        TableColumn::float(name, values)
    } else if matches!(dtype, DataType::Boolean) {
        let values = column.bool().map_err(parse_error)?.into_iter().collect();
        TableColumn::boolean(name, values)
    } else {
        // Dates and anything else are kept as their textual form.
        let cast = column.cast(&DataType::String).map_err(parse_error)?;
        let values = cast
            .str()
            .map_err(parse_error)?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        TableColumn::text(name, values)
    };

    Ok(converted)
}
