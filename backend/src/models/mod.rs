pub mod selection;
pub mod series;
pub mod table;

pub use selection::*;
pub use series::Series;
pub use table::{Column, ColumnValues, DType, Table};
