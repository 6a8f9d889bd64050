//! Report data types

pub mod fragment;
pub mod value;

pub use fragment::{ReportFragment, Row};
pub use value::CellValue;
