//! Local workbook access

pub mod headers;

pub use headers::read_headers;
