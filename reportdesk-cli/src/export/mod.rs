//! Consolidated export: Excel workbook, CSV and terminal tables

pub mod csv;
pub mod excel;
pub mod table;
pub mod title;

pub use excel::{SheetLayout, write_workbook};
pub use table::render_table;
pub use title::{clean_title, is_total_row};

use std::path::Path;

use anyhow::{Result, bail};

use crate::report::ReportFragment;

/// Export by file extension (`.xlsx` or `.csv`)
pub fn export_to_path(fragments: &[ReportFragment], path: &Path, layout: SheetLayout) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") => write_workbook(fragments, path, layout),
        Some("csv") => {
            if layout == SheetLayout::PerCategory {
                log::warn!("CSV output has no sheets; writing all categories to one file");
            }
            self::csv::write_csv(fragments, path)
        }
        _ => bail!(
            "Unsupported export format: {} (expected .xlsx or .csv)",
            path.display()
        ),
    }
}
