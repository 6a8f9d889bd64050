//! Read header rows from local `.xlsx` files

use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, Xlsx, open_workbook};

/// Trimmed header strings of the 1-based `header_row` of `sheet` (first
/// sheet when `None`). Blank cells stay as empty strings so positions line
/// up with the sheet's columns.
pub fn read_headers(path: &Path, sheet: Option<&str>, header_row: u32) -> Result<Vec<String>> {
    if header_row == 0 {
        bail!("Header row is 1-based, got 0");
    }

    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) if names.iter().any(|n| n == name) => name.to_string(),
        Some(name) => bail!(
            "Sheet '{}' not found in {}. Available: {}",
            name,
            path.display(),
            names.join(", ")
        ),
        None => names.first().context("Excel file has no sheets")?.clone(),
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

    let Some((start_row, start_col)) = range.start() else {
        log::warn!("Sheet '{}' is empty", sheet_name);
        return Ok(Vec::new());
    };
    let end_col = range.end().map(|(_, c)| c).unwrap_or(start_col);
    let row = header_row - 1;

    if row < start_row {
        return Ok(Vec::new());
    }

    let headers: Vec<String> = (0..=end_col)
        .map(|col| {
            range
                .get_value((row, col))
                .map(cell_text)
                .unwrap_or_default()
        })
        .collect();

    // Columns after the last non-blank header carry nothing
    let last = headers.iter().rposition(|h| !h.is_empty());
    let headers = match last {
        Some(last) => headers[..=last].to_vec(),
        None => Vec::new(),
    };

    log::debug!(
        "Read {} header(s) from '{}' row {}",
        headers.len(),
        sheet_name,
        header_row
    );
    Ok(headers)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}
