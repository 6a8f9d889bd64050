//! Consolidated Excel workbook

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use super::title::{clean_title, is_total_row, sheet_name};
use crate::report::format::parse_float;
use crate::report::{CellValue, ReportFragment, format_cell};

const SINGLE_SHEET_NAME: &str = "Consolidated Report";
const PERCENT_FORMAT: &str = "0.00\"%\"";

/// How fragments are spread over worksheets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetLayout {
    /// Every fragment stacked on one sheet
    #[default]
    Single,
    /// One sheet per store category, in order of first appearance
    PerCategory,
}

struct Formats {
    title: Format,
    header: Format,
    percent: Format,
    total: Format,
    total_percent: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(13),
            header: Format::new().set_bold(),
            percent: Format::new().set_num_format(PERCENT_FORMAT),
            total: Format::new().set_bold(),
            total_percent: Format::new().set_bold().set_num_format(PERCENT_FORMAT),
        }
    }
}

/// Write fragments to an `.xlsx` file
pub fn write_workbook(fragments: &[ReportFragment], path: &Path, layout: SheetLayout) -> Result<()> {
    let mut workbook = Workbook::new();
    let formats = Formats::new();

    match layout {
        SheetLayout::Single => {
            let sheet = workbook.add_worksheet();
            sheet.set_name(SINGLE_SHEET_NAME)?;
            write_fragments(sheet, fragments.iter(), &formats)?;
        }
        SheetLayout::PerCategory => {
            let mut used = HashSet::new();
            for category in categories_in_order(fragments) {
                let name = unique_sheet_name(&category, &mut used);
                let sheet = workbook.add_worksheet();
                sheet
                    .set_name(&name)
                    .with_context(|| format!("Invalid sheet name: {}", name))?;
                write_fragments(
                    sheet,
                    fragments.iter().filter(|f| f.category == category),
                    &formats,
                )?;
            }
            if used.is_empty() {
                workbook.add_worksheet().set_name(SINGLE_SHEET_NAME)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

    log::info!(
        "Exported {} report(s) to {}",
        fragments.len(),
        path.display()
    );
    Ok(())
}

fn categories_in_order(fragments: &[ReportFragment]) -> Vec<String> {
    let mut seen = Vec::new();
    for fragment in fragments {
        if !seen.contains(&fragment.category) {
            seen.push(fragment.category.clone());
        }
    }
    seen
}

/// Excel compares sheet names case-insensitively
fn unique_sheet_name(category: &str, used: &mut HashSet<String>) -> String {
    let base = sheet_name(category);
    let mut name = base.clone();
    let mut n = 2;
    while used.contains(&name.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = 31usize.saturating_sub(suffix.len());
        name = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    used.insert(name.to_lowercase());
    name
}

/// Title row, header row, data rows, blank spacer; per fragment
fn write_fragments<'a>(
    sheet: &mut Worksheet,
    fragments: impl Iterator<Item = &'a ReportFragment>,
    formats: &Formats,
) -> Result<()> {
    let mut row: u32 = 0;

    for fragment in fragments {
        sheet.write_string_with_format(row, 0, clean_title(&fragment.title), &formats.title)?;
        row += 1;

        let columns = fragment.columns();
        for (col, name) in columns.iter().enumerate() {
            sheet.write_string_with_format(row, column_index(col)?, name, &formats.header)?;
        }
        row += 1;

        for record in &fragment.rows {
            let total = columns
                .first()
                .map(|first| is_total_row(fragment.cell(record, first)))
                .unwrap_or(false);

            for (col, name) in columns.iter().enumerate() {
                let value = fragment.cell(record, name);
                let percent = fragment.is_percent_column(col);
                write_cell(sheet, row, column_index(col)?, value, percent, total, formats)?;
            }
            row += 1;
        }

        row += 1;
    }

    sheet.autofit();
    Ok(())
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col)
        .map_err(|_| anyhow!("Report has too many columns for a worksheet ({})", col + 1))
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    percent: bool,
    total: bool,
    formats: &Formats,
) -> Result<()> {
    if percent {
        let n = parse_float(value).unwrap_or(0.0);
        let format = if total { &formats.total_percent } else { &formats.percent };
        sheet.write_number_with_format(row, col, n, format)?;
        return Ok(());
    }

    match value {
        CellValue::Empty => {}
        CellValue::Number(n) if n.is_finite() => {
            if total {
                sheet.write_number_with_format(row, col, *n, &formats.total)?;
            } else {
                sheet.write_number(row, col, *n)?;
            }
        }
        other => {
            let text = format_cell(other, false);
            if total {
                sheet.write_string_with_format(row, col, text, &formats.total)?;
            } else {
                sheet.write_string(row, col, text)?;
            }
        }
    }
    Ok(())
}
