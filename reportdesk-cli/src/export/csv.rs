//! Consolidated CSV export

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};

use crate::report::{ReportFragment, format_cell};

/// Write fragments stacked in one CSV file
pub fn write_csv(fragments: &[ReportFragment], path: &Path) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    write_fragments(&mut wtr, fragments)?;

    wtr.flush().context("Failed to flush CSV writer")?;
    log::info!("CSV file exported to: {}", path.display());
    Ok(())
}

/// Title line, header line, rendered rows and a blank line per fragment
pub fn write_fragments<W: Write>(wtr: &mut Writer<W>, fragments: &[ReportFragment]) -> Result<()> {
    for fragment in fragments {
        wtr.write_record([fragment.title.as_str()])
            .with_context(|| format!("Failed to write title: {}", fragment.title))?;

        let columns = fragment.columns();
        wtr.write_record(&columns)
            .with_context(|| format!("Failed to write header of {}", fragment.title))?;

        for row in &fragment.rows {
            let cells = columns.iter().enumerate().map(|(i, column)| {
                format_cell(fragment.cell(row, column), fragment.is_percent_column(i))
            });
            wtr.write_record(cells)
                .with_context(|| format!("Failed to write row of {}", fragment.title))?;
        }

        wtr.write_record([""])
            .context("Failed to write separator")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Row;

    #[test]
    fn test_stacked_csv() {
        let mut row = Row::new();
        row.insert("Area".to_string(), "SALEM".into());
        row.insert("Billed".to_string(), 1234567.0.into());
        row.insert("%".to_string(), 75.5.into());

        let fragment = ReportFragment::new(
            "BUDGET VS BILLED - QUANTITY - APRIL",
            vec!["Area".to_string(), "Billed".to_string(), "%".to_string()],
            vec![row],
        )
        .with_percent_columns([2]);

        let mut wtr = WriterBuilder::new().flexible(true).from_writer(vec![]);
        write_fragments(&mut wtr, &[fragment]).unwrap();
        let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "BUDGET VS BILLED - QUANTITY - APRIL");
        assert_eq!(lines[1], "Area,Billed,%");
        assert_eq!(lines[2], "SALEM,\"1,234,567\",75.50%");
    }
}
