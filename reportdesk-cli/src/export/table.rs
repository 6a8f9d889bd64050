//! Plain-text table rendering for the terminal

use unicode_width::UnicodeWidthStr;

use crate::report::{ReportFragment, format_cell};

/// Render a fragment as an aligned text table under its title
pub fn render_table(fragment: &ReportFragment) -> String {
    let columns = fragment.columns();

    let body: Vec<Vec<String>> = fragment
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, column)| format_cell(fragment.cell(row, column), fragment.is_percent_column(i)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            body.iter()
                .map(|cells| cells[i].width())
                .chain(std::iter::once(column.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&fragment.title);
    out.push('\n');
    out.push_str(&render_line(&columns, &widths));
    out.push_str(&render_line(
        &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
        &widths,
    ));
    for cells in &body {
        out.push_str(&render_line(cells, &widths));
    }
    out
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.width());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Row;

    #[test]
    fn test_render_alignment() {
        let mut a = Row::new();
        a.insert("Branch".to_string(), "ÉRODE".into());
        a.insert("Count".to_string(), 1500.0.into());
        let mut b = Row::new();
        b.insert("Branch".to_string(), "CHENNAI".into());

        let fragment = ReportFragment::new(
            "NUMBER OF BILLED CUSTOMERS - MAY",
            vec!["Branch".to_string(), "Count".to_string()],
            vec![a, b],
        );

        let text = render_table(&fragment);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "NUMBER OF BILLED CUSTOMERS - MAY");
        assert_eq!(lines[1], "Branch   Count");
        assert_eq!(lines[2], "-------  -----");
        assert_eq!(lines[3], "ÉRODE    1,500");
        assert_eq!(lines[4], "CHENNAI");
    }
}
