//! Report fragments: one titled table ready for consolidated export

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::value::CellValue;

/// One record of a report table (column name -> cell)
pub type Row = BTreeMap<String, CellValue>;

/// A titled table produced by one report flow
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportFragment {
    #[serde(default, alias = "df")]
    pub rows: Vec<Row>,
    /// Display/export order; may name keys absent from some rows
    #[serde(default, alias = "columns")]
    pub column_order: Vec<String>,
    #[serde(default)]
    pub title: String,
    /// Zero-based positions in `column_order` rendered as percentages
    #[serde(default, alias = "percent_cols")]
    pub percent_columns: BTreeSet<usize>,
    #[serde(default)]
    pub category: String,
}

impl ReportFragment {
    pub fn new(title: impl Into<String>, column_order: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            rows,
            column_order,
            title: title.into(),
            percent_columns: BTreeSet::new(),
            category: String::new(),
        }
    }

    /// Builder-style helper for percent column positions
    pub fn with_percent_columns(mut self, positions: impl IntoIterator<Item = usize>) -> Self {
        self.percent_columns = positions.into_iter().collect();
        self
    }

    /// A fragment with neither rows nor columns carries nothing to export
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.column_order.is_empty()
    }

    /// Effective column list: `column_order`, or the sorted union of row keys
    pub fn columns(&self) -> Vec<String> {
        if !self.column_order.is_empty() {
            return self.column_order.clone();
        }

        let keys: BTreeSet<&String> = self.rows.iter().flat_map(|r| r.keys()).collect();
        keys.into_iter().cloned().collect()
    }

    pub fn is_percent_column(&self, position: usize) -> bool {
        self.percent_columns.contains(&position)
    }

    /// Cell lookup that tolerates missing keys
    pub fn cell<'a>(&'a self, row: &'a Row, column: &str) -> &'a CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        row.get(column).unwrap_or(&EMPTY)
    }

    /// Rename row keys (old -> new). Keys not present in a row are left alone.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for row in &mut self.rows {
            for (old, new) in renames {
                if old == new {
                    continue;
                }
                if let Some(value) = row.remove(*old) {
                    row.insert((*new).to_string(), value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_fragment() {
        assert!(ReportFragment::default().is_empty());

        let header_only = ReportFragment::new("T", vec!["A".to_string()], vec![]);
        assert!(!header_only.is_empty());
    }

    #[test]
    fn test_columns_fall_back_to_row_keys() {
        let fragment = ReportFragment::new(
            "T",
            vec![],
            vec![
                row(&[("b", 1.0.into())]),
                row(&[("a", 2.0.into()), ("b", 3.0.into())]),
            ],
        );

        assert_eq!(fragment.columns(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_missing_cell_is_empty() {
        let fragment = ReportFragment::new(
            "T",
            vec!["A".to_string(), "B".to_string()],
            vec![row(&[("A", 1.0.into())])],
        );

        assert!(fragment.cell(&fragment.rows[0], "B").is_empty());
    }

    #[test]
    fn test_rename_columns() {
        let mut fragment = ReportFragment::new(
            "T",
            vec![],
            vec![row(&[("Budget Qty", 10.0.into()), ("Area", "SALEM".into())])],
        );

        fragment.rename_columns(&[("Budget Qty", "Budget Qty/Mt"), ("Billed Qty", "Billed Qty/Mt")]);

        assert!(fragment.rows[0].contains_key("Budget Qty/Mt"));
        assert!(!fragment.rows[0].contains_key("Budget Qty"));
        assert!(!fragment.rows[0].contains_key("Billed Qty/Mt"));
    }

    #[test]
    fn test_legacy_field_names() {
        let json = r#"{
            "df": [{"A": 1}],
            "columns": ["A"],
            "title": "T1",
            "percent_cols": [0]
        }"#;

        let fragment: ReportFragment = serde_json::from_str(json).unwrap();
        assert_eq!(fragment.rows.len(), 1);
        assert_eq!(fragment.column_order, vec!["A".to_string()]);
        assert!(fragment.is_percent_column(0));
        assert_eq!(fragment.category, "");
    }
}
