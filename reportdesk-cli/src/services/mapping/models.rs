use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic fields a spreadsheet column can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetField {
    ExecutiveName,
    ExecutiveCode,
    Executive,
    Branch,
    Region,
    Area,
    CustomerCode,
    CustomerName,
    SlCode,
    Date,
    BillDate,
    DueDate,
    RefDate,
    Value,
    NetValue,
    Quantity,
    ProductGroup,
}

impl TargetField {
    pub const ALL: [TargetField; 17] = [
        TargetField::ExecutiveName,
        TargetField::ExecutiveCode,
        TargetField::Executive,
        TargetField::Branch,
        TargetField::Region,
        TargetField::Area,
        TargetField::CustomerCode,
        TargetField::CustomerName,
        TargetField::SlCode,
        TargetField::Date,
        TargetField::BillDate,
        TargetField::DueDate,
        TargetField::RefDate,
        TargetField::Value,
        TargetField::NetValue,
        TargetField::Quantity,
        TargetField::ProductGroup,
    ];

    /// Identifier used in keyword tables and backend mappings
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetField::ExecutiveName => "executive_name",
            TargetField::ExecutiveCode => "executive_code",
            TargetField::Executive => "executive",
            TargetField::Branch => "branch",
            TargetField::Region => "region",
            TargetField::Area => "area",
            TargetField::CustomerCode => "customer_code",
            TargetField::CustomerName => "customer_name",
            TargetField::SlCode => "sl_code",
            TargetField::Date => "date",
            TargetField::BillDate => "bill_date",
            TargetField::DueDate => "due_date",
            TargetField::RefDate => "ref_date",
            TargetField::Value => "value",
            TargetField::NetValue => "net_value",
            TargetField::Quantity => "quantity",
            TargetField::ProductGroup => "product_group",
        }
    }
}

impl FromStr for TargetField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        TargetField::ALL
            .iter()
            .find(|f| f.as_str() == key)
            .copied()
            .ok_or_else(|| format!("Unknown field '{}'", s))
    }
}

impl std::fmt::Display for TargetField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of a keyword table: a field and its keywords in priority order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: TargetField,
    pub keywords: Vec<String>,
}

impl FieldSpec {
    pub fn new(field: TargetField, keywords: &[&str]) -> Self {
        Self {
            field,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Where a mapped header came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    Keyword, // Client-side keyword heuristic
    Backend, // Backend auto-map endpoint
    Manual,  // User override
}

impl MatchSource {
    /// Get display label for match source
    pub fn label(&self) -> &'static str {
        match self {
            MatchSource::Keyword => "[Keyword]",
            MatchSource::Backend => "[Backend]",
            MatchSource::Manual => "[Manual]",
        }
    }
}

/// A header chosen for a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedColumn {
    pub header: String,
    pub source: MatchSource,
}

/// Field -> header mapping. Unmatched fields are present with no column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub(crate) entries: BTreeMap<TargetField, Option<MappedColumn>>,
}

impl ColumnMapping {
    /// Header mapped to `field`, or "" when nothing matched
    pub fn get(&self, field: TargetField) -> &str {
        self.entries
            .get(&field)
            .and_then(|m| m.as_ref())
            .map(|m| m.header.as_str())
            .unwrap_or("")
    }

    pub fn column(&self, field: TargetField) -> Option<&MappedColumn> {
        self.entries.get(&field).and_then(|m| m.as_ref())
    }

    pub fn is_mapped(&self, field: TargetField) -> bool {
        self.column(field).is_some()
    }

    /// Fields that were requested
    pub fn fields(&self) -> impl Iterator<Item = TargetField> + '_ {
        self.entries.keys().copied()
    }

    /// Requested fields with no header
    pub fn unmapped(&self) -> Vec<TargetField> {
        self.entries
            .iter()
            .filter(|(_, m)| m.is_none())
            .map(|(f, _)| *f)
            .collect()
    }

    /// Set a field manually (does not check the header exists)
    pub fn set(&mut self, field: TargetField, header: impl Into<String>, source: MatchSource) {
        let header = header.into();
        let value = if header.is_empty() {
            None
        } else {
            Some(MappedColumn { header, source })
        };
        self.entries.insert(field, value);
    }

    /// Headers that were assigned to more than one field
    ///
    /// Mapping stays permissive; this is only surfaced for review.
    pub fn shared_headers(&self) -> BTreeMap<String, Vec<TargetField>> {
        let mut by_header: BTreeMap<String, Vec<TargetField>> = BTreeMap::new();
        for (field, column) in &self.entries {
            if let Some(column) = column {
                by_header.entry(column.header.clone()).or_default().push(*field);
            }
        }
        by_header.retain(|_, fields| fields.len() > 1);
        by_header
    }

    /// Plain field-name -> header map, "" for unmatched (backend payload shape)
    pub fn to_payload(&self) -> BTreeMap<String, String> {
        self.entries
            .keys()
            .map(|f| (f.as_str().to_string(), self.get(*f).to_string()))
            .collect()
    }
}
