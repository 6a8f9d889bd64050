//! Built-in keyword tables, one per upload screen / report flow
//!
//! Keyword order matters: earlier keywords win over later ones.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use super::models::{FieldSpec, TargetField};
use TargetField::*;

/// A named, ordered keyword table
#[derive(Debug, Clone)]
pub struct KeywordTable {
    pub name: String,
    pub specs: Vec<FieldSpec>,
}

fn table(name: &str, rows: &[(TargetField, &[&str])]) -> KeywordTable {
    KeywordTable {
        name: name.to_string(),
        specs: rows
            .iter()
            .map(|(field, keywords)| FieldSpec::new(*field, keywords))
            .collect(),
    }
}

static BUILTIN_TABLES: Lazy<Vec<KeywordTable>> = Lazy::new(|| {
    vec![
        table(
            "customers",
            &[
                (ExecutiveName, &["executive name", "empname", "executive"]),
                (ExecutiveCode, &["executive code", "empcode", "ecode"]),
                (CustomerCode, &["customer code", "slcode", "custcode"]),
                (CustomerName, &["customer name", "slname", "custname", "party name"]),
            ],
        ),
        table(
            "executives",
            &[
                (ExecutiveName, &["executive name", "ename", "empname"]),
                (ExecutiveCode, &["executive code", "code", "empcode"]),
                (Branch, &["branch"]),
                (Region, &["region"]),
            ],
        ),
        table(
            "budget-sales",
            &[
                (Date, &["date", "bill date", "invoice date"]),
                (Value, &["value", "invoice value", "amount"]),
                (ProductGroup, &["type (make)", "product group", "type", "make"]),
                (Area, &["branch", "area", "location"]),
                (Quantity, &["actual quantity", "quantity", "qty"]),
                (SlCode, &["customer code", "sl code", "customer id"]),
                (Executive, &["executive", "sales executive", "executive name"]),
            ],
        ),
        table(
            "budget-targets",
            &[
                (Area, &["branch", "area", "location"]),
                (Quantity, &["qty", "quantity", "budget qty"]),
                (SlCode, &["sl code", "customer code", "customer id"]),
                (Value, &["value", "budget value", "amount"]),
                (ProductGroup, &["product group", "type(make)", "product", "type"]),
                (Executive, &["executive name", "executive", "sales executive"]),
            ],
        ),
        table(
            "od-outstanding",
            &[
                (DueDate, &["due date", "date due", "maturity date"]),
                (RefDate, &["ref. date", "reference date", "ref date"]),
                (NetValue, &["net value", "net val", "net amount", "value", "amount"]),
                (Executive, &["executive name", "executive", "exec name", "salesperson"]),
                (SlCode, &["party code", "sl code", "customer code", "cust code"]),
                (Branch, &["branch", "area", "location", "office", "territory"]),
                (Region, &["region"]),
            ],
        ),
        table(
            "od-sales",
            &[
                (BillDate, &["bill date", "invoice date", "sale date", "transaction date", "date"]),
                (DueDate, &["due date", "date due", "maturity date"]),
                (Value, &["invoice value", "value", "amount", "sale value", "bill value"]),
                (Executive, &["executive name", "executive", "exec name", "salesperson"]),
                (SlCode, &["customer code", "sl code", "party code", "cust code"]),
                (Branch, &["branch", "area", "location", "office", "territory"]),
                (Region, &["region"]),
            ],
        ),
        table(
            "product-growth",
            &[
                (Date, &["date", "bill date", "invoice date"]),
                (Value, &["value", "invoice value", "amount"]),
                (Quantity, &["actual quantity", "quantity", "qty"]),
                (ProductGroup, &["product group", "type (make)", "type", "make"]),
                (Executive, &["executive name", "executive"]),
                (Branch, &["branch", "area"]),
            ],
        ),
        table(
            "billed-customers",
            &[
                (Date, &["date", "bill date", "invoice date"]),
                (Branch, &["branch", "area", "location"]),
                (CustomerCode, &["customer code", "sl code", "party code"]),
                (Executive, &["executive name", "executive"]),
            ],
        ),
    ]
});

/// All built-in tables
pub fn builtin_tables() -> &'static [KeywordTable] {
    &BUILTIN_TABLES
}

/// Look up a built-in table by name (case-insensitive)
pub fn builtin_table(name: &str) -> Option<&'static KeywordTable> {
    BUILTIN_TABLES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}

/// Build a table from configuration (`field -> keywords`)
///
/// Unknown field names are an error so typos in the config surface early.
pub fn table_from_config(
    name: &str,
    rows: &BTreeMap<String, Vec<String>>,
) -> anyhow::Result<KeywordTable> {
    let mut specs = Vec::new();
    for (field, keywords) in rows {
        let field: TargetField = field
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Keyword table '{}': {}", name, e))?;
        specs.push(FieldSpec {
            field,
            keywords: keywords.clone(),
        });
    }

    Ok(KeywordTable {
        name: name.to_string(),
        specs,
    })
}
