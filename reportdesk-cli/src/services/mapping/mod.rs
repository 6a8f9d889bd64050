// Column auto-mapping service
//
// Pure keyword heuristics that guess which spreadsheet column holds which
// semantic field, plus merging of backend/user overrides.

pub mod core;
pub mod keywords;
pub mod models;

// Re-export commonly used types
pub use self::core::{MatchMode, map_columns, map_columns_with, normalize};
pub use keywords::{KeywordTable, builtin_table, builtin_tables, table_from_config};
pub use models::{ColumnMapping, FieldSpec, MappedColumn, MatchSource, TargetField};

use std::collections::HashMap;

/// Input for one auto-mapping pass
#[derive(Debug, Clone)]
pub struct MappingRequest<'a> {
    pub headers: &'a [String],
    pub table: &'a KeywordTable,
    pub mode: MatchMode,
    /// Backend-suggested mapping, merged over the heuristic result
    pub backend: Option<&'a HashMap<String, Option<String>>>,
}

/// Run the keyword heuristics, then merge the backend suggestion if any
pub fn auto_map(request: &MappingRequest<'_>) -> ColumnMapping {
    let mut mapping = map_columns_with(request.headers, &request.table.specs, request.mode);

    if let Some(backend) = request.backend {
        let applied = mapping.apply_overrides(backend, request.headers, MatchSource::Backend);
        log::debug!(
            "Applied {} backend overrides to '{}' mapping",
            applied,
            request.table.name
        );
    }

    let unmapped = mapping.unmapped();
    if !unmapped.is_empty() {
        log::info!(
            "'{}' mapping left {} field(s) for manual selection",
            request.table.name,
            unmapped.len()
        );
    }

    mapping
}
