//! Core keyword matching for spreadsheet column auto-mapping

use super::models::{ColumnMapping, FieldSpec, MappedColumn, MatchSource, TargetField};
use std::collections::HashMap;

/// How keywords are compared against headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// First keyword that is a substring of some header wins
    #[default]
    Substring,
    /// Whole-header equality over all keywords first, then the substring pass
    ExactFirst,
}

/// Lowercase and keep only alphanumeric characters.
/// "Executive  Name" and "executive-name" both become "executivename".
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Map headers to fields with the default substring mode
pub fn map_columns(headers: &[String], specs: &[FieldSpec]) -> ColumnMapping {
    map_columns_with(headers, specs, MatchMode::Substring)
}

/// Map headers to fields
///
/// Keywords are tried in order; for a keyword, the first header (in header
/// order) that contains it is chosen. The same header may end up on several
/// fields. Fields without a match are kept with an empty value.
pub fn map_columns_with(headers: &[String], specs: &[FieldSpec], mode: MatchMode) -> ColumnMapping {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    let mut mapping = ColumnMapping::default();

    for spec in specs {
        // An earlier field spec for the same field that matched takes precedence
        if mapping.is_mapped(spec.field) {
            continue;
        }

        let keywords: Vec<String> = spec
            .keywords
            .iter()
            .map(|k| normalize(k))
            .filter(|k| !k.is_empty())
            .collect();

        let mut found = None;
        if mode == MatchMode::ExactFirst {
            found = keywords
                .iter()
                .find_map(|kw| normalized.iter().position(|h| h == kw));
        }
        if found.is_none() {
            found = keywords.iter().find_map(|kw| {
                normalized
                    .iter()
                    .position(|h| !h.is_empty() && h.contains(kw.as_str()))
            });
        }

        let column = found.map(|idx| MappedColumn {
            header: headers[idx].clone(),
            source: MatchSource::Keyword,
        });
        mapping.entries.insert(spec.field, column);
    }

    mapping
}

impl ColumnMapping {
    /// Merge an external mapping (backend auto-map or user edits) over this one
    ///
    /// Keys are field identifiers; values are header names. A value only
    /// wins when it names one of `headers`. Unknown fields and empty values
    /// are ignored. Returns the number of fields that were overridden.
    pub fn apply_overrides(
        &mut self,
        overrides: &HashMap<String, Option<String>>,
        headers: &[String],
        source: MatchSource,
    ) -> usize {
        let mut applied = 0;

        // Sorted for deterministic logging
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();

        for key in keys {
            let field = match key.parse::<TargetField>() {
                Ok(field) => field,
                Err(_) => {
                    log::debug!("Ignoring override for unknown field '{}'", key);
                    continue;
                }
            };

            let Some(header) = overrides.get(key).and_then(|v| v.as_deref()) else {
                continue;
            };
            if header.is_empty() {
                continue;
            }

            if !headers.iter().any(|h| h == header) {
                log::warn!(
                    "Override for '{}' names unknown column '{}', keeping heuristic match",
                    field,
                    header
                );
                continue;
            }

            self.entries.insert(
                field,
                Some(MappedColumn {
                    header: header.to_string(),
                    source,
                }),
            );
            applied += 1;
        }

        applied
    }
}
