//! Consolidated report store
//!
//! An append-only, categorized collection of report fragments. Producers
//! append whole batches; a batch either persists completely or not at all.
//! The store is passed explicitly to whoever needs it; there is no global
//! instance.

mod memory;
mod sqlite;

pub use memory::MemoryReportStore;
pub use sqlite::SqliteReportStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::report::{CellValue, ReportFragment};

/// Default quota on serialized fragment bytes (browser storage budget)
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Error from store operations
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The batch would push the store past its byte quota
    QuotaExceeded { required: u64, quota: u64 },
    /// A fragment could not be serialized or a stored payload could not be read
    Serialization { title: String, message: String },
    /// The underlying storage failed
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::QuotaExceeded { required, quota } => {
                write!(
                    f,
                    "Report store quota exceeded ({} bytes needed, {} allowed) - clear the store and retry",
                    required, quota
                )
            }
            StoreError::Serialization { title, message } => {
                write!(f, "Failed to serialize report '{}': {}", title, message)
            }
            StoreError::Backend(message) => write!(f, "Report store failure: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Backend(format!("{:#}", err))
    }
}

/// A fragment that was rejected from a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFragment {
    /// Position in the batch passed to `append`
    pub index: usize,
    pub title: String,
}

/// What an append call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub batch_id: Uuid,
    pub appended: usize,
    pub skipped: Vec<SkippedFragment>,
}

/// A fragment with its store bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFragment {
    pub id: i64,
    pub batch_id: Uuid,
    pub appended_at: DateTime<Utc>,
    pub fragment: ReportFragment,
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Append a batch under `category`; empty fragments are skipped
    async fn append(
        &self,
        fragments: Vec<ReportFragment>,
        category: &str,
    ) -> Result<AppendOutcome, StoreError>;

    /// Every stored fragment with its bookkeeping, in append order
    async fn entries(&self) -> Result<Vec<StoredFragment>, StoreError>;

    /// Remove everything
    async fn clear(&self) -> Result<(), StoreError>;

    /// All fragments in append order
    async fn get_all(&self) -> Result<Vec<ReportFragment>, StoreError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|e| e.fragment)
            .collect())
    }

    /// Fragments of one category, in append order
    async fn get_by_category(&self, category: &str) -> Result<Vec<ReportFragment>, StoreError> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|f| f.category == category)
            .collect())
    }

    /// (category, fragment count) in order of first appearance
    async fn category_counts(&self) -> Result<Vec<(String, usize)>, StoreError> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for fragment in self.get_all().await? {
            match counts.iter_mut().find(|(c, _)| *c == fragment.category) {
                Some((_, count)) => *count += 1,
                None => counts.push((fragment.category, 1)),
            }
        }
        Ok(counts)
    }
}

/// A validated, serialized batch
pub(crate) struct PreparedBatch {
    pub fragments: Vec<(ReportFragment, String)>,
    pub skipped: Vec<SkippedFragment>,
}

impl PreparedBatch {
    pub fn bytes(&self) -> u64 {
        self.fragments.iter().map(|(_, p)| p.len() as u64).sum()
    }
}

/// Drop empty fragments, stamp the category and serialize the rest.
/// Non-finite numbers have no JSON form and are stored as empty cells.
pub(crate) fn prepare_batch(
    fragments: Vec<ReportFragment>,
    category: &str,
) -> Result<PreparedBatch, StoreError> {
    let mut prepared = Vec::with_capacity(fragments.len());
    let mut skipped = Vec::new();

    for (index, mut fragment) in fragments.into_iter().enumerate() {
        if fragment.is_empty() {
            log::warn!(
                "Skipping empty report fragment {} ('{}') in '{}' batch",
                index,
                fragment.title,
                category
            );
            skipped.push(SkippedFragment {
                index,
                title: fragment.title,
            });
            continue;
        }

        fragment.category = category.to_string();
        for value in fragment.rows.iter_mut().flat_map(|row| row.values_mut()) {
            if matches!(value, CellValue::Number(n) if !n.is_finite()) {
                *value = CellValue::Empty;
            }
        }

        let payload = serde_json::to_string(&fragment).map_err(|e| StoreError::Serialization {
            title: fragment.title.clone(),
            message: e.to_string(),
        })?;
        prepared.push((fragment, payload));
    }

    Ok(PreparedBatch {
        fragments: prepared,
        skipped,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_prepare_batch_skips_empty_and_stamps_category() {
        let batch = prepare_batch(
            vec![empty_fragment("Nothing"), fragment("T1", "A", 1.0)],
            "budget_results",
        )
        .unwrap();

        assert_eq!(batch.fragments.len(), 1);
        assert_eq!(batch.fragments[0].0.category, "budget_results");
        assert!(batch.fragments[0].1.contains("\"category\":\"budget_results\""));
        assert_eq!(
            batch.skipped,
            vec![SkippedFragment {
                index: 0,
                title: "Nothing".to_string()
            }]
        );
        assert!(batch.bytes() > 0);
    }

    #[test]
    fn test_prepare_batch_empties_non_finite_numbers() {
        let mut nan = fragment("T1", "A", f64::NAN);
        nan.rows[0].insert("B".to_string(), CellValue::Number(f64::NEG_INFINITY));
        nan.rows[0].insert("C".to_string(), CellValue::Number(2.5));

        let batch = prepare_batch(vec![nan], "od_results").unwrap();
        let row = &batch.fragments[0].0.rows[0];

        assert_eq!(row["A"], CellValue::Empty);
        assert_eq!(row["B"], CellValue::Empty);
        assert_eq!(row["C"], CellValue::Number(2.5));
    }

    #[tokio::test]
    async fn test_stores_agree_on_non_finite_numbers() {
        let memory = MemoryReportStore::new();
        let sqlite = SqliteReportStore::new(crate::config::connect_in_memory().await.unwrap());

        for store in [&memory as &dyn ReportStore, &sqlite] {
            store
                .append(vec![fragment("T1", "A", f64::NAN)], "od_results")
                .await
                .unwrap();
        }

        let from_memory = memory.get_all().await.unwrap();
        let from_sqlite = sqlite.get_all().await.unwrap();
        assert_eq!(from_memory, from_sqlite);
        assert_eq!(from_memory[0].rows[0]["A"], CellValue::Empty);
    }

    #[test]
    fn test_quota_error_message() {
        let err = StoreError::QuotaExceeded {
            required: 10,
            quota: 5,
        };
        assert!(err.to_string().contains("quota exceeded"));
    }
}
