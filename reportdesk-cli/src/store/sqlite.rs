//! SQLite-backed report store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{
    AppendOutcome, ReportStore, StoreError, StoredFragment, DEFAULT_QUOTA_BYTES, prepare_batch,
};
use crate::config::repository::reports::{self, BatchWrite, NewFragmentRow};
use crate::report::ReportFragment;

/// Durable report store; survives restarts of the CLI
#[derive(Debug, Clone)]
pub struct SqliteReportStore {
    pool: SqlitePool,
    quota_bytes: u64,
}

impl SqliteReportStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }

    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    /// Bytes currently used by stored payloads
    pub async fn used_bytes(&self) -> Result<u64, StoreError> {
        Ok(reports::stored_bytes(&self.pool).await?)
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn append(
        &self,
        fragments: Vec<ReportFragment>,
        category: &str,
    ) -> Result<AppendOutcome, StoreError> {
        let batch = prepare_batch(fragments, category)?;
        let batch_id = Uuid::new_v4();

        if batch.fragments.is_empty() {
            log::info!("Nothing to append to '{}' (all fragments skipped)", category);
            return Ok(AppendOutcome {
                batch_id,
                appended: 0,
                skipped: batch.skipped,
            });
        }

        let rows: Vec<NewFragmentRow> = batch
            .fragments
            .iter()
            .map(|(fragment, payload)| NewFragmentRow {
                category: fragment.category.clone(),
                title: fragment.title.clone(),
                payload: payload.clone(),
            })
            .collect();

        let write =
            reports::insert_batch(&self.pool, batch_id, Utc::now(), &rows, self.quota_bytes)
                .await?;

        match write {
            BatchWrite::Committed { total_bytes } => {
                log::info!(
                    "Appended {} report(s) to '{}' (batch {}, {} bytes stored)",
                    rows.len(),
                    category,
                    batch_id,
                    total_bytes
                );
                Ok(AppendOutcome {
                    batch_id,
                    appended: rows.len(),
                    skipped: batch.skipped,
                })
            }
            BatchWrite::OverQuota { total_bytes } => {
                log::warn!(
                    "Rolled back '{}' batch {}: {} bytes exceeds quota of {}",
                    category,
                    batch_id,
                    total_bytes,
                    self.quota_bytes
                );
                Err(StoreError::QuotaExceeded {
                    required: total_bytes,
                    quota: self.quota_bytes,
                })
            }
        }
    }

    async fn entries(&self) -> Result<Vec<StoredFragment>, StoreError> {
        let rows = reports::list_fragments(&self.pool, None).await?;
        rows.into_iter().map(decode_row).collect()
    }

    async fn get_by_category(&self, category: &str) -> Result<Vec<ReportFragment>, StoreError> {
        let rows = reports::list_fragments(&self.pool, Some(category)).await?;
        rows.into_iter()
            .map(|row| decode_row(row).map(|e| e.fragment))
            .collect()
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let removed = reports::delete_all_fragments(&self.pool).await?;
        log::info!("Cleared {} report(s) from the store", removed);
        Ok(())
    }
}

fn decode_row(row: reports::FragmentRow) -> Result<StoredFragment, StoreError> {
    let fragment: ReportFragment =
        serde_json::from_str(&row.payload).map_err(|e| StoreError::Serialization {
            title: row.title.clone(),
            message: e.to_string(),
        })?;

    Ok(StoredFragment {
        id: row.id,
        batch_id: row.batch_id,
        appended_at: row.appended_at,
        fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::connect_in_memory;

    async fn store() -> SqliteReportStore {
        SqliteReportStore::new(connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_append_then_get_all() {
        let store = store().await;

        let outcome = store
            .append(vec![fragment("T1", "A", 1.0)], "x")
            .await
            .unwrap();

        assert_eq!(outcome.appended, 1);
        assert!(outcome.skipped.is_empty());

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "T1");
        assert_eq!(all[0].column_order, vec!["A".to_string()]);
        assert_eq!(all[0].category, "x");
    }

    #[tokio::test]
    async fn test_batches_keep_append_order() {
        let store = store().await;

        store
            .append(vec![fragment("B1-1", "A", 1.0), fragment("B1-2", "A", 2.0)], "one")
            .await
            .unwrap();
        store
            .append(vec![fragment("B2-1", "A", 3.0)], "two")
            .await
            .unwrap();
        store
            .append(vec![fragment("B3-1", "A", 4.0)], "one")
            .await
            .unwrap();

        let titles: Vec<String> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.title)
            .collect();
        assert_eq!(titles, vec!["B1-1", "B1-2", "B2-1", "B3-1"]);

        let one: Vec<String> = store
            .get_by_category("one")
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.title)
            .collect();
        assert_eq!(one, vec!["B1-1", "B1-2", "B3-1"]);

        assert_eq!(
            store.category_counts().await.unwrap(),
            vec![("one".to_string(), 3), ("two".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_invalid_fragment_skipped_valid_kept() {
        let store = store().await;

        let outcome = store
            .append(vec![empty_fragment("Empty"), fragment("Valid", "A", 1.0)], "x")
            .await
            .unwrap();

        assert_eq!(outcome.appended, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].index, 0);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Valid");
    }

    #[tokio::test]
    async fn test_quota_failure_rolls_back_whole_batch() {
        let store = store().await;
        store
            .append(vec![fragment("Kept", "A", 1.0)], "x")
            .await
            .unwrap();
        let before = store.get_all().await.unwrap();

        let used = store.used_bytes().await.unwrap();
        let store = store.with_quota(used + 10);

        let err = store
            .append(
                vec![fragment("New 1", "A", 2.0), fragment("New 2", "A", 3.0)],
                "x",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert_eq!(store.get_all().await.unwrap(), before);
        assert_eq!(store.used_bytes().await.unwrap(), used);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = store().await;
        store
            .append(vec![fragment("T1", "A", 1.0)], "x")
            .await
            .unwrap();

        store.clear().await.unwrap();

        assert!(store.get_all().await.unwrap().is_empty());
        assert!(store.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_share_batch_id() {
        let store = store().await;
        let outcome = store
            .append(vec![fragment("T1", "A", 1.0), fragment("T2", "A", 2.0)], "x")
            .await
            .unwrap();

        let entries = store.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.batch_id == outcome.batch_id));
        assert!(entries[0].id < entries[1].id);
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]

        #[test]
        fn prop_append_laws(batches in arb_batches(), quota in 0u64..4_000) {
            runtime().block_on(async {
                let store = store().await.with_quota(quota);
                check_append_laws(&store, batches).await;
            });
        }
    }
}
