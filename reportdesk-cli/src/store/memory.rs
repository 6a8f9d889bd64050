//! In-process report store with an explicit lifecycle

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    AppendOutcome, ReportStore, StoreError, StoredFragment, DEFAULT_QUOTA_BYTES, prepare_batch,
};
use crate::report::ReportFragment;

#[derive(Debug, Default)]
struct State {
    entries: Vec<StoredFragment>,
    bytes: u64,
    next_id: i64,
}

/// Report store that lives as long as the value does
#[derive(Debug)]
pub struct MemoryReportStore {
    state: Mutex<State>,
    quota_bytes: u64,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            state: Mutex::new(State::default()),
            quota_bytes,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("Report store lock poisoned".to_string()))
    }
}

impl Default for MemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn append(
        &self,
        fragments: Vec<ReportFragment>,
        category: &str,
    ) -> Result<AppendOutcome, StoreError> {
        let batch = prepare_batch(fragments, category)?;
        let batch_id = Uuid::new_v4();
        let batch_bytes = batch.bytes();

        let mut state = self.lock()?;

        // Check before touching state so a rejected batch leaves nothing behind
        let required = state.bytes + batch_bytes;
        if required > self.quota_bytes {
            log::warn!(
                "Rejected '{}' batch {}: {} bytes exceeds quota of {}",
                category,
                batch_id,
                required,
                self.quota_bytes
            );
            return Err(StoreError::QuotaExceeded {
                required,
                quota: self.quota_bytes,
            });
        }

        let appended_at = Utc::now();
        let appended = batch.fragments.len();
        for (fragment, _) in batch.fragments {
            state.next_id += 1;
            let id = state.next_id;
            state.entries.push(StoredFragment {
                id,
                batch_id,
                appended_at,
                fragment,
            });
        }
        state.bytes = required;

        log::debug!(
            "Appended {} report(s) to '{}' (batch {})",
            appended,
            category,
            batch_id
        );

        Ok(AppendOutcome {
            batch_id,
            appended,
            skipped: batch.skipped,
        })
    }

    async fn entries(&self) -> Result<Vec<StoredFragment>, StoreError> {
        Ok(self.lock()?.entries.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.entries.clear();
        state.bytes = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_concatenates_batches() {
        let store = MemoryReportStore::new();
        let batches = vec![
            vec![fragment("a", "A", 1.0), fragment("b", "A", 2.0)],
            vec![fragment("c", "A", 3.0)],
            vec![fragment("d", "A", 4.0), fragment("e", "A", 5.0)],
        ];

        let mut expected = Vec::new();
        for (i, batch) in batches.into_iter().enumerate() {
            let category = format!("c{}", i % 2);
            for f in &batch {
                let mut f = f.clone();
                f.category = category.clone();
                expected.push(f);
            }
            store.append(batch, &category).await.unwrap();
        }

        assert_eq!(store.get_all().await.unwrap(), expected);

        let c0: Vec<ReportFragment> = expected
            .iter()
            .filter(|f| f.category == "c0")
            .cloned()
            .collect();
        assert_eq!(store.get_by_category("c0").await.unwrap(), c0);
    }

    #[tokio::test]
    async fn test_over_quota_leaves_state_untouched() {
        let store = MemoryReportStore::with_quota(400);
        store
            .append(vec![fragment("first", "A", 1.0)], "x")
            .await
            .unwrap();
        let before = store.get_all().await.unwrap();

        let big: Vec<ReportFragment> = (0..20)
            .map(|i| fragment(&format!("big {}", i), "A", i as f64))
            .collect();
        let err = store.append(big, "x").await.unwrap_err();

        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert_eq!(store.get_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_clear_resets_quota_usage() {
        let store = MemoryReportStore::with_quota(300);
        store
            .append(vec![fragment("first", "A", 1.0)], "x")
            .await
            .unwrap();
        store.clear().await.unwrap();

        assert!(store.get_all().await.unwrap().is_empty());
        store
            .append(vec![fragment("again", "A", 1.0)], "x")
            .await
            .unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(64))]

        #[test]
        fn prop_append_laws(batches in arb_batches(), quota in 0u64..4_000) {
            runtime().block_on(async {
                check_append_laws(&MemoryReportStore::with_quota(quota), batches).await;
            });
        }
    }
}
