//! Report fragment repository

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// A serialized fragment ready to insert
#[derive(Debug, Clone)]
pub struct NewFragmentRow {
    pub category: String,
    pub title: String,
    pub payload: String,
}

/// A stored fragment row as read back
#[derive(Debug, Clone)]
pub struct FragmentRow {
    pub id: i64,
    pub batch_id: Uuid,
    pub category: String,
    pub title: String,
    pub payload: String,
    pub appended_at: DateTime<Utc>,
}

/// Result of a quota-checked batch insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchWrite {
    Committed { total_bytes: u64 },
    /// Batch was rolled back; `total_bytes` is what the store would have held
    OverQuota { total_bytes: u64 },
}

/// Insert a batch of fragments in one transaction
///
/// After inserting, the total payload size is checked against `quota_bytes`;
/// over quota the transaction is rolled back and nothing persists.
pub async fn insert_batch(
    pool: &SqlitePool,
    batch_id: Uuid,
    appended_at: DateTime<Utc>,
    rows: &[NewFragmentRow],
    quota_bytes: u64,
) -> Result<BatchWrite> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let batch_id = batch_id.to_string();
    for row in rows {
        sqlx::query(
            "INSERT INTO report_fragments (batch_id, category, title, payload, payload_bytes, appended_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&batch_id)
        .bind(&row.category)
        .bind(&row.title)
        .bind(&row.payload)
        .bind(row.payload.len() as i64)
        .bind(appended_at)
        .execute(&mut *tx)
        .await
        .context("Failed to insert report fragment")?;
    }

    let (total,): (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(payload_bytes), 0) FROM report_fragments")
            .fetch_one(&mut *tx)
            .await
            .context("Failed to measure report store size")?;
    let total_bytes = total.max(0) as u64;

    if total_bytes > quota_bytes {
        tx.rollback().await.context("Failed to roll back transaction")?;
        return Ok(BatchWrite::OverQuota { total_bytes });
    }

    tx.commit().await.context("Failed to commit transaction")?;

    Ok(BatchWrite::Committed { total_bytes })
}

/// List fragments in append order, optionally for one category
pub async fn list_fragments(pool: &SqlitePool, category: Option<&str>) -> Result<Vec<FragmentRow>> {
    let rows = match category {
        Some(category) => sqlx::query(
            "SELECT id, batch_id, category, title, payload, appended_at
             FROM report_fragments
             WHERE category = ?
             ORDER BY id",
        )
        .bind(category)
        .fetch_all(pool)
        .await
        .context("Failed to list report fragments by category")?,
        None => sqlx::query(
            "SELECT id, batch_id, category, title, payload, appended_at
             FROM report_fragments
             ORDER BY id",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list report fragments")?,
    };

    let mut fragments = Vec::with_capacity(rows.len());
    for row in rows {
        let batch_id: String = row.try_get("batch_id")?;
        fragments.push(FragmentRow {
            id: row.try_get("id")?,
            batch_id: Uuid::parse_str(&batch_id)
                .with_context(|| format!("Invalid batch id in report store: {}", batch_id))?,
            category: row.try_get("category")?,
            title: row.try_get("title")?,
            payload: row.try_get("payload")?,
            appended_at: row.try_get("appended_at")?,
        });
    }

    Ok(fragments)
}

/// Delete every stored fragment
pub async fn delete_all_fragments(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM report_fragments")
        .execute(pool)
        .await
        .context("Failed to clear report fragments")?;

    Ok(result.rows_affected())
}

/// Total payload bytes currently stored
pub async fn stored_bytes(pool: &SqlitePool) -> Result<u64> {
    let (total,): (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(payload_bytes), 0) FROM report_fragments")
            .fetch_one(pool)
            .await
            .context("Failed to measure report store size")?;

    Ok(total.max(0) as u64)
}
