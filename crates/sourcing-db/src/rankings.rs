//! Database operations for the `naver_ranking` snapshot table.

use chrono::{DateTime, Utc};
use sourcing_core::RankingEntry;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `naver_ranking` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankingRow {
    pub id: i64,
    pub ranking: i32,
    pub keyword: String,
    pub search_ratio: i64,
    pub save_time: DateTime<Utc>,
}

impl From<RankingRow> for RankingEntry {
    fn from(row: RankingRow) -> Self {
        Self {
            rank: row.ranking,
            keyword: row.keyword,
            search_ratio: row.search_ratio,
        }
    }
}

/// Replace the whole ranking snapshot with `entries`.
///
/// Runs in one transaction: take an `EXCLUSIVE` table lock, delete every
/// existing row, then bulk-insert the new batch in input order with the shared
/// `saved_at` timestamp. The lock serialises concurrent replacements while
/// plain `SELECT`s keep reading the previous snapshot until commit. Any error
/// returns before `commit`, and dropping the transaction rolls it back.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the previous snapshot is
/// left intact in that case.
pub async fn replace_ranking_snapshot(
    pool: &PgPool,
    entries: &[RankingEntry],
    saved_at: DateTime<Utc>,
) -> Result<u64, DbError> {
    let ranks: Vec<i32> = entries.iter().map(|e| e.rank).collect();
    let keywords: Vec<String> = entries.iter().map(|e| e.keyword.clone()).collect();
    let ratios: Vec<i64> = entries.iter().map(|e| e.search_ratio).collect();

    let mut tx = pool.begin().await?;

    sqlx::query("LOCK TABLE naver_ranking IN EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM naver_ranking")
        .execute(&mut *tx)
        .await?;

    let inserted = sqlx::query(
        "INSERT INTO naver_ranking (ranking, keyword, search_ratio, save_time) \
         SELECT t.ranking, t.keyword, t.search_ratio, $4 \
         FROM UNNEST($1::INT4[], $2::TEXT[], $3::INT8[]) \
              WITH ORDINALITY AS t(ranking, keyword, search_ratio, ord) \
         ORDER BY t.ord",
    )
    .bind(&ranks)
    .bind(&keywords)
    .bind(&ratios)
    .bind(saved_at)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;
    Ok(inserted)
}

/// List the current snapshot ordered by ascending rank.
///
/// An empty table yields an empty vector.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ranking(pool: &PgPool) -> Result<Vec<RankingRow>, DbError> {
    let rows = sqlx::query_as::<_, RankingRow>(
        "SELECT id, ranking, keyword, search_ratio, save_time \
         FROM naver_ranking \
         ORDER BY ranking ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
