//! Database operations for the `market_analysis` table.

use chrono::{DateTime, Utc};
use sourcing_core::NewAnalysis;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `market_analysis` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRow {
    pub id: i64,
    pub search_keyword: String,
    pub category: Option<String>,
    pub average_price: i32,
    pub lowest_price: i32,
    pub sample_count: i32,
    pub top_item_name: Option<String>,
    pub total_listings: i32,
    pub competition_level: Option<String>,
    pub search_volume_ratio: i32,
    pub market_attractiveness: Option<String>,
    pub sourcing_score: i32,
    pub analysis_date: DateTime<Utc>,
}

const ANALYSIS_COLUMNS: &str = "id, search_keyword, category, average_price, lowest_price, \
     sample_count, top_item_name, total_listings, competition_level, search_volume_ratio, \
     market_attractiveness, sourcing_score, analysis_date";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Append one analysis record and return the stored row.
///
/// `analysis_date` is supplied by the caller (the ingestion clock), never by
/// the worker payload. Records are never deduplicated: repeated analyses of the
/// same keyword accumulate as separate history rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_analysis(
    pool: &PgPool,
    record: &NewAnalysis,
    analysis_date: DateTime<Utc>,
) -> Result<AnalysisRow, DbError> {
    let row = sqlx::query_as::<_, AnalysisRow>(&format!(
        "INSERT INTO market_analysis \
             (search_keyword, category, average_price, lowest_price, sample_count, \
              top_item_name, total_listings, competition_level, search_volume_ratio, \
              market_attractiveness, sourcing_score, analysis_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING {ANALYSIS_COLUMNS}"
    ))
    .bind(&record.search_keyword)
    .bind(record.category.as_deref())
    .bind(record.average_price)
    .bind(record.lowest_price)
    .bind(record.sample_count)
    .bind(record.top_item_name.as_deref())
    .bind(record.total_listings)
    .bind(record.competition_level.as_deref())
    .bind(record.search_volume_ratio)
    .bind(record.market_attractiveness.as_deref())
    .bind(record.sourcing_score)
    .bind(analysis_date)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// List analysis records, newest first.
///
/// Ordered by `analysis_date DESC, id DESC` so records sharing a timestamp
/// still list the most recently inserted first. `limit = None` returns all rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_analyses(pool: &PgPool, limit: Option<i64>) -> Result<Vec<AnalysisRow>, DbError> {
    let rows = sqlx::query_as::<_, AnalysisRow>(&format!(
        "SELECT {ANALYSIS_COLUMNS} \
         FROM market_analysis \
         ORDER BY analysis_date DESC, id DESC \
         LIMIT COALESCE($1, 9223372036854775807)"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
