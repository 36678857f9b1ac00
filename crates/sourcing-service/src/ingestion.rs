use chrono::Utc;
use sourcing_core::{AnalysisSubmission, RankingEntry};
use sourcing_db::AnalysisRow;
use sqlx::PgPool;

use crate::ServiceError;

/// Persists worker callbacks into the analysis history and ranking snapshot.
#[derive(Debug, Clone)]
pub struct IngestionService {
    pool: PgPool,
}

impl IngestionService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one analysis record stamped with the server clock.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] for a missing keyword or out-of-range field.
    /// - [`ServiceError::Persistence`] if the insert fails.
    pub async fn ingest_analysis(
        &self,
        submission: AnalysisSubmission,
    ) -> Result<AnalysisRow, ServiceError> {
        let record = submission.validate().inspect_err(|e| {
            tracing::warn!(error = %e, "rejected analysis callback");
        })?;

        let row = sourcing_db::insert_analysis(&self.pool, &record, Utc::now()).await?;
        tracing::info!(
            id = row.id,
            keyword = %row.search_keyword,
            "stored analysis result"
        );
        Ok(row)
    }

    /// Replace the ranking snapshot with `batch`, atomically.
    ///
    /// Every row is stamped with one timestamp taken before the transaction
    /// starts. Returns the number of rows stored.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] for a null or empty batch or a bad entry.
    /// - [`ServiceError::Persistence`] if the replacement fails; the previous
    ///   snapshot stays in place.
    pub async fn ingest_ranking(
        &self,
        batch: Option<Vec<RankingEntry>>,
    ) -> Result<u64, ServiceError> {
        let entries = sourcing_core::validate_ranking_batch(batch).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected ranking callback");
        })?;

        let saved_at = Utc::now();
        let saved = sourcing_db::replace_ranking_snapshot(&self.pool, &entries, saved_at).await?;
        tracing::info!(entries = saved, %saved_at, "replaced ranking snapshot");
        Ok(saved)
    }
}
