use sourcing_core::{RankingEntry, RankingSnapshot};
use sourcing_db::AnalysisRow;
use sqlx::PgPool;

use crate::ServiceError;

/// Serves the current ranking snapshot and its per-category views.
///
/// Nothing is cached: every call reads the stored snapshot and derives the
/// view from it.
#[derive(Debug, Clone)]
pub struct RankingQueryService {
    pool: PgPool,
}

impl RankingQueryService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the stored snapshot, ordered by rank.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if the read fails.
    pub async fn snapshot(&self) -> Result<RankingSnapshot, ServiceError> {
        let rows = sourcing_db::list_ranking(&self.pool).await?;
        Ok(RankingSnapshot::new(
            rows.into_iter().map(RankingEntry::from).collect(),
        ))
    }

    /// All snapshot rows in ascending rank order; empty when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if the read fails.
    pub async fn get_ranking(&self) -> Result<Vec<RankingEntry>, ServiceError> {
        Ok(self.snapshot().await?.into_entries())
    }

    /// Top entries for one category, renumbered from 1.
    ///
    /// A missing or blank `label` returns the same result as [`Self::get_ranking`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if the read fails.
    pub async fn get_ranking_by_category(
        &self,
        label: Option<&str>,
    ) -> Result<Vec<RankingEntry>, ServiceError> {
        Ok(self.snapshot().await?.category_view(label))
    }
}

/// Serves the analysis history.
#[derive(Debug, Clone)]
pub struct AnalysisQueryService {
    pool: PgPool,
}

impl AnalysisQueryService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Analysis records, most recent first. `limit = None` returns everything.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if the read fails.
    pub async fn find_all_analysis(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<AnalysisRow>, ServiceError> {
        Ok(sourcing_db::list_analyses(&self.pool, limit).await?)
    }
}
