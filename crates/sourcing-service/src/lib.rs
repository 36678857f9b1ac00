//! Request/result orchestration for market research.
//!
//! - [`SourcingOrchestrator`] validates keywords and dispatches them to the queue.
//! - [`IngestionService`] persists worker callbacks (analysis history, ranking snapshot).
//! - [`RankingQueryService`] and [`AnalysisQueryService`] serve the read side.
//!
//! Requests and callbacks are not correlated: a dispatched keyword may produce
//! zero, one, or several analysis records later.

mod ingestion;
mod orchestrator;
mod query;

use sourcing_core::ValidationError;
use sourcing_db::DbError;
use sourcing_queue::{QueueError, QueueGateway};
use sqlx::PgPool;
use thiserror::Error;

pub use ingestion::IngestionService;
pub use orchestrator::{Accepted, SourcingOrchestrator};
pub use query::{AnalysisQueryService, RankingQueryService};

/// Failure of a single service operation. Errors never span requests.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad caller input; nothing was written or sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The queue did not accept the request.
    #[error("dispatch failed: {0}")]
    Queue(#[from] QueueError),
    /// The store failed; any partial ranking replacement was rolled back.
    #[error("persistence failed: {0}")]
    Persistence(#[from] DbError),
}

/// All services wired to one pool and one queue gateway.
#[derive(Debug, Clone)]
pub struct Services {
    pub orchestrator: SourcingOrchestrator,
    pub ingestion: IngestionService,
    pub ranking: RankingQueryService,
    pub analyses: AnalysisQueryService,
}

impl Services {
    #[must_use]
    pub fn new(pool: PgPool, gateway: QueueGateway) -> Self {
        Self {
            orchestrator: SourcingOrchestrator::new(gateway),
            ingestion: IngestionService::new(pool.clone()),
            ranking: RankingQueryService::new(pool.clone()),
            analyses: AnalysisQueryService::new(pool),
        }
    }
}
