pub mod analysis;
pub mod app_config;
pub mod config;
pub mod ranking;

use thiserror::Error;

pub use analysis::{AnalysisSubmission, NewAnalysis, TOP_ITEM_NAME_MAX_CHARS};
pub use app_config::{AppConfig, Environment, QueueBackend};
pub use config::{load_app_config, load_app_config_from_env, load_operator_config};
pub use ranking::{
    category_prefix, validate_ranking_batch, RankingEntry, RankingSnapshot, CATEGORY_VIEW_LIMIT,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Malformed or missing required input. Never retried; raised before any side effect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("keyword must not be blank")]
    BlankKeyword,
    #[error("search_keyword is required")]
    MissingSearchKeyword,
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: i64 },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("ranking batch must contain at least one entry")]
    EmptyRankingBatch,
    #[error("ranking entry {index}: rank must be at least 1, got {rank}")]
    InvalidRank { index: usize, rank: i32 },
}

/// Trim a submitted keyword and reject it when nothing is left.
///
/// # Errors
///
/// Returns [`ValidationError::BlankKeyword`] for `None`, empty, or whitespace-only input.
pub fn validate_keyword(raw: Option<&str>) -> Result<&str, ValidationError> {
    raw.map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(ValidationError::BlankKeyword)
}
