//! Command handlers. Each runs against an established pool and prints a plain
//! text report to stdout.

use sourcing_core::{AppConfig, QueueBackend, RankingEntry};
use sourcing_db::AnalysisRow;
use sourcing_queue::{PgQueue, QueueGateway};
use sourcing_service::{AnalysisQueryService, RankingQueryService, SourcingOrchestrator};

/// Apply pending migrations and report how many ran.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub(crate) async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = sourcing_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Dispatch one keyword through the configured queue, exactly as the HTTP
/// endpoint does.
///
/// # Errors
///
/// Returns an error if the keyword is blank, the gateway cannot be built, or
/// the queue rejects the message.
pub(crate) async fn run_request(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    keyword: &str,
) -> anyhow::Result<()> {
    let gateway = QueueGateway::from_config(config, pool)?;
    let backend = gateway.backend();
    let accepted = SourcingOrchestrator::new(gateway)
        .request_sourcing(Some(keyword))
        .await?;
    println!("queued '{}' via {backend} queue", accepted.keyword);
    Ok(())
}

/// Print the full ranking, or the per-category view when `category` is set.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_ranking(pool: &sqlx::PgPool, category: Option<&str>) -> anyhow::Result<()> {
    let service = RankingQueryService::new(pool.clone());
    let entries = service.get_ranking_by_category(category).await?;

    if entries.is_empty() {
        println!("no ranking stored; waiting for the worker's next ranking callback");
        return Ok(());
    }

    for line in format_ranking(&entries) {
        println!("{line}");
    }
    Ok(())
}

/// Print the `limit` most recent analyses.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_analyses(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    if limit < 1 {
        anyhow::bail!("--limit must be at least 1, got {limit}");
    }

    let rows = AnalysisQueryService::new(pool.clone())
        .find_all_analysis(Some(limit))
        .await?;

    if rows.is_empty() {
        println!("no analyses stored yet");
        return Ok(());
    }

    for line in format_analyses(&rows) {
        println!("{line}");
    }
    Ok(())
}

/// Print the number of unacknowledged messages in the Postgres queue.
///
/// # Errors
///
/// Returns an error if the HTTP backend is configured (its depth is not
/// observable from here) or the count query fails.
pub(crate) async fn run_queue_depth(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    if config.queue_backend != QueueBackend::Postgres {
        anyhow::bail!(
            "queue-depth needs SOURCING_QUEUE_BACKEND=postgres (configured: {})",
            config.queue_backend
        );
    }

    let queue = PgQueue::new(pool.clone(), config.queue_name.clone());
    let pending = queue.pending_count().await?;
    println!("{pending} message(s) pending in '{}'", queue.queue_name());
    Ok(())
}

fn format_ranking(entries: &[RankingEntry]) -> Vec<String> {
    let mut lines = vec![format!("{:<6}{:<14}KEYWORD", "RANK", "SEARCH RATIO")];
    lines.extend(
        entries
            .iter()
            .map(|e| format!("{:<6}{:<14}{}", e.rank, e.search_ratio, e.keyword)),
    );
    lines
}

fn format_analyses(rows: &[AnalysisRow]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<18}{:<8}{:<12}{:<12}KEYWORD",
        "ANALYZED AT", "SCORE", "AVG PRICE", "LISTINGS"
    )];
    lines.extend(rows.iter().map(|r| {
        format!(
            "{:<18}{:<8}{:<12}{:<12}{}",
            r.analysis_date.format("%Y-%m-%d %H:%M"),
            r.sourcing_score,
            r.average_price,
            r.total_listings,
            r.search_keyword
        )
    }));
    lines
}
