mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sourcing-cli")]
#[command(about = "Market sourcing operator commands")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Queue one keyword for market analysis
    Request {
        /// Keyword to research (surrounding whitespace is trimmed)
        keyword: String,
    },
    /// Print the current keyword ranking
    Ranking {
        /// Show the top entries for one category label (e.g. Fashion)
        #[arg(long)]
        category: Option<String>,
    },
    /// Print recent analysis results, newest first
    Analyses {
        /// Maximum number of records to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Print the number of messages waiting in the Postgres queue
    QueueDepth,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("sourcing-cli ready; run with --help for commands");
        return Ok(());
    };

    // Queue settings are only checked by `request`, when it builds the gateway.
    let config = sourcing_core::load_operator_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = sourcing_db::PoolConfig::from_app_config(&config);
    let pool = sourcing_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => commands::run_migrate(&pool).await,
        Commands::Request { keyword } => commands::run_request(&pool, &config, &keyword).await,
        Commands::Ranking { category } => {
            commands::run_ranking(&pool, category.as_deref()).await
        }
        Commands::Analyses { limit } => commands::run_analyses(&pool, limit).await,
        Commands::QueueDepth => commands::run_queue_depth(&pool, &config).await,
    }
}
