use std::time::Duration;

use clap::Parser;
use server::{database::Database, init_logging};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Create the articles the API serves")]
struct Args {
    #[arg(long, env = "DATABASE_URL", default_value = "redis://127.0.0.1:6379/0")]
    database_url: String,

    #[arg(long, default_value_t = 1000)]
    connect_timeout_ms: u64,

    /// Recreate existing articles, dropping their upvotes and comments
    #[arg(long)]
    reset: bool,

    /// Defaults to the demo articles
    names: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    let database = Database::open(
        &args.database_url,
        Duration::from_millis(args.connect_timeout_ms),
    )?;

    let summary = seed::seed_articles(&database, &args.names, args.reset).await?;
    info!(
        "Seeded {} articles, skipped {} existing",
        summary.created, summary.skipped
    );

    Ok(())
}
