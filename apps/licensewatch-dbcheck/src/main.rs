use anyhow::Result;
use clap::Parser;
use console::style;
use licensewatch_db::db::{self, DEFAULT_DATABASE_URL, DatabaseSettings};
use licensewatch_db::{USAGE_TABLE, UsageRepository, UsageStore};
use std::process::exit;

#[derive(Parser)]
#[command(name = "licensewatch-dbcheck")]
#[command(about = "Verify that the usage database is reachable", long_about = None)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Seconds to wait for a connection
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("[{}] {:#}", style("FAIL").red(), e);
        exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = DatabaseSettings {
        url: cli.database_url.clone(),
        max_connections: 1,
        acquire_timeout_secs: cli.timeout_secs,
    };

    let pool = db::connect(&settings).await?;
    let repo = UsageRepository::new(pool);

    let one = repo.ping().await?;
    println!("({},)", one);

    let version = repo.server_version().await?;
    println!(
        "[{}] Connected to {}",
        style("OK").green(),
        version.split(',').next().unwrap_or(&version)
    );

    match repo.count().await {
        Ok(rows) => println!("[{}] {} has {} rows", style("OK").green(), USAGE_TABLE, rows),
        Err(e) => println!("[{}] {} not readable: {}", style("WARN").yellow(), USAGE_TABLE, e),
    }

    repo.pool().close().await;
    Ok(())
}
