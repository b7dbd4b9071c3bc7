use anyhow::Result;
use clap::{Parser, Subcommand};
use licensewatch_db::{UsageRepository, db};
use licensewatch_panel::config::PanelConfig;
use licensewatch_panel::{AppState, build_router};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "licensewatch-panel")]
#[command(about = "License usage reporting dashboard", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web dashboard (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    let loaded = PanelConfig::load(cli.config.as_deref())?;
    let config = loaded.config;

    let _guard = init_tracing(&config.log_dir);
    info!(
        "License usage panel v{} (config: {})",
        env!("CARGO_PKG_VERSION"),
        loaded.source
    );

    let pool = db::init_db(&config.database)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if config.auto_migrate {
                // The dashboard reports an unreachable database per request.
                if let Err(e) = db::migrate(&pool).await {
                    error!("{:#}", e);
                }
            }
            run_server(config, pool).await?;
        }
        Commands::Migrate => {
            db::migrate(&pool).await?;
        }
    }

    Ok(())
}

fn init_tracing(log_dir: &str) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::never(log_dir, "server.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "licensewatch_panel=debug,licensewatch_db=debug,tower_http=info,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    guard
}

async fn run_server(config: PanelConfig, pool: licensewatch_db::sqlx::PgPool) -> Result<()> {
    let store = Arc::new(UsageRepository::new(pool));
    let state = AppState::new(store, config.max_upload_bytes);
    let app = build_router(state);

    let addr = config.listen_socket()?;
    info!("Dashboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
