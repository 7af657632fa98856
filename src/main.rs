use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use devtracker::config::{CliConfig, Config};
use devtracker::export::{self, ExportFormat};
use devtracker::seed::{self, SeedOptions};

type BoxError = Box<dyn std::error::Error>;

#[derive(Parser)]
#[command(name = "devtracker")]
#[command(about = "Track projects, applications, tasks and the artifacts around them")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server (default)
    Serve,
    /// Export tracked data to JSON, CSV or Excel files
    Export {
        /// json, csv or excel
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Only export this project (id)
        #[arg(short, long)]
        project: Option<Uuid>,

        /// Output file; defaults to a timestamped name in the export directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Record types to include (projects, applications, tasks, artifacts,
        /// decisions, integrations); all when omitted
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        include: Vec<String>,
    },
    /// Create an admin account and a sample project
    Seed {
        #[arg(long, default_value = "admin")]
        admin_username: String,

        #[arg(long, default_value = "admin@example.com")]
        admin_email: String,

        #[arg(long, default_value = "admin123")]
        admin_password: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::Export {
            format,
            project,
            output,
            include,
        } => run_export(&format, project, output, &include).await,
        Commands::Seed {
            admin_username,
            admin_email,
            admin_password,
        } => {
            run_seed(SeedOptions {
                admin_username,
                admin_email,
                admin_password,
            })
            .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

async fn connect(database_url: &str) -> Result<PgPool, BoxError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {e}"))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| format!("Failed to run migrations: {e}"))?;
    tracing::info!("Migrations applied");

    Ok(pool)
}

async fn serve() -> Result<(), BoxError> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    tracing::info!("Starting DevTracker");

    let pool = connect(&config.database_url).await?;

    let addr = SocketAddr::new(config.host, config.port);
    let state = devtracker::build_state(pool, config);
    let cleanup = devtracker::rate_limit::spawn_cleanup(state.clone());
    let app = devtracker::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    Ok(())
}

async fn run_export(
    format: &str,
    project: Option<Uuid>,
    output: Option<PathBuf>,
    include: &[String],
) -> Result<(), BoxError> {
    let config = CliConfig::from_env()?;
    init_tracing(&config.log_level);

    let format = ExportFormat::parse(format)
        .ok_or_else(|| format!("Unknown format '{format}': use json, csv or excel"))?;
    let include = export::parse_include(include.iter().map(String::as_str))?;

    let pool = connect(&config.database_url).await?;
    let data = export::collect(&pool, project, &include).await?;

    let path = output.unwrap_or_else(|| export::default_path(&config.export_dir, format, Utc::now()));
    let written = export::write_files(&data, format, &path)?;

    println!("Export completed: {} records", data.total_records());
    for file in &written {
        println!("  {} ({} records)", file.path.display(), file.records);
    }
    if written.is_empty() {
        println!("No records matched; nothing written");
    }
    Ok(())
}

async fn run_seed(opts: SeedOptions) -> Result<(), BoxError> {
    let config = CliConfig::from_env()?;
    init_tracing(&config.log_level);

    if opts.admin_password == "admin123" {
        tracing::warn!("Seeding with the default admin password; change it after first login");
    }

    let pool = connect(&config.database_url).await?;
    let report = seed::run(&pool, &opts).await?;
    println!("{report}");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
