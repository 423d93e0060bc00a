//! School locator API entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use school_locator::api::{create_router, AppState};
use school_locator::config::{Config, LogFormat};
use school_locator::metrics;
use school_locator::schools::SchoolService;
use school_locator::store::{
    initialize_with_retry, InMemorySchoolStore, MySqlSchoolStore, SchoolStore,
};
use school_locator::utils::shutdown_signal;

/// School registry API with proximity search.
#[derive(Parser, Debug)]
#[command(name = "school-locator")]
#[command(about = "Register schools and list them by distance from a point")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep schools in memory instead of MySQL.
        #[arg(long)]
        in_memory: bool,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Create the database schema and exit.
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Configuration decides the log format, so load it before logging
    let config = Config::load();
    let log_format = config.as_ref().map(|c| c.log_format).unwrap_or_default();
    let default_level = config
        .as_ref()
        .map(|c| c.rust_log.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("school_locator=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let (text_layer, json_layer) = match log_format {
        LogFormat::Text => (Some(fmt::layer()), None),
        LogFormat::Json => (None, Some(fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .init();

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::InitDb) => cmd_init_db(&config).await,
        Some(Command::Serve { port, in_memory }) => cmd_serve(config, port, in_memory).await,
        None => cmd_serve(config, None, false).await,
    }
}

fn validate(config: &Config) -> anyhow::Result<()> {
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        anyhow::anyhow!("Configuration validation failed: {}", e)
    })
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SCHOOL LOCATOR - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Database: {}", config.database_summary());
    println!("  SSL Mode: {}", config.db_ssl_mode);
    println!("  Connection Limit: {}", config.db_connection_limit);
    println!("  Acquire Timeout: {}s", config.db_acquire_timeout_secs);
    println!(
        "  Schema Init: {} attempts, {}s apart",
        config.db_init_attempts, config.db_init_retry_secs
    );
    println!("  Log Format: {}", config.log_format);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Create the schema once and exit.
async fn cmd_init_db(config: &Config) -> anyhow::Result<()> {
    validate(config)?;
    info!("Initializing schema on {}", config.database_summary());

    let store = MySqlSchoolStore::connect_lazy(config);
    let result = initialize_with_retry(
        &store,
        config.db_init_attempts,
        Duration::from_secs(config.db_init_retry_secs),
    )
    .await;
    store.close().await;

    result?;
    info!("Schema ready");
    Ok(())
}

/// Run the HTTP server.
async fn cmd_serve(config: Config, port: Option<u16>, in_memory: bool) -> anyhow::Result<()> {
    validate(&config)?;
    let port = port.unwrap_or(config.port);

    let store: Arc<dyn SchoolStore> = if in_memory {
        warn!("Using in-memory store; data is lost on exit");
        Arc::new(InMemorySchoolStore::new())
    } else {
        info!("Using database {}", config.database_summary());
        Arc::new(MySqlSchoolStore::connect_lazy(&config))
    };

    // Create app state
    let mut app_state = AppState::new(SchoolService::new(store.clone()));
    match metrics::init_metrics() {
        Ok(handle) => app_state = app_state.with_metrics(handle),
        Err(e) => warn!("Metrics disabled: {}", e),
    }

    // Start HTTP server before the database is known to be reachable
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    // Initialize schema in the background; the server keeps running on failure
    let init_store = store.clone();
    let init_state = app_state.clone();
    let attempts = config.db_init_attempts;
    let delay = Duration::from_secs(config.db_init_retry_secs);
    tokio::spawn(async move {
        info!("Initializing database...");
        match initialize_with_retry(init_store.as_ref(), attempts, delay).await {
            Ok(()) => init_state.set_ready(true),
            Err(e) => error!("Database initialization error: {}", e),
        }
    });

    let router = create_router(app_state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped");
    Ok(())
}
