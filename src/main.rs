//! doorlog - access-control event recording service
//!
//! Serves a CRUD API over recorded card-swipe events and appends an audit
//! line to a plain-text event log on every create and delete.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use doorlog::{api, config::LogFormat, config::LogTarget, db, AppConfig, AppState, AuditTrail};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("doorlog {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load().context("Failed to load configuration")?;

    // The guard must be kept alive for the duration of the program to
    // ensure log messages are flushed to files
    let _log_guard = init_logging(&config);

    info!("doorlog starting up");

    ensure_data_directory(&config)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    info!(path = ?config.audit.log_file, "Audit trail target");
    let audit = Arc::new(AuditTrail::new(config.audit.log_file.clone()));

    let state = AppState {
        config: config.clone(),
        db,
        audit,
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server is ready to accept connections");

    axum::serve(listener, app).await.context("HTTP server error")?;

    Ok(())
}

/// Build the application router with CORS and request tracing
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(api::root))
        .nest("/api", api::routes())
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

/// Make sure the directory holding the SQLite file exists
fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    let url = &config.database.url;
    if let Some(path) = url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create data directory {:?}", parent))?;
                }
            }
        }
    }
    Ok(())
}

/// Initialize the logging/tracing infrastructure
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let log_config = &config.logging;

    match log_config.target {
        LogTarget::Console => {
            let registry = tracing_subscriber::registry().with(env_filter);
            match log_config.format {
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
                LogFormat::Json => registry.with(fmt::layer().json()).init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
            }
            None
        }
        LogTarget::File => {
            if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
                eprintln!(
                    "Warning: Failed to create log directory {:?}: {}",
                    log_config.log_dir, e
                );
            }

            let file_appender = if log_config.daily_rotation {
                tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
            } else {
                tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
            };
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            let registry = tracing_subscriber::registry().with(env_filter);
            match log_config.format {
                LogFormat::Pretty => registry
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .init(),
                LogFormat::Json => registry.with(fmt::layer().json().with_writer(writer)).init(),
                LogFormat::Compact => registry
                    .with(fmt::layer().compact().with_ansi(false).with_writer(writer))
                    .init(),
            }
            Some(guard)
        }
    }
}

fn print_help() {
    println!("doorlog {}", env!("CARGO_PKG_VERSION"));
    println!("Access-control event recording service");
    println!();
    println!("USAGE:");
    println!("    doorlog [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print this help message");
    println!("    -V, --version    Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    Reads config.yaml from the working directory, config/,");
    println!("    /etc/doorlog/, or the user config directory. The path can");
    println!("    be overridden with DOORLOG_CONFIG. Individual settings can");
    println!("    be overridden with DOORLOG_HOST, DOORLOG_PORT,");
    println!("    DOORLOG_DATABASE_URL, DOORLOG_AUDIT_FILE and");
    println!("    DOORLOG_LOG_LEVEL.");
}
