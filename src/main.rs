//! Waymark demo host.
//!
//! Serves a small route table through axum and can print the table with the
//! route walker.
//!
//! ```text
//! waymark [--config waymark.toml] serve
//! waymark [--config waymark.toml] routes [--json]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use waymark::config::{load_config, AppConfig};
use waymark::http::middleware::{recover, request_id, trace};
use waymark::http::{Request, RequestExt};
use waymark::observability::logging::init_logging;
use waymark::observability::metrics::init_metrics;
use waymark::{walk, MethodRegistry, Routable, Router, RouterError};

#[derive(Parser)]
#[command(name = "waymark")]
#[command(about = "Demo host for the waymark HTTP router", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo routes (default)
    Serve,
    /// Print every method and path the demo router answers
    Routes {
        /// Emit JSON instead of one line per route
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct RouteLine {
    method: String,
    path: String,
    interceptors: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    init_logging(&config.observability.log_filter);
    tracing::info!("waymark v{} starting", env!("CARGO_PKG_VERSION"));

    let router = build_router(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, router).await,
        Commands::Routes { json } => print_routes(router, json),
    }
}

/// The demo route table.
fn build_router(config: &AppConfig) -> Result<Router, RouterError> {
    let registry = MethodRegistry::global().clone();
    registry.ensure("LINK")?;
    registry.ensure("WOOHOO")?;

    let mut router = Router::from_config(&config.router, registry)?;
    router.use_interceptor(request_id())?;
    router.use_interceptor(trace())?;
    router.use_interceptor(recover())?;

    router.get("/", |_req: Request| async { "hello world" })?;

    router.route("/road", |r| {
        r.get("/left", |_req: Request| async { "left road" })?;
        r.post("/right", |_req: Request| async { "right road" })?;
        Ok(())
    })?;

    router.put("/ping", |_req: Request| async { "pong" })?;

    router.get("/users/{id:[0-9]+}", |req: Request| async move {
        format!("user {}", req.url_param("id").unwrap_or_default())
    })?;

    router.get("/files/*", |req: Request| async move {
        format!("file {}", req.url_param("*").unwrap_or_default())
    })?;

    router.method("LINK", "/link", |_req: Request| async { "link" })?;
    router.method("WOOHOO", "/woo", |_req: Request| async { "woo" })?;

    router.handle("/everything", |req: Request| async move {
        format!("{} everything", req.method())
    })?;

    router.not_found(|_req: Request| async {
        (StatusCode::NOT_FOUND, "nothing here")
    });

    Ok(router)
}

async fn serve(config: AppConfig, router: Router) -> Result<(), Box<dyn std::error::Error>> {
    let service = router.into_service();

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    #[allow(deprecated)]
    let timeout = TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs));
    let app = axum::Router::new()
        .fallback_service(service)
        .layer(timeout)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_routes(router: Router, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let service = router.into_service();
    let mut lines = Vec::new();
    walk(&service, |method, path, _handler, interceptors| {
        lines.push(RouteLine {
            method: method.to_string(),
            path: path.to_string(),
            interceptors: interceptors.len(),
        });
        Ok::<_, RouterError>(())
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for line in &lines {
            println!("{:<8} {} ({} interceptors)", line.method, line.path, line.interceptors);
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Shutdown signal received");
}
