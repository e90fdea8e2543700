//! Admission-control service (v1)
//!
//! An HTTP service built with Tokio and Axum in which every endpoint
//! admits its input through typed guards before doing any work.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌───────────────────────────────────────────────────┐
//!                          │                ADMISSION CONTROL                  │
//!                          │                                                   │
//!     Client Request       │  ┌─────────┐    ┌───────────┐    ┌─────────────┐  │
//!     ─────────────────────┼─▶│  http   │───▶│  guards   │───▶│  services   │  │
//!                          │  │ server  │    │ in → id → │    │ users, fs,  │  │
//!                          │  └─────────┘    │  authz    │    │ fetch, exec │  │
//!                          │       ▲         └─────┬─────┘    └──────┬──────┘  │
//!     Client Response      │       │   Rejection   │                 │         │
//!     ◀────────────────────┼───────┴───────────────┴─────────────────┘         │
//!                          │                                                   │
//!                          │  ┌─────────────────────────────────────────────┐  │
//!                          │  │           Cross-Cutting Concerns            │  │
//!                          │  │  config · observability · security headers  │  │
//!                          │  │  rate limit · lifecycle (startup/shutdown)  │  │
//!                          │  └─────────────────────────────────────────────┘  │
//!                          └───────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use admission_control::config::loader::CONFIG_PATH_ENV;
use admission_control::config::load_config;
use admission_control::lifecycle::{signals, startup, Shutdown};
use admission_control::observability::{logging, metrics};
use admission_control::HttpServer;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "admission-control")]
#[command(about = "HTTP service that admits every request through typed guards", long_about = None)]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "admission-control starting");
    tracing::info!(
        path = %args.config.display(),
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let state = startup::bootstrap(config)?;
    let seeded = startup::seed_users(&state).await?;
    tracing::info!(count = seeded, "Seed users ready");

    let shutdown = Shutdown::new();
    let worker = startup::spawn_task_worker(&state, &shutdown);

    let listener = TcpListener::bind(&state.config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(state);
    let mut serve = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut serve => {
            shutdown.trigger();
            result??;
        }
        _ = signals::wait_for_signal() => {
            shutdown.trigger();
            serve.await??;
        }
    }
    if let Some(worker) = worker {
        worker.await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
