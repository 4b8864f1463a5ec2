use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

mod app;
mod http;

#[derive(Debug, Parser)]
#[command(name = "fleetd-gateway", about = "Device fleet gateway")]
struct Args {
    /// Path to fleetd.toml (falls back to FLEETD_CONFIG, then ./fleetd.toml).
    #[arg(long)]
    config: Option<String>,
}

/// Open a connection with the pragmas every subsystem relies on.
/// `foreign_keys` is per-connection, so it must be set on each one.
fn open_db(path: &str) -> anyhow::Result<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetd_gateway=info,tower_http=debug".into()),
        )
        .init();

    let args = Args::parse();
    let config = fleetd_core::config::FleetConfig::load(args.config.as_deref())
        .unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            fleetd_core::config::FleetConfig::default()
        });

    let db_path = &config.database.path;
    info!(path = %db_path, "opening SQLite database");

    // Run all schema migrations (idempotent). Registry first — the
    // commands table references devices.
    let db = open_db(db_path)?;
    fleetd_registry::db::init_db(&db)?;
    fleetd_queue::db::init_db(&db)?;
    info!("database migrations complete");

    // Build subsystems — each gets its own connection for thread safety,
    // wired explicitly; no ambient singletons.
    let users = fleetd_registry::UserStore::new(open_db(db_path)?);
    let directory = Arc::new(fleetd_registry::DeviceDirectory::new(open_db(db_path)?));
    let queue = Arc::new(fleetd_queue::CommandQueue::new(open_db(db_path)?));
    let scheduler = fleetd_scheduler::RegimeScheduler::new(
        Arc::clone(&directory),
        Arc::clone(&queue),
        config.scheduler.trigger_opcode.clone(),
    );
    let dispatcher =
        fleetd_dispatch::Dispatcher::new(Arc::clone(&directory), scheduler, Arc::clone(&queue));

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;
    let state = Arc::new(app::AppState {
        config,
        users,
        directory,
        queue,
        dispatcher,
    });
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("fleetd gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
