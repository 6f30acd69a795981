use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use trialgate_core::seed::{DemoSeeder, InMemoryDemoSeeder, PgDemoSeeder};
use trialgate_core::store::InMemorySessionStore;
use trialgate_core::users::{InMemoryUserStore, PgUserStore, UserStore};
use trialgate_core::{InMemoryAuthSessions, TrialgateConfig};

use trialgate_server::state::AppState;
use trialgate_server::subsystems::lifecycle::DemoLifecycle;
use trialgate_server::subsystems::{reconcile, sweeper};
use trialgate_server::{http, server};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "trialgate.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match TrialgateConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    let memory_backend = config.storage.backend == "memory";

    // Connect to DB. The in-memory backend only needs the pool for /health,
    // so it connects lazily and the server comes up without Postgres.
    let pool = if memory_backend {
        match trialgate_core::db::create_lazy_pool(&config.database) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to configure database pool: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match trialgate_core::db::create_pool(&config.database).await {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to connect to database: {}", e);
                std::process::exit(1);
            }
        }
    };

    if args.health {
        match trialgate_core::db::health_check(&pool).await {
            Ok(v) => println!("PostgreSQL connected: {}", v),
            Err(e) => {
                println!("PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }
        println!("Trialgate DB health check passed");
        return Ok(());
    }

    // Wire up the storage backend
    let (users, seeder): (Arc<dyn UserStore>, Arc<dyn DemoSeeder>) = if memory_backend {
        tracing::warn!("Using in-memory storage backend; demo users will not persist");
        (
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryDemoSeeder::new()),
        )
    } else {
        trialgate_core::db::ensure_schema(&pool).await?;
        (
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgDemoSeeder::new(pool.clone())),
        )
    };

    let store = Arc::new(InMemorySessionStore::new());

    // Reclaim demo users orphaned by a previous process crash/restart.
    // The store is empty at this point, so every demo user found is stale.
    if !memory_backend {
        if let Err(e) =
            reconcile::reconcile_orphans(users.as_ref(), store.as_ref(), seeder.as_ref()).await
        {
            tracing::warn!("Startup reconciliation failed: {}", e);
        }
    }

    let lifecycle = Arc::new(DemoLifecycle::new(
        store,
        users,
        seeder,
        config.demo.clone(),
    ));

    let state = Arc::new(AppState {
        lifecycle: lifecycle.clone(),
        auth: Arc::new(InMemoryAuthSessions::new()),
        pool,
        config: config.clone(),
    });

    // Shutdown plumbing
    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    // Spawn the expiry sweep loop
    tokio::spawn(sweeper::run_sweep_loop(
        lifecycle,
        config.demo.clone(),
        tx.subscribe(),
    ));

    // Spawn the HTTP API if enabled
    if config.http.enabled {
        let http_state = state.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = http::start_http_server(http_state, http_shutdown).await {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = config.service.socket_path.clone();
    server::run_unix_server(&socket_path, state, tx.subscribe()).await?;

    Ok(())
}
