//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::seed::SeedData;
use domain::{InMemoryCatalog, InMemoryCustomerDirectory, OrderRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, PostgresOrderStore};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<R, Store>(
    config: &Config,
    orders: R,
    sessions: Store,
    catalog: InMemoryCatalog,
    directory: InMemoryCustomerDirectory,
    metrics_handle: PrometheusHandle,
) where
    R: OrderRepository + Clone + 'static,
    Store: tower_sessions::SessionStore + Clone,
{
    let state = api::create_default_state(config, orders, Arc::new(catalog), Arc::new(directory))
        .expect("failed to build application state");
    let session_layer = api::create_session_layer(sessions, config.secure_cookies());
    let app = api::create_app(state, metrics_handle, session_layer);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    // 1. Load .env if present, then configuration
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    // 2. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 3. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 4. Catalog, customers and carriers
    let catalog = InMemoryCatalog::new();
    let directory = InMemoryCustomerDirectory::new();
    match &config.seed_file {
        Some(path) => SeedData::load(path)
            .await
            .expect("failed to load seed file")
            .apply(&catalog, &directory)
            .await,
        None => tracing::warn!("no SEED_FILE set, catalog and customers are empty"),
    }

    // 5. Order and session stores, then the server
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let store = PostgresOrderStore::new(pool.clone());
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");

            let sessions = PostgresStore::new(pool);
            let sweeper = api::session::start_postgres_sessions(&sessions)
                .await
                .expect("failed to prepare session store");
            tracing::info!("using PostgreSQL order and session stores");

            serve(&config, store, sessions, catalog, directory, metrics_handle).await;
            sweeper.abort();
        }
        None => {
            tracing::warn!("no DATABASE_URL set, orders and sessions are kept in memory");
            serve(
                &config,
                InMemoryOrderStore::new(),
                MemoryStore::default(),
                catalog,
                directory,
                metrics_handle,
            )
            .await;
        }
    }

    tracing::info!("server shut down gracefully");
}
