use std::process::ExitCode;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use where_are_they::{repo, routes::create_router, AppState, Config, Gateways};

/// Exit code when the database cannot be reached or prepared at startup.
const EXIT_STORAGE_UNAVAILABLE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Connecting to PostgreSQL at {}...", config.redacted_database_url());
    let pool = match PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url())
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to PostgreSQL: {:?}", e);
            return ExitCode::from(EXIT_STORAGE_UNAVAILABLE);
        }
    };
    tracing::info!("Connected to PostgreSQL");

    if let Err(e) = repo::init_tables(&pool).await {
        tracing::error!("Failed to initialize database tables: {:?}", e);
        return ExitCode::from(EXIT_STORAGE_UNAVAILABLE);
    }

    match serve(config, pool).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server stopped: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: Config, pool: sqlx::PgPool) -> anyhow::Result<()> {
    let addr = config.listen_addr();
    let state = AppState::new(Gateways::postgres(pool), config);
    tracing::info!(
        "Request scope binds: {}",
        state.request_injector().bound_type_names().join(", ")
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
