use anyhow::Context;
use tax_tracker_server::{config::Config, create_router, db};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let pool = db::init_db_pool(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("failed to initialize database {}", config.database_url))?;
    tracing::info!("Database ready at {}", config.database_url);

    let app = create_router(db::PaymentStore::new(pool));

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Starting tax tracker server on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
