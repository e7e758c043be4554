use anyhow::Context;

use bookshelf_api::{app, config, database, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = config::config();
    tracing::info!("starting bookshelf-api in {:?} mode", config.environment);

    let pool = database::manager::connect(&config.database.url, config.database.max_connections)
        .await
        .context("failed to open database")?;

    let app = app(AppState { pool });

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
