use ghsecrets::{config::AppConfig, db, web};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ghsecrets=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ghsecrets v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::init()?;
    info!("Configuration loaded");

    // The vault key is required: stored tokens are unreadable without it
    let vault = match config.security.token_vault() {
        Ok(vault) => Arc::new(vault),
        Err(e) => {
            error!("{}", e);
            error!("Generate a key with: openssl rand -hex 32");
            return Err(e.into());
        }
    };

    if config.github.client_id.is_empty() || config.github.client_secret.is_empty() {
        return Err(anyhow::anyhow!(
            "GitHub OAuth app not configured (github.client_id / github.client_secret)"
        ));
    }

    let pool = db::connect(&config.database.url, config.database.max_connections).await?;
    info!("Database connected: {}", config.database.url);
    db::init_db(&pool).await?;

    let state = web::AppState::new(config, pool, vault)?;

    if config.sessions.sweep_interval_secs > 0 {
        let interval = Duration::from_secs(config.sessions.sweep_interval_secs);
        let _sweeper = state.sessions.clone().spawn_sweeper(interval);
        info!("Expired sessions swept every {:?}", interval);
    }

    let app = web::create_router(state, config.web.static_dir.as_deref());

    let web_addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = TcpListener::bind(&web_addr).await?;
    info!("Web server listening on http://{}", web_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
