// src/main.rs
use std::sync::Arc;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tool_advisor_backend::{config::Config, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;
    if config.gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; every chat turn will get the fallback reply");
    }
    if config.admin_key.is_none() {
        warn!("ADMIN_KEY is not set; admin routes are disabled");
    }

    let state = Arc::new(AppState::new(&config));
    info!(
        catalog_dir = %state.catalogs.dir().display(),
        model = %config.gemini.model,
        "state initialised"
    );

    // Idle sessions are dropped once per TTL/4, at least every second.
    let sessions = state.sessions.clone();
    let period = (config.session_ttl / 4).max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired().await;
            if removed > 0 {
                info!(removed, "purged idle sessions");
            }
        }
    });

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("tool advisor running at http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
