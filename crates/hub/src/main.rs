mod config;
mod state;
mod web;

use anyhow::Result;
use std::{env, sync::Arc};
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use state::HubState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Env config ──────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "zones.toml".to_string());
    let port: u16 = env::var("WEB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // ── Config file (seed zone sessions) ────────────────────────────
    let cfg = config::load(&config_path)?;
    if cfg.zones.is_empty() {
        tracing::warn!(path = %config_path, "no zones configured");
    }

    let shared = Arc::new(RwLock::new(HubState::new()));
    config::apply(&cfg, &shared).await;
    {
        let mut st = shared.write().await;
        st.record_system("hub started".to_string());
    }

    // ── Web server ──────────────────────────────────────────────────
    web::serve(shared, port).await
}
