use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, AppState};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn load_bind_addr(cfg: &configs::AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = configs::AppConfig::load_and_validate()?;

    // The file engine keeps its flat store under a data directory; make sure
    // it exists before the first save.
    if let Some(parent) = std::path::Path::new(&cfg.storage.file_path).parent() {
        if !parent.as_os_str().is_empty() {
            common::env::ensure_env(&parent.to_string_lossy()).await?;
        }
    }

    // Engine selection is a one-time startup decision; a relational
    // connection failure is fatal here.
    let storage = storage::from_config(&cfg).await?;
    storage.reload().await?;

    let state = AppState { storage: Arc::clone(&storage) };
    let cors = build_cors();
    let app: Router = routes::build_router(state, cors);

    let addr = load_bind_addr(&cfg)?;
    info!(%addr, engine = ?cfg.storage.engine, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    storage.close().await;
    Ok(())
}
