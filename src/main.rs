mod advisor;
mod app;
mod auth;
mod config;
mod images;
mod profile;
mod state;
mod storage;
mod tryon;
mod wardrobe;

use crate::app::{build_app, serve};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "wardrobe=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    // Load the apparel reference data off the request path.
    let catalog = app_state.apparel.clone();
    tokio::spawn(async move {
        let rows = catalog.preload().await;
        tracing::info!(rows, "apparel reference data loaded");
    });

    serve(build_app(app_state)).await
}
