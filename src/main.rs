mod config;
mod error;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::media::DiskMediaStore;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("ignoring unreadable .env: {e}");
        }
    }
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env();
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let media = Arc::new(DiskMediaStore::new(&config.upload_dir));
    let port = config.port;

    let state = state::AppState::new(config, media);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "annoroom listening");
    axum::serve(listener, app).await
}
