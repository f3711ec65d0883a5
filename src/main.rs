mod blocking;
mod commands;
mod config;
mod downloads;
mod format;
mod handlers;
mod plugin;
mod source;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Level, info, warn};

use crate::config::Settings;
use crate::handlers::{api, files};
use crate::plugin::JmPlugin;
use crate::source::CommandSource;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let settings = Settings::new().expect("Failed to load configuration");

    tracing_subscriber::fmt()
        .with_env_filter(&settings.log_level)
        .init();

    info!("Starting JM relay...");

    if !settings.pdf_dir().exists() {
        std::fs::create_dir_all(settings.pdf_dir()).expect("Failed to create pdf directory");
    }
    if !settings.option_path().exists() {
        warn!(
            "No option file at {:?}; commands will report a configuration error until it exists",
            settings.option_path()
        );
    }

    let plugin = Arc::new(JmPlugin::new(&settings, Arc::new(CommandSource)));
    let (tx, _) = broadcast::channel(100);

    let state = AppState {
        settings: settings.clone(),
        plugin,
        tx,
    };

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server_port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/info", get(api::plugin_info))
        .route("/api/commands", post(api::run_command))
        .route("/events", get(api::sse_handler))
        .route("/files/{*path}", get(files::download_file))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
