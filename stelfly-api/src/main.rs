use std::net::SocketAddr;
use std::sync::Arc;

use stelfly_api::{app, config::Config, AppState};
use stelfly_assist::HttpCompletionClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stelfly_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Stelfly API on port {}", config.server.port);

    let catalog = config.catalog.build();
    tracing::info!(
        aircraft = catalog.aircraft().len(),
        instructors = catalog.instructors().len(),
        "Catalog loaded"
    );

    let client = Arc::new(HttpCompletionClient::new(
        &config.completion.base_url,
        &config.completion.api_key,
        &config.completion.model,
    ));

    let state = AppState::new(catalog, client);
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
