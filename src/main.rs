use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod commute;
mod config;
mod routes;
mod transit;
mod utils;

use commute::{CacheTtls, CommuteCache, CommuteService};
use config::Config;
use routes::{create_router, AppState};
use transit::{mbta::MbtaClient, ors::OrsClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "commute_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if config.mbta_api_key.is_empty() {
        tracing::warn!("MBTA_API_KEY not set, using anonymous rate limits");
    }
    if config.ors_api_key.is_empty() {
        tracing::warn!("ORS_API_KEY not set, walk time requests may be rejected");
    }

    let mbta_client = Arc::new(MbtaClient::new(&config)?);
    let ors_client = Arc::new(OrsClient::new(&config)?);

    // One cache for the life of the process.
    let cache = Arc::new(CommuteCache::new());

    let commute = Arc::new(CommuteService::new(
        mbta_client.clone(),
        mbta_client,
        ors_client,
        cache,
        CacheTtls::default(),
    ));

    let state = AppState { commute };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
