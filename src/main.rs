use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod broadcast;
mod caption;
mod config;
mod domain;
mod errors;
mod handlers;
mod models;
mod repositories;
mod routes;
mod service;
mod startup;
mod store;
mod ws;

use crate::broadcast::EventBroadcaster;
use crate::caption::GeminiCaptionGenerator;
use crate::config::Config;
use crate::errors::AppError;
use crate::repositories::{DynamoBidLedger, DynamoMemeRepository};
use crate::service::MemeService;

/// AppState holds shared resources for the web server.
pub struct AppState {
    pub service: MemeService,
    pub broadcaster: Arc<EventBroadcaster>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "memehustle=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    tracing::info!("Initializing DynamoDB client...");
    let sdk_config = store::create_sdk_config(&config).await;
    let db_client = store::create_dynamodb_client(&sdk_config);

    startup::init_resources(&db_client, &config).await?;

    // --- Application State ---
    let broadcaster = Arc::new(EventBroadcaster::new());
    let meme_repo = Arc::new(DynamoMemeRepository::new(
        db_client.clone(),
        config.memes_table.clone(),
    ));
    let bid_ledger = Arc::new(DynamoBidLedger::new(db_client, config.bids_table.clone()));
    let captions = Arc::new(GeminiCaptionGenerator::new(&config)?);
    let service = MemeService::new(meme_repo, bid_ledger, captions, broadcaster.clone());

    let state = Arc::new(AppState {
        service,
        broadcaster,
    });

    // --- Router / Server Startup ---
    let cors = routes::cors_layer(config.client_origin.as_deref())?;
    let app = routes::create_router(state, cors);

    tracing::info!("Server listening on http://{}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
