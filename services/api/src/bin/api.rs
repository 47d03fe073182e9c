//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{GeminiChatAdapter, GeminiClient, GeminiDocAdapter, SqliteStateAdapter},
    config::Config,
    error::ApiError,
    web::{
        rest::{
            generate_document_handler, list_plans_handler, list_tools_handler,
            new_session_handler, purchase_handler, reset_limits_handler,
            select_plan_handler, select_session_handler, send_message_handler,
            snapshot_handler, update_settings_handler, ApiDoc,
        },
        state::{AppState, Stores},
    },
};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use nyaya_core::ports::StateStore;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the State Store ---
    info!("Opening state store at {}", config.database_url);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db = Arc::new(SqliteStateAdapter::new(db_pool));
    db.create_schema().await?;

    // --- 3. Load the Persisted Stores ---
    // The startup load also applies the daily quota rollover, so the
    // possibly-reset counter is written back before serving.
    let stores = Stores::load(db.as_ref(), Utc::now()).await?;
    db.save_user_state(&stores.user).await?;
    info!(
        tier = stores.user.tier.label(),
        sessions = stores.sessions.sessions().len(),
        "State loaded"
    );

    // --- 4. Initialize the Gateway Adapters ---
    if config.gemini_api_key.is_none() {
        info!("GEMINI_API_KEY is not set; generation calls will fail until it is provided");
    }
    let gemini = GeminiClient::new(config.gemini_api_key.clone())?;
    let chat = Arc::new(GeminiChatAdapter::new(
        gemini.clone(),
        config.chat_model.clone(),
        config.premium_chat_model.clone(),
    ));
    let docs = Arc::new(GeminiDocAdapter::new(gemini, config.doc_model.clone()));

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(stores, db, chat, docs));

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().map_err(
            |e| ApiError::Internal(format!("Invalid CORS origin: {e}")),
        )?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    let api_router = Router::new()
        .route("/state", get(snapshot_handler))
        .route("/sessions", post(new_session_handler))
        .route("/sessions/{id}/select", post(select_session_handler))
        .route("/chat", post(send_message_handler))
        .route("/settings", put(update_settings_handler))
        .route("/plans", get(list_plans_handler))
        .route("/plans/select", post(select_plan_handler))
        .route("/tools", get(list_tools_handler))
        .route("/tools/generate", post(generate_document_handler))
        .route("/purchases", post(purchase_handler))
        .route("/debug/reset-limits", post(reset_limits_handler))
        .layer(cors)
        .with_state(app_state);

    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
