use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod error;
mod models;
mod services;
mod utils;

use config::Config;
use constants::API_VERSION;
use services::{llm::OpenAiClient, onchain::OnchainReader, session_store::InMemorySessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amor_guardian=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting AMOR Guardian backend");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);
    tracing::info!("Neo X RPC: {} (chain {})", config.rpc_url, config.chain_id);
    if config.is_development() {
        tracing::info!("LLM model: {} via {}", config.openai_model, config.openai_base_url);
    }

    // Long-lived clients, shared by every request
    let rpc = Arc::new(OnchainReader::from_config(&config)?);
    let llm = Arc::new(OpenAiClient::from_config(&config)?);
    let sessions = Arc::new(InMemorySessionStore::new());

    let app_state = api::AppState::new(config.clone(), rpc, llm, sessions)?;

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/api/config", get(api::health::client_config))
        // Guardian chat
        .route("/api/guardian/chat", post(api::guardian::chat))
        .route("/api/guardian/chat/stream", post(api::guardian::chat_stream))
        .route(
            "/api/guardian/history/{session_id}",
            get(api::guardian::history),
        )
        .route(
            "/api/guardian/session/{session_id}",
            delete(api::guardian::clear_session),
        )
        .route(
            "/api/guardian/transactions/parse",
            post(api::guardian::parse_transactions),
        )
        // On-chain reads
        .route("/api/chain/stats", get(api::chain::get_stats))
        .route("/api/chain/user/{address}", get(api::chain::get_user_data))
        .route(
            "/api/chain/proposal/{proposal_id}",
            get(api::chain::get_proposal),
        )
        .route(
            "/api/chain/proposal/{proposal_id}/voted/{address}",
            get(api::chain::get_has_voted),
        )
        .route(
            "/api/chain/voting-power/{address}",
            get(api::chain::get_voting_power),
        )
        .route("/api/chain/price/{symbol}", get(api::chain::get_price))
        .route("/api/chain/gas-price", get(api::chain::get_gas_price))
        .route("/api/chain/simulate", post(api::chain::simulate))
        // Unsigned transaction building
        .route("/api/transactions/build", post(api::transactions::build))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
