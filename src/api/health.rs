use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::constants::API_VERSION;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub api_version: String,
    pub chain_id: u64,
    pub llm: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigResponse {
    pub wallet_connect_project_id: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_status = if state.config.openai_api_key.is_some() {
        "configured"
    } else {
        "not_configured"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: API_VERSION.to_string(),
        chain_id: state.config.chain_id,
        llm: llm_status.to_string(),
    })
}

/// Public settings the web client needs at startup.
pub async fn client_config(State(state): State<AppState>) -> Json<ClientConfigResponse> {
    Json(ClientConfigResponse {
        wallet_connect_project_id: state.config.walletconnect_project_id.clone(),
    })
}
