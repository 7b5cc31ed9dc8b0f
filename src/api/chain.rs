use axum::{
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::{
    error::Result,
    models::chain::{
        ChainStats, GasPriceInfo, ProposalDetails, SimulateRequest, SimulationResult, TokenPrice,
        UserChainData, VotingPowerAnalysis, VotingStatus,
    },
    services::chain_reader,
};

// RPC read failures are coalesced into defaults by the reader, so the read
// endpoints below only fail on malformed path input.

/// GET /api/chain/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<ChainStats> {
    Json(state.chain.get_chain_stats().await)
}

/// GET /api/chain/user/{address}
pub async fn get_user_data(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<UserChainData> {
    Json(state.chain.get_user_chain_data(&address).await)
}

/// GET /api/chain/proposal/{proposalId}
pub async fn get_proposal(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
) -> Result<Json<ProposalDetails>> {
    Ok(Json(state.chain.get_proposal_details(&proposal_id).await?))
}

/// GET /api/chain/proposal/{proposalId}/voted/{address}
pub async fn get_has_voted(
    State(state): State<AppState>,
    Path((proposal_id, address)): Path<(String, String)>,
) -> Result<Json<VotingStatus>> {
    Ok(Json(
        state.chain.check_has_voted(&proposal_id, &address).await?,
    ))
}

/// GET /api/chain/voting-power/{address}
pub async fn get_voting_power(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<VotingPowerAnalysis> {
    Json(state.chain.analyze_voting_power(&address).await)
}

/// GET /api/chain/price/{symbol}
pub async fn get_price(Path(symbol): Path<String>) -> Json<TokenPrice> {
    Json(chain_reader::get_token_price(&symbol))
}

/// GET /api/chain/gas-price
pub async fn get_gas_price(State(state): State<AppState>) -> Json<GasPriceInfo> {
    Json(state.gas.get_gas_price().await)
}

/// POST /api/chain/simulate
pub async fn simulate(
    State(state): State<AppState>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulationResult>> {
    let result = state
        .gas
        .simulate_transaction(&req.from, &req.to, &req.data)
        .await?;
    Ok(Json(result))
}
