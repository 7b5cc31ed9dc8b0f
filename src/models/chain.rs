use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_WITHDRAWAL_DELAY_SECS, PROPOSAL_STATE_NAMES, ZERO_ADDRESS};

// ==================== PROTOCOL ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStats {
    pub total_staked_amor: String,
    pub proposal_threshold: String,
    pub voting_delay: u64,
    pub voting_period: u64,
    pub withdrawal_delay: u64,
    pub quorum_numerator: u64,
    pub staking_paused: bool,
    pub timestamp: i64,
}

impl Default for ChainStats {
    fn default() -> Self {
        Self {
            total_staked_amor: "0".to_string(),
            proposal_threshold: "0".to_string(),
            voting_delay: 0,
            voting_period: 0,
            withdrawal_delay: DEFAULT_WITHDRAWAL_DELAY_SECS,
            quorum_numerator: 0,
            staking_paused: false,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

// ==================== WALLET ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstakeRequest {
    pub id: u64,
    pub amount: String,
    pub requested_at: u64,
    pub unlock_at: u64,
    pub claimed: bool,
    pub cancelled: bool,
}

impl UnstakeRequest {
    pub fn is_pending(&self) -> bool {
        !self.claimed && !self.cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChainData {
    pub address: String,
    pub amor_balance: String,
    pub st_amor_balance: String,
    pub voting_power: String,
    pub active_stake: String,
    pub delegate: String,
    pub unstake_requests: Vec<UnstakeRequest>,
    pub timestamp: i64,
}

impl UserChainData {
    pub fn empty(address: &str) -> Self {
        Self {
            address: address.to_string(),
            amor_balance: "0".to_string(),
            st_amor_balance: "0".to_string(),
            voting_power: "0".to_string(),
            active_stake: "0".to_string(),
            delegate: ZERO_ADDRESS.to_string(),
            unstake_requests: Vec::new(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

// ==================== GOVERNANCE ====================
pub fn proposal_state_name(state: u8) -> &'static str {
    PROPOSAL_STATE_NAMES
        .get(state as usize)
        .copied()
        .unwrap_or("Unknown")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDetails {
    pub proposal_id: String,
    pub state: u8,
    pub state_name: String,
    pub proposer: String,
    pub for_votes: String,
    pub against_votes: String,
    pub abstain_votes: String,
    pub snapshot_block: u64,
    pub deadline_block: u64,
    pub timestamp: i64,
}

impl ProposalDetails {
    pub fn unknown(proposal_id: &str) -> Self {
        Self {
            proposal_id: proposal_id.to_string(),
            state: 0,
            state_name: "Unknown".to_string(),
            proposer: ZERO_ADDRESS.to_string(),
            for_votes: "0".to_string(),
            against_votes: "0".to_string(),
            abstain_votes: "0".to_string(),
            snapshot_block: 0,
            deadline_block: 0,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStatus {
    pub proposal_id: String,
    pub address: String,
    pub has_voted: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingPowerAnalysis {
    pub address: String,
    pub st_amor_balance: String,
    pub voting_power: String,
    pub delegate: String,
    pub is_self_delegated: bool,
    pub voting_power_active: bool,
    pub recommendations: Vec<String>,
    pub timestamp: i64,
}

// ==================== MARKET ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrice {
    pub symbol: String,
    pub price_usd: String,
    pub change_24h: String,
    pub last_updated: i64,
}

// ==================== GAS ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPriceInfo {
    pub gas_price: String,
    pub gas_price_gwei: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub from: String,
    pub to: String,
    pub data: String,
}
