use ethers::types::Bytes;
use std::str::FromStr;
use std::sync::Arc;

use super::onchain::ChainRpc;
use crate::{
    constants::SIMULATION_ERROR_MAX_CHARS,
    error::{AppError, Result},
    models::{GasPriceInfo, SimulationResult},
    utils::{format_gwei, parse_address, truncate_chars},
};

/// Gas price lookups and `eth_estimateGas` dry runs. Advisory only: nothing
/// here ever blocks a transaction.
#[derive(Clone)]
pub struct GasOptimizer {
    rpc: Arc<dyn ChainRpc>,
}

impl GasOptimizer {
    pub fn new(rpc: Arc<dyn ChainRpc>) -> Self {
        Self { rpc }
    }

    /// Current gas price; zero when the node cannot be reached.
    pub async fn get_gas_price(&self) -> GasPriceInfo {
        let timestamp = chrono::Utc::now().timestamp_millis();
        match self.rpc.gas_price().await {
            Ok(price) => GasPriceInfo {
                gas_price: price.to_string(),
                gas_price_gwei: format_gwei(price),
                timestamp,
            },
            Err(e) => {
                tracing::warn!("Failed to fetch gas price: {}", e);
                GasPriceInfo {
                    gas_price: "0".to_string(),
                    gas_price_gwei: "0".to_string(),
                    timestamp,
                }
            }
        }
    }

    /// Dry-runs `{from, to, data}`. Malformed input is a request error; a
    /// failing estimate is a classified `SimulationResult`.
    pub async fn simulate_transaction(
        &self,
        from: &str,
        to: &str,
        data: &str,
    ) -> Result<SimulationResult> {
        let from = parse_address(from)?;
        let to = parse_address(to)?;
        let calldata = Bytes::from_str(data.trim())
            .map_err(|e| AppError::BadRequest(format!("Invalid calldata: {}", e)))?;

        match self.rpc.estimate_gas(from, to, calldata).await {
            Ok(gas) => Ok(SimulationResult {
                success: true,
                gas_estimate: Some(gas.to_string()),
                error: None,
            }),
            Err(e) => {
                let raw = match e {
                    AppError::BlockchainRPC(message) => message,
                    other => other.to_string(),
                };
                tracing::debug!("Simulation failed: {}", raw);
                Ok(SimulationResult {
                    success: false,
                    gas_estimate: None,
                    error: Some(classify_simulation_error(&raw)),
                })
            }
        }
    }
}

/// Maps raw node errors to the hints shown to users.
pub fn classify_simulation_error(raw: &str) -> String {
    if raw.contains("insufficient funds") {
        "Insufficient funds for gas. Please ensure you have enough GAS tokens.".to_string()
    } else if raw.contains("execution reverted") {
        "Transaction would fail. This could be due to insufficient balance, lack of approval, or contract restrictions."
            .to_string()
    } else if raw.contains("allowance") {
        "Insufficient token allowance. You need to approve the contract first.".to_string()
    } else {
        truncate_chars(raw, SIMULATION_ERROR_MAX_CHARS)
    }
}
