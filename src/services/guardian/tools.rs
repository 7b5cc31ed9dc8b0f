use serde_json::{json, Map, Value};

use crate::{
    error::{AppError, Result},
    services::{
        chain_reader::{self, ChainReader},
        gas_optimizer::GasOptimizer,
        llm::{ToolCall, ToolDefinition},
        transaction_builder,
    },
};

const MISSING_ADDRESS: &str =
    "No wallet address available. Ask the user to connect their wallet or provide an address.";

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn address_property(what: &str) -> Value {
    json!({
        "type": "string",
        "description": format!("{} (0x-prefixed). Defaults to the connected wallet.", what),
    })
}

/// Everything the model may call during a Guardian turn.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_chain_stats",
            description: "Protocol-wide statistics: total staked, proposal threshold, voting delay and period, withdrawal delay, quorum, paused flag.",
            parameters: object_schema(json!({}), &[]),
        },
        ToolDefinition {
            name: "get_user_data",
            description: "Wallet balances (AMOR, stAMOR), voting power, active stake, delegate and pending unstake requests.",
            parameters: object_schema(json!({ "address": address_property("Wallet address") }), &[]),
        },
        ToolDefinition {
            name: "get_proposal_details",
            description: "State, proposer, vote tally and snapshot/deadline blocks of a governance proposal.",
            parameters: object_schema(
                json!({ "proposal_id": { "type": "string", "description": "Decimal proposal id" } }),
                &["proposal_id"],
            ),
        },
        ToolDefinition {
            name: "check_has_voted",
            description: "Whether an address has already voted on a proposal.",
            parameters: object_schema(
                json!({
                    "proposal_id": { "type": "string", "description": "Decimal proposal id" },
                    "address": address_property("Voter address"),
                }),
                &["proposal_id"],
            ),
        },
        ToolDefinition {
            name: "analyze_voting_power",
            description: "Checks delegation status and explains how to activate or grow voting power.",
            parameters: object_schema(json!({ "address": address_property("Wallet address") }), &[]),
        },
        ToolDefinition {
            name: "get_token_price",
            description: "Indicative USD price and 24h change for AMOR, stAMOR, GAS or NEO.",
            parameters: object_schema(
                json!({ "symbol": { "type": "string", "description": "Token symbol" } }),
                &["symbol"],
            ),
        },
        ToolDefinition {
            name: "get_gas_price",
            description: "Current network gas price.",
            parameters: object_schema(json!({}), &[]),
        },
        ToolDefinition {
            name: "simulate_transaction",
            description: "Dry-runs a prepared transaction with eth_estimateGas and reports the gas estimate or why it would fail.",
            parameters: object_schema(
                json!({
                    "to": { "type": "string", "description": "Target contract" },
                    "data": { "type": "string", "description": "0x-prefixed calldata" },
                    "from": address_property("Sender address"),
                }),
                &["to", "data"],
            ),
        },
        ToolDefinition {
            name: "build_stake_transaction",
            description: "Prepares the two transactions (approve, then stake) to stake AMOR for stAMOR.",
            parameters: object_schema(
                json!({ "amount": { "type": "string", "description": "AMOR amount, e.g. \"100\" or \"0.5\"" } }),
                &["amount"],
            ),
        },
        ToolDefinition {
            name: "build_unstake_transaction",
            description: "Prepares an unstake request; the AMOR becomes claimable after the withdrawal delay.",
            parameters: object_schema(
                json!({ "amount": { "type": "string", "description": "stAMOR amount" } }),
                &["amount"],
            ),
        },
        ToolDefinition {
            name: "build_claim_unstake_transaction",
            description: "Prepares a claim for an unlocked unstake request.",
            parameters: object_schema(
                json!({ "request_id": { "type": "integer", "description": "Unstake request id" } }),
                &["request_id"],
            ),
        },
        ToolDefinition {
            name: "build_cancel_unstake_transaction",
            description: "Prepares the cancellation of a pending unstake request.",
            parameters: object_schema(
                json!({ "request_id": { "type": "integer", "description": "Unstake request id" } }),
                &["request_id"],
            ),
        },
        ToolDefinition {
            name: "build_delegate_transaction",
            description: "Prepares a delegation of stAMOR voting power. Omit the delegatee to self-delegate.",
            parameters: object_schema(
                json!({ "delegatee": address_property("Delegatee address") }),
                &[],
            ),
        },
        ToolDefinition {
            name: "build_vote_transaction",
            description: "Prepares a vote on a proposal. support: 0 = Against, 1 = For, 2 = Abstain.",
            parameters: object_schema(
                json!({
                    "proposal_id": { "type": "string", "description": "Decimal proposal id" },
                    "support": { "type": "integer", "enum": [0, 1, 2] },
                    "reason": { "type": "string", "description": "Optional reason recorded on-chain" },
                }),
                &["proposal_id", "support"],
            ),
        },
    ]
}

/// Runs tool calls against the chain reader, builder and gas helper.
#[derive(Clone)]
pub struct ToolExecutor {
    chain: ChainReader,
    gas: GasOptimizer,
}

impl ToolExecutor {
    pub fn new(chain: ChainReader, gas: GasOptimizer) -> Self {
        Self { chain, gas }
    }

    /// Always yields text for the model; failures become `Error: ...`.
    pub async fn execute(&self, call: &ToolCall, wallet: Option<&str>) -> String {
        let name = call.function.name.as_str();
        let outcome = match parse_arguments(&call.function.arguments) {
            Ok(args) => self.run(name, &args, wallet).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Guardian tool {} failed: {}", name, e);
                format!("Error: {}", e)
            }
        }
    }

    async fn run(&self, name: &str, args: &Map<String, Value>, wallet: Option<&str>) -> Result<String> {
        match name {
            "get_chain_stats" => {
                let stats = self.chain.get_chain_stats().await;
                Ok(chain_reader::format_chain_stats_for_ai(&stats))
            }
            "get_user_data" => {
                let address = address_arg(args, "address", wallet)?;
                let data = self.chain.get_user_chain_data(&address).await;
                Ok(chain_reader::format_user_data_for_ai(&data))
            }
            "get_proposal_details" => {
                let details = self
                    .chain
                    .get_proposal_details(&string_arg(args, "proposal_id")?)
                    .await?;
                Ok(chain_reader::format_proposal_details_for_ai(&details))
            }
            "check_has_voted" => {
                let proposal_id = string_arg(args, "proposal_id")?;
                let address = address_arg(args, "address", wallet)?;
                let status = self.chain.check_has_voted(&proposal_id, &address).await?;
                Ok(chain_reader::format_voting_status_for_ai(&status))
            }
            "analyze_voting_power" => {
                let address = address_arg(args, "address", wallet)?;
                let analysis = self.chain.analyze_voting_power(&address).await;
                Ok(chain_reader::format_voting_power_analysis_for_ai(&analysis))
            }
            "get_token_price" => {
                let price = chain_reader::get_token_price(&string_arg(args, "symbol")?);
                Ok(chain_reader::format_token_price_for_ai(&price))
            }
            "get_gas_price" => {
                let info = self.gas.get_gas_price().await;
                Ok(format!(
                    "Current Gas Price:\n- {} gwei ({} wei)",
                    info.gas_price_gwei, info.gas_price
                ))
            }
            "simulate_transaction" => {
                let from = address_arg(args, "from", wallet)?;
                let to = string_arg(args, "to")?;
                let data = string_arg(args, "data")?;
                let result = self.gas.simulate_transaction(&from, &to, &data).await?;
                Ok(match (result.success, result.gas_estimate, result.error) {
                    (true, Some(gas), _) => {
                        format!("Simulation succeeded. Estimated gas: {}", gas)
                    }
                    (_, _, Some(error)) => format!("Simulation failed: {}", error),
                    _ => "Simulation returned no result.".to_string(),
                })
            }
            "build_stake_transaction" => {
                let plan = transaction_builder::build_stake_transaction(&string_arg(args, "amount")?)?;
                Ok(transaction_builder::format_multi_step_transaction_for_response(&plan))
            }
            "build_unstake_transaction" => {
                let tx = transaction_builder::build_unstake_transaction(&string_arg(args, "amount")?)?;
                Ok(transaction_builder::format_transaction_for_response(&tx))
            }
            "build_claim_unstake_transaction" => {
                let tx = transaction_builder::build_claim_unstake_transaction(u64_arg(args, "request_id")?);
                Ok(transaction_builder::format_transaction_for_response(&tx))
            }
            "build_cancel_unstake_transaction" => {
                let tx =
                    transaction_builder::build_cancel_unstake_transaction(u64_arg(args, "request_id")?);
                Ok(transaction_builder::format_transaction_for_response(&tx))
            }
            "build_delegate_transaction" => {
                let delegatee = address_arg(args, "delegatee", wallet)?;
                let tx = transaction_builder::build_delegate_transaction(&delegatee)?;
                Ok(transaction_builder::format_transaction_for_response(&tx))
            }
            "build_vote_transaction" => {
                let proposal_id = string_arg(args, "proposal_id")?;
                let support = u8::try_from(u64_arg(args, "support")?)
                    .map_err(|_| AppError::BadRequest("support must be 0, 1 or 2".to_string()))?;
                let reason = optional_string_arg(args, "reason");
                let tx = transaction_builder::build_vote_transaction(
                    &proposal_id,
                    support,
                    reason.as_deref(),
                )?;
                Ok(transaction_builder::format_transaction_for_response(&tx))
            }
            other => Err(AppError::BadRequest(format!("Unknown tool: {}", other))),
        }
    }
}

// ==================== ARGUMENTS ====================

fn parse_arguments(raw: &str) -> Result<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(AppError::BadRequest(
            "Tool arguments must be a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::BadRequest(format!("Malformed tool arguments: {}", e))),
    }
}

fn optional_string_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_arg(args: &Map<String, Value>, key: &str) -> Result<String> {
    optional_string_arg(args, key)
        .ok_or_else(|| AppError::BadRequest(format!("Missing argument: {}", key)))
}

fn u64_arg(args: &Map<String, Value>, key: &str) -> Result<u64> {
    let raw = string_arg(args, key)?;
    raw.parse::<u64>()
        .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer", key)))
}

// Falls back to the connected wallet when the model leaves the address out.
fn address_arg(args: &Map<String, Value>, key: &str, wallet: Option<&str>) -> Result<String> {
    optional_string_arg(args, key)
        .or_else(|| wallet.map(str::to_string))
        .ok_or_else(|| AppError::BadRequest(MISSING_ADDRESS.to_string()))
}
