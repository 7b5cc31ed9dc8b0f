use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== BUILT TRANSACTIONS ====================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    pub to: String,
    pub data: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiStepTransaction {
    pub steps: Vec<TransactionData>,
    pub total_steps: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TransactionPlan {
    Single(TransactionData),
    MultiStep(MultiStepTransaction),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BuildTransactionRequest {
    Approve {
        token: String,
        spender: String,
        amount: String,
    },
    Stake {
        amount: String,
    },
    Unstake {
        amount: String,
    },
    #[serde(rename_all = "camelCase")]
    Claim {
        request_id: u64,
    },
    #[serde(rename_all = "camelCase")]
    CancelUnstake {
        request_id: u64,
    },
    Delegate {
        delegatee: String,
    },
    #[serde(rename_all = "camelCase")]
    Vote {
        proposal_id: String,
        support: u8,
        reason: Option<String>,
    },
}

// ==================== SUGGESTED TRANSACTIONS ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Stake,
    Unstake,
    Claim,
    Delegate,
    Vote,
    Approve,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionType::Stake => "stake",
            TransactionType::Unstake => "unstake",
            TransactionType::Claim => "claim",
            TransactionType::Delegate => "delegate",
            TransactionType::Vote => "vote",
            TransactionType::Approve => "approve",
        };
        f.write_str(label)
    }
}

/// Why the execute action is disabled for a suggested transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    InvalidAddress,
    UnverifiedContract,
    InvalidCalldata,
}

impl BlockReason {
    pub fn message(&self) -> &'static str {
        match self {
            BlockReason::InvalidAddress => "Blocked: the target address is not a valid address.",
            BlockReason::UnverifiedContract => {
                "Blocked: the target contract is not a verified AMOR protocol contract."
            }
            BlockReason::InvalidCalldata => {
                "Blocked: the transaction data is not valid hex-encoded calldata."
            }
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A transaction lifted out of assistant prose, before any gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSuggestion {
    pub tx_type: TransactionType,
    pub to: String,
    pub data: String,
    pub description: String,
    pub amount: Option<String>,
}

/// A suggestion with its gate verdict attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub to: String,
    pub data: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    pub is_verified: bool,
    pub executable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_reads_tagged_vote() {
        let request: BuildTransactionRequest = serde_json::from_value(serde_json::json!({
            "type": "vote",
            "proposalId": "42",
            "support": 1
        }))
        .expect("vote request should parse");
        match request {
            BuildTransactionRequest::Vote {
                proposal_id,
                support,
                reason,
            } => {
                assert_eq!(proposal_id, "42");
                assert_eq!(support, 1);
                assert!(reason.is_none());
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn build_request_reads_cancel_unstake() {
        let request: BuildTransactionRequest = serde_json::from_value(serde_json::json!({
            "type": "cancelUnstake",
            "requestId": 3
        }))
        .expect("cancel request should parse");
        assert!(matches!(
            request,
            BuildTransactionRequest::CancelUnstake { request_id: 3 }
        ));
    }

    #[test]
    fn parsed_transaction_uses_type_key() {
        let tx = ParsedTransaction {
            tx_type: TransactionType::Approve,
            to: "0x1".to_string(),
            data: "0x".to_string(),
            description: String::new(),
            amount: None,
            is_verified: false,
            executable: false,
            block_reason: Some(BlockReason::UnverifiedContract),
        };
        let json = serde_json::to_value(tx).expect("serialize");
        assert_eq!(json["type"], "approve");
        assert_eq!(json["blockReason"], "unverified_contract");
        assert_eq!(json["isVerified"], false);
    }
}
