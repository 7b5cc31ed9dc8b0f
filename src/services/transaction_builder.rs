use ethers::abi::AbiEncode;
use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use std::str::FromStr;

use super::contracts::{
    erc20::ApproveCall,
    governor::{CastVoteCall, CastVoteWithReasonCall},
    staked_amor::DelegateCall,
    staking_manager::{CancelUnstakeCall, ClaimUnstakeCall, RequestUnstakeCall, StakeCall},
};
use crate::{
    constants::{
        CONTRACT_AMOR, CONTRACT_GOVERNOR, CONTRACT_STAKING_MANAGER, CONTRACT_ST_AMOR,
        CONTRACT_TIMELOCK, VOTE_SUPPORT_LABELS,
    },
    error::{AppError, Result},
    models::{BuildTransactionRequest, MultiStepTransaction, TransactionData, TransactionPlan},
    utils::{parse_address, parse_token_amount, parse_u256_dec},
};

// Calldata encoding for every user action. Nothing in this module touches the
// network; signing and submission happen in the wallet.

fn encode_call(call: impl AbiEncode) -> String {
    format!("0x{}", hex::encode(call.encode()))
}

fn protocol_address(value: &str) -> Result<Address> {
    Address::from_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid contract address {}: {}", value, e)))
}

fn amount_arg(amount: &str) -> Result<(String, U256)> {
    let display = amount.trim().to_string();
    let wei = parse_token_amount(&display)?;
    Ok((display, wei))
}

// Display names for the protocol contracts; anything else is shown by address.
const CONTRACT_LABELS: &[(&str, &str)] = &[
    (CONTRACT_AMOR, "AMOR"),
    (CONTRACT_ST_AMOR, "stAMOR"),
    (CONTRACT_STAKING_MANAGER, "the staking manager"),
    (CONTRACT_GOVERNOR, "the governor"),
    (CONTRACT_TIMELOCK, "the timelock"),
];

fn contract_label(address: &str) -> Option<&'static str> {
    CONTRACT_LABELS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(address))
        .map(|(_, label)| *label)
}

pub fn build_approve_transaction(
    token: &str,
    spender: &str,
    amount: &str,
) -> Result<TransactionData> {
    let token = parse_address(token)?;
    let spender = parse_address(spender)?;
    let (display, wei) = amount_arg(amount)?;

    let token_text = to_checksum(&token, None);
    let spender_text = to_checksum(&spender, None);
    let token_label = match contract_label(&token_text) {
        Some(label) => label.to_string(),
        None => format!("of token {}", token_text),
    };
    let spender_label = contract_label(&spender_text).unwrap_or(&spender_text);

    Ok(TransactionData {
        description: format!(
            "Approve {} {} for spending by {}",
            display, token_label, spender_label
        ),
        to: token_text,
        data: encode_call(ApproveCall {
            spender,
            amount: wei,
        }),
    })
}

/// Always two steps: the staking manager pulls AMOR through an allowance, so
/// the approve must confirm before the stake is sent.
pub fn build_stake_transaction(amount: &str) -> Result<MultiStepTransaction> {
    let (display, wei) = amount_arg(amount)?;
    let staking_manager = protocol_address(CONTRACT_STAKING_MANAGER)?;

    let approve_step = TransactionData {
        to: CONTRACT_AMOR.to_string(),
        data: encode_call(ApproveCall {
            spender: staking_manager,
            amount: wei,
        }),
        description: format!("Step 1: Approve {} AMOR for staking contract", display),
    };
    let stake_step = TransactionData {
        to: CONTRACT_STAKING_MANAGER.to_string(),
        data: encode_call(StakeCall { amount: wei }),
        description: format!("Step 2: Stake {} AMOR to receive stAMOR", display),
    };

    Ok(MultiStepTransaction {
        steps: vec![approve_step, stake_step],
        total_steps: 2,
        description: format!(
            "Stake {0} AMOR tokens. This requires 2 transactions: first approve the staking contract to spend your AMOR, then execute the stake. You will receive {0} stAMOR in return.",
            display
        ),
    })
}

pub fn build_unstake_transaction(amount: &str) -> Result<TransactionData> {
    let (display, wei) = amount_arg(amount)?;
    Ok(TransactionData {
        to: CONTRACT_STAKING_MANAGER.to_string(),
        data: encode_call(RequestUnstakeCall { amount: wei }),
        description: format!(
            "Request unstake of {} stAMOR. After the withdrawal delay period (typically 7 days), you can claim your AMOR tokens.",
            display
        ),
    })
}

pub fn build_claim_unstake_transaction(request_id: u64) -> TransactionData {
    TransactionData {
        to: CONTRACT_STAKING_MANAGER.to_string(),
        data: encode_call(ClaimUnstakeCall {
            request_id: U256::from(request_id),
        }),
        description: format!(
            "Claim unstaked AMOR from request #{}. The AMOR tokens will be transferred to your wallet.",
            request_id
        ),
    }
}

pub fn build_cancel_unstake_transaction(request_id: u64) -> TransactionData {
    TransactionData {
        to: CONTRACT_STAKING_MANAGER.to_string(),
        data: encode_call(CancelUnstakeCall {
            request_id: U256::from(request_id),
        }),
        description: format!(
            "Cancel unstake request #{}. Your stAMOR will remain staked and retain voting power.",
            request_id
        ),
    }
}

pub fn build_delegate_transaction(delegatee: &str) -> Result<TransactionData> {
    let delegatee_address = parse_address(delegatee)?;
    Ok(TransactionData {
        to: CONTRACT_ST_AMOR.to_string(),
        data: encode_call(DelegateCall {
            delegatee: delegatee_address,
        }),
        description: format!(
            "Delegate voting power to {}. To self-delegate and activate your own voting power, use your own address.",
            delegatee.trim()
        ),
    })
}

/// `support`: 0 = Against, 1 = For, 2 = Abstain. A non-blank reason switches
/// to `castVoteWithReason`.
pub fn build_vote_transaction(
    proposal_id: &str,
    support: u8,
    reason: Option<&str>,
) -> Result<TransactionData> {
    let id = parse_u256_dec(proposal_id)?;
    let label = VOTE_SUPPORT_LABELS
        .get(support as usize)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Vote support must be 0 (Against), 1 (For) or 2 (Abstain), got {}",
                support
            ))
        })?;
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());

    let (data, reason_text) = match reason {
        Some(reason) => (
            encode_call(CastVoteWithReasonCall {
                proposal_id: id,
                support,
                reason: reason.to_string(),
            }),
            format!(" with reason: \"{}\"", reason),
        ),
        None => (
            encode_call(CastVoteCall {
                proposal_id: id,
                support,
            }),
            String::new(),
        ),
    };

    Ok(TransactionData {
        to: CONTRACT_GOVERNOR.to_string(),
        data,
        description: format!(
            "Vote \"{}\" on proposal #{}{}",
            label,
            proposal_id.trim(),
            reason_text
        ),
    })
}

/// Dispatch for `POST /api/transactions/build`.
pub fn build_transaction(request: &BuildTransactionRequest) -> Result<TransactionPlan> {
    let plan = match request {
        BuildTransactionRequest::Approve {
            token,
            spender,
            amount,
        } => TransactionPlan::Single(build_approve_transaction(token, spender, amount)?),
        BuildTransactionRequest::Stake { amount } => {
            TransactionPlan::MultiStep(build_stake_transaction(amount)?)
        }
        BuildTransactionRequest::Unstake { amount } => {
            TransactionPlan::Single(build_unstake_transaction(amount)?)
        }
        BuildTransactionRequest::Claim { request_id } => {
            TransactionPlan::Single(build_claim_unstake_transaction(*request_id))
        }
        BuildTransactionRequest::CancelUnstake { request_id } => {
            TransactionPlan::Single(build_cancel_unstake_transaction(*request_id))
        }
        BuildTransactionRequest::Delegate { delegatee } => {
            TransactionPlan::Single(build_delegate_transaction(delegatee)?)
        }
        BuildTransactionRequest::Vote {
            proposal_id,
            support,
            reason,
        } => TransactionPlan::Single(build_vote_transaction(
            proposal_id,
            *support,
            reason.as_deref(),
        )?),
    };
    Ok(plan)
}

// ==================== RESPONSE TEXT ====================
// The transaction parser reads these blocks back out of assistant replies.

pub fn format_transaction_for_response(tx: &TransactionData) -> String {
    format!(
        "Transaction Ready:\n\
         - Contract: {}\n\
         - Encoded Data: {}\n\
         - Description: {}\n\n\
         To execute this transaction, use your connected wallet to send a transaction with the above parameters. The \"data\" field contains the encoded function call.",
        tx.to, tx.data, tx.description
    )
}

pub fn format_multi_step_transaction_for_response(tx: &MultiStepTransaction) -> String {
    let mut response = format!(
        "Multi-Step Transaction ({} steps required):\n{}\n\n",
        tx.total_steps, tx.description
    );
    for (index, step) in tx.steps.iter().enumerate() {
        response.push_str(&format!(
            "--- Step {} of {} ---\nContract: {}\nEncoded Data: {}\nDescription: {}\n\n",
            index + 1,
            tx.total_steps,
            step.to,
            step.data,
            step.description
        ));
    }
    response.push_str(
        "Execute these transactions in order using your connected wallet. Wait for each transaction to confirm before proceeding to the next.",
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::AbiDecode;

    fn calldata(tx: &TransactionData) -> Vec<u8> {
        hex::decode(tx.data.trim_start_matches("0x")).expect("hex calldata")
    }

    fn wei(amount: u64) -> U256 {
        U256::from(amount) * U256::exp10(18)
    }

    #[test]
    fn stake_is_approve_then_stake() {
        let plan = build_stake_transaction("100").expect("stake plan");
        assert_eq!(plan.total_steps, 2);
        assert_eq!(plan.steps.len(), 2);

        let approve = ApproveCall::decode(calldata(&plan.steps[0])).expect("approve call");
        assert_eq!(plan.steps[0].to, CONTRACT_AMOR);
        assert_eq!(
            approve.spender,
            Address::from_str(CONTRACT_STAKING_MANAGER).expect("address")
        );
        assert_eq!(approve.amount, wei(100));

        let stake = StakeCall::decode(calldata(&plan.steps[1])).expect("stake call");
        assert_eq!(plan.steps[1].to, CONTRACT_STAKING_MANAGER);
        assert_eq!(stake.amount, wei(100));
        assert!(plan.description.starts_with("Stake 100 AMOR tokens."));
    }

    #[test]
    fn stake_handles_fractional_amounts() {
        let plan = build_stake_transaction("0.5").expect("stake plan");
        let approve = ApproveCall::decode(calldata(&plan.steps[0])).expect("approve call");
        assert_eq!(approve.amount, U256::exp10(17) * U256::from(5u64));
    }

    #[test]
    fn approve_selector_is_standard() {
        let plan = build_stake_transaction("1").expect("stake plan");
        assert!(plan.steps[0].data.starts_with("0x095ea7b3"));
    }

    #[test]
    fn approve_description_names_token_and_spender() {
        let tx = build_approve_transaction(CONTRACT_AMOR, CONTRACT_STAKING_MANAGER, "10")
            .expect("approve");
        assert_eq!(tx.description, "Approve 10 AMOR for spending by the staking manager");
        assert_eq!(tx.to, CONTRACT_AMOR);

        let token = "0x1111111111111111111111111111111111111111";
        let spender = "0x2222222222222222222222222222222222222222";
        let tx = build_approve_transaction(token, spender, "1.5").expect("approve");
        assert_eq!(
            tx.description,
            format!("Approve 1.5 of token {} for spending by {}", token, spender)
        );
        let call = ApproveCall::decode(calldata(&tx)).expect("approve call");
        assert_eq!(call.amount, U256::exp10(17) * U256::from(15u64));
    }

    #[test]
    fn unstake_encodes_request_unstake() {
        let tx = build_unstake_transaction("25").expect("unstake");
        let call = RequestUnstakeCall::decode(calldata(&tx)).expect("requestUnstake call");
        assert_eq!(call.amount, wei(25));
        assert_eq!(tx.to, CONTRACT_STAKING_MANAGER);
    }

    #[test]
    fn claim_and_cancel_carry_request_id() {
        let claim = build_claim_unstake_transaction(3);
        let call = ClaimUnstakeCall::decode(calldata(&claim)).expect("claim call");
        assert_eq!(call.request_id, U256::from(3u64));

        let cancel = build_cancel_unstake_transaction(4);
        let call = CancelUnstakeCall::decode(calldata(&cancel)).expect("cancel call");
        assert_eq!(call.request_id, U256::from(4u64));
        assert!(cancel.description.contains("#4"));
    }

    #[test]
    fn vote_without_reason_uses_cast_vote() {
        let tx = build_vote_transaction("42", 1, None).expect("vote");
        let call = CastVoteCall::decode(calldata(&tx)).expect("castVote call");
        assert_eq!(call.proposal_id, U256::from(42u64));
        assert_eq!(call.support, 1);
        assert_eq!(tx.description, "Vote \"For\" on proposal #42");
    }

    #[test]
    fn vote_with_reason_uses_cast_vote_with_reason() {
        let tx = build_vote_transaction("42", 0, Some("too expensive")).expect("vote");
        let call = CastVoteWithReasonCall::decode(calldata(&tx)).expect("castVoteWithReason");
        assert_eq!(call.support, 0);
        assert_eq!(call.reason, "too expensive");
        assert!(tx.description.contains("Against"));
    }

    #[test]
    fn blank_reason_falls_back_to_cast_vote() {
        let tx = build_vote_transaction("42", 2, Some("   ")).expect("vote");
        assert!(CastVoteCall::decode(calldata(&tx)).is_ok());
    }

    #[test]
    fn vote_rejects_unknown_support() {
        assert!(matches!(
            build_vote_transaction("1", 3, None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn delegate_rejects_non_address() {
        assert!(build_delegate_transaction("alice.neo").is_err());
        let tx = build_delegate_transaction(CONTRACT_AMOR).expect("delegate");
        let call = DelegateCall::decode(calldata(&tx)).expect("delegate call");
        assert_eq!(call.delegatee, Address::from_str(CONTRACT_AMOR).expect("address"));
        assert_eq!(tx.to, CONTRACT_ST_AMOR);
    }

    #[test]
    fn malformed_amount_is_rejected() {
        assert!(build_unstake_transaction("lots").is_err());
        assert!(build_stake_transaction("").is_err());
    }

    #[test]
    fn multi_step_text_has_numbered_blocks() {
        let plan = build_stake_transaction("10").expect("stake plan");
        let text = format_multi_step_transaction_for_response(&plan);
        assert!(text.starts_with("Multi-Step Transaction (2 steps required):"));
        assert!(text.contains("--- Step 1 of 2 ---\nContract: 0x7C833fe6b80465F956E2939aD6f03FFaC08f058e"));
        assert!(text.contains("--- Step 2 of 2 ---"));
    }

    #[test]
    fn build_transaction_dispatches_tagged_request() {
        let request: BuildTransactionRequest =
            serde_json::from_value(serde_json::json!({"type": "stake", "amount": "5"}))
                .expect("request");
        let plan = build_transaction(&request).expect("plan");
        assert!(matches!(plan, TransactionPlan::MultiStep(ref tx) if tx.total_steps == 2));
    }
}
