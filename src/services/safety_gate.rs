use crate::{
    constants::CONTRACT_WHITELIST,
    models::{BlockReason, ParsedTransaction, TransactionSuggestion},
};

pub use crate::utils::is_valid_address;

/// Execution verdict for one suggested transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateVerdict {
    pub is_verified: bool,
    pub executable: bool,
    pub reason: Option<BlockReason>,
}

/// Case-insensitive membership in the five protocol contracts.
pub fn is_whitelisted(address: &str) -> bool {
    let address = address.trim();
    CONTRACT_WHITELIST
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(address))
}

/// `0x` followed by a non-empty, even number of hex digits.
pub fn is_valid_hex_data(data: &str) -> bool {
    let Some(digits) = data.strip_prefix("0x") else {
        return false;
    };
    !digits.is_empty() && digits.len() % 2 == 0 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Checks run in a fixed order and the first failure is the reported reason.
pub fn evaluate(to: &str, data: &str) -> GateVerdict {
    let is_verified = is_whitelisted(to);
    let reason = if !is_valid_address(to.trim()) {
        Some(BlockReason::InvalidAddress)
    } else if !is_verified {
        Some(BlockReason::UnverifiedContract)
    } else if !is_valid_hex_data(data.trim()) {
        Some(BlockReason::InvalidCalldata)
    } else {
        None
    };

    if let Some(reason) = reason {
        tracing::warn!("Suggested transaction to {} not executable. {}", to, reason);
    }

    GateVerdict {
        is_verified,
        executable: reason.is_none(),
        reason,
    }
}

pub fn review(suggestion: TransactionSuggestion) -> ParsedTransaction {
    let verdict = evaluate(&suggestion.to, &suggestion.data);
    tracing::debug!(
        "Reviewed {} suggestion for {} (executable: {})",
        suggestion.tx_type,
        suggestion.to,
        verdict.executable
    );
    ParsedTransaction {
        tx_type: suggestion.tx_type,
        to: suggestion.to,
        data: suggestion.data,
        description: suggestion.description,
        amount: suggestion.amount,
        is_verified: verdict.is_verified,
        executable: verdict.executable,
        block_reason: verdict.reason,
    }
}
