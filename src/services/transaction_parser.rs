use regex::Regex;
use std::sync::LazyLock;

use super::safety_gate;
use crate::{
    constants::{CONTRACT_AMOR, CONTRACT_GOVERNOR, CONTRACT_STAKING_MANAGER, CONTRACT_ST_AMOR},
    models::{ParsedTransaction, TransactionSuggestion, TransactionType},
};

// Lines that open a new transaction block: "--- Step 2 of 2 ---",
// "**Step 1:**", "Transaction Ready:".
static BLOCK_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s\-#*>]*(?:step\s+\d+\b|transaction\s+ready\b)")
        .expect("block marker regex")
});

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:stamor|amor)\b").expect("amount regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Address,
    Data,
    Description,
}

// Label patterns per field; the first label that matches wins.
const FIELD_PATTERNS: &[(Field, &str)] = &[
    (
        Field::Address,
        r"(?im)^[\s\-*]*(?:contract(?:\s+address)?|to)\s*\**\s*:\s*\**\s*`?([^\s`*]+)",
    ),
    (
        Field::Data,
        r"(?im)^[\s\-*]*(?:encoded\s+data|calldata|data)\s*\**\s*:\s*\**\s*`?([^\s`*]+)",
    ),
    (
        Field::Description,
        r"(?im)^[\s\-*]*description\s*\**\s*:\s*\**\s*(.+?)\s*$",
    ),
];

static FIELD_REGEXES: LazyLock<Vec<(Field, Regex)>> = LazyLock::new(|| {
    FIELD_PATTERNS
        .iter()
        .map(|(field, pattern)| (*field, Regex::new(pattern).expect("field regex")))
        .collect()
});

// Checked in order; "unstake" must precede "stake".
const KEYWORD_TYPES: &[(&str, TransactionType)] = &[
    ("unstake", TransactionType::Unstake),
    ("claim", TransactionType::Claim),
    ("delegate", TransactionType::Delegate),
    ("vote", TransactionType::Vote),
    ("approve", TransactionType::Approve),
    ("stake", TransactionType::Stake),
];

const CONTRACT_TYPES: &[(&str, TransactionType)] = &[
    (CONTRACT_AMOR, TransactionType::Approve),
    (CONTRACT_STAKING_MANAGER, TransactionType::Stake),
    (CONTRACT_ST_AMOR, TransactionType::Delegate),
    (CONTRACT_GOVERNOR, TransactionType::Vote),
];

/// Splits assistant text at block markers. Text without markers is one block;
/// text ahead of the first marker is kept as its own block.
pub fn split_blocks(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = BLOCK_MARKER.find_iter(text).map(|m| m.start()).collect();
    if starts.is_empty() {
        return vec![text];
    }

    let mut blocks = Vec::with_capacity(starts.len() + 1);
    if starts[0] > 0 {
        blocks.push(&text[..starts[0]]);
    }
    for (index, start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(text.len());
        blocks.push(&text[*start..end]);
    }
    blocks
}

fn extract_field(block: &str, wanted: Field) -> Option<String> {
    FIELD_REGEXES
        .iter()
        .filter(|(field, _)| *field == wanted)
        .find_map(|(_, regex)| regex.captures(block))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn extract_amount(text: &str) -> Option<String> {
    AMOUNT
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

// Whole words only, so "unstaked" or "staking" do not count as keywords.
fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == word)
}

pub fn infer_type(description: &str, to: &str) -> TransactionType {
    let lowered = description.to_lowercase();
    if let Some((_, tx_type)) = KEYWORD_TYPES
        .iter()
        .find(|(keyword, _)| has_word(&lowered, keyword))
    {
        return *tx_type;
    }
    CONTRACT_TYPES
        .iter()
        .find(|(address, _)| address.eq_ignore_ascii_case(to.trim()))
        .map(|(_, tx_type)| *tx_type)
        .unwrap_or(TransactionType::Approve)
}

/// A block without both a target and calldata yields nothing.
pub fn parse_block(block: &str) -> Option<TransactionSuggestion> {
    let to = extract_field(block, Field::Address)?;
    let data = extract_field(block, Field::Data)?;
    let description = extract_field(block, Field::Description).unwrap_or_default();
    let amount = extract_amount(&description).or_else(|| extract_amount(block));

    Some(TransactionSuggestion {
        tx_type: infer_type(&description, &to),
        to,
        data,
        description,
        amount,
    })
}

pub fn parse_transactions(text: &str) -> Vec<TransactionSuggestion> {
    split_blocks(text)
        .into_iter()
        .filter_map(parse_block)
        .collect()
}

/// Parses and runs every suggestion through the safety gate.
pub fn extract_transactions(text: &str) -> Vec<ParsedTransaction> {
    parse_transactions(text)
        .into_iter()
        .map(safety_gate::review)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockReason;
    use crate::services::transaction_builder::{
        build_cancel_unstake_transaction, build_claim_unstake_transaction,
        build_stake_transaction, build_vote_transaction, format_multi_step_transaction_for_response,
        format_transaction_for_response,
    };

    const STEP_BLOCK: &str = "--- Step 1 ---\nContract: 0x7C833fe6b80465F956E2939aD6f03FFaC08f058e\nEncoded Data: 0xabcdef12\nDescription: Approve 100 AMOR";

    #[test]
    fn whitelisted_step_block_is_verified_approve() {
        let parsed = extract_transactions(STEP_BLOCK);
        assert_eq!(parsed.len(), 1);
        let tx = &parsed[0];
        assert!(tx.is_verified);
        assert!(tx.executable);
        assert_eq!(tx.tx_type, TransactionType::Approve);
        assert_eq!(tx.data, "0xabcdef12");
        assert_eq!(tx.amount.as_deref(), Some("100"));
    }

    #[test]
    fn unknown_contract_block_is_blocked() {
        let text = STEP_BLOCK.replace(
            "0x7C833fe6b80465F956E2939aD6f03FFaC08f058e",
            "0x0000000000000000000000000000000000000001",
        );
        let parsed = extract_transactions(&text);
        assert_eq!(parsed.len(), 1);
        assert!(!parsed[0].is_verified);
        assert!(!parsed[0].executable);
        assert_eq!(parsed[0].block_reason, Some(BlockReason::UnverifiedContract));
    }

    #[test]
    fn blocks_missing_data_are_dropped() {
        let text = "Step 1\nContract: 0x7C833fe6b80465F956E2939aD6f03FFaC08f058e\nDescription: Approve";
        assert!(parse_transactions(text).is_empty());
        assert!(parse_transactions("Staking gives you stAMOR and voting power.").is_empty());
    }

    #[test]
    fn builder_multi_step_output_round_trips_through_parser() {
        let plan = build_stake_transaction("250").expect("stake plan");
        let text = format_multi_step_transaction_for_response(&plan);
        let parsed = extract_transactions(&text);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].tx_type, TransactionType::Approve);
        assert_eq!(parsed[0].data, plan.steps[0].data);
        assert_eq!(parsed[1].tx_type, TransactionType::Stake);
        assert_eq!(parsed[1].to, CONTRACT_STAKING_MANAGER);
        assert_eq!(parsed[1].amount.as_deref(), Some("250"));
        assert!(parsed.iter().all(|tx| tx.executable));
    }

    #[test]
    fn transaction_ready_block_is_parsed() {
        let tx = build_vote_transaction("7", 1, None).expect("vote");
        let text = format!(
            "Here is your vote.\n\n{}",
            format_transaction_for_response(&tx)
        );
        let parsed = extract_transactions(&text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].tx_type, TransactionType::Vote);
        assert_eq!(parsed[0].to, CONTRACT_GOVERNOR);
    }

    #[test]
    fn claim_output_parses_as_claim() {
        let tx = build_claim_unstake_transaction(1);
        let parsed = extract_transactions(&format_transaction_for_response(&tx));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].tx_type, TransactionType::Claim);
        assert_eq!(parsed[0].to, CONTRACT_STAKING_MANAGER);
        assert_eq!(parsed[0].data, tx.data);
        assert!(parsed[0].executable);
    }

    #[test]
    fn cancel_output_parses_as_unstake() {
        let tx = build_cancel_unstake_transaction(4);
        let parsed = extract_transactions(&format_transaction_for_response(&tx));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].tx_type, TransactionType::Unstake);
        assert_eq!(parsed[0].data, tx.data);
        assert!(parsed[0].executable);
    }

    #[test]
    fn inflected_words_are_not_keywords() {
        assert_eq!(
            infer_type("Claim unstaked AMOR from request #2", ""),
            TransactionType::Claim
        );
        assert_eq!(
            infer_type("Approve 5 AMOR for staking", CONTRACT_STAKING_MANAGER),
            TransactionType::Approve
        );
        assert_eq!(
            infer_type("Self-delegate your votes", ""),
            TransactionType::Delegate
        );
    }

    #[test]
    fn markdown_labels_are_accepted() {
        let text = "**Step 1:**\n- **To:** `0x05fda76aa1e88e83EbB5f155Cd43BE2eb6718eAD`\n- **Calldata:** `0x5c19a95c`\n";
        let parsed = parse_transactions(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].to, CONTRACT_ST_AMOR);
        assert_eq!(parsed[0].data, "0x5c19a95c");
        assert_eq!(parsed[0].tx_type, TransactionType::Delegate);
    }

    #[test]
    fn type_inference_prefers_keywords_then_contract() {
        assert_eq!(infer_type("Unstake 5 stAMOR", CONTRACT_AMOR), TransactionType::Unstake);
        assert_eq!(infer_type("Claim request #1", ""), TransactionType::Claim);
        assert_eq!(infer_type("", CONTRACT_GOVERNOR), TransactionType::Vote);
        assert_eq!(
            infer_type("", &CONTRACT_STAKING_MANAGER.to_lowercase()),
            TransactionType::Stake
        );
        assert_eq!(infer_type("mystery", "0x01"), TransactionType::Approve);
    }

    #[test]
    fn text_without_markers_is_single_block() {
        assert_eq!(split_blocks("no markers here").len(), 1);
        let blocks = split_blocks("intro\nStep 1\na\nStep 2\nb");
        assert_eq!(blocks.len(), 3);
        assert!(blocks[1].starts_with("Step 1"));
    }
}
