// Utility helpers shared by the chain reader, builder and safety gate

use ethers::types::{Address, U256};
use ethers::utils::{format_units, parse_ether, to_checksum};
use std::str::FromStr;

use crate::{
    constants::TOKEN_DECIMALS,
    error::{AppError, Result},
};

/// Strict address check: `0x` + 40 hex chars; mixed case must carry a valid
/// EIP-55 checksum.
pub fn is_valid_address(value: &str) -> bool {
    let Some(hex_part) = value.strip_prefix("0x") else {
        return false;
    };
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    match Address::from_str(value) {
        Ok(address) => to_checksum(&address, None) == value,
        Err(_) => false,
    }
}

pub fn parse_address(value: &str) -> Result<Address> {
    let trimmed = value.trim();
    if !is_valid_address(trimmed) {
        return Err(AppError::InvalidAddress(trimmed.to_string()));
    }
    Address::from_str(trimmed).map_err(|_| AppError::InvalidAddress(trimmed.to_string()))
}

/// Parses a decimal token amount ("100", "0.5") into 18-decimal base units.
pub fn parse_token_amount(value: &str) -> Result<U256> {
    let trimmed = value.trim();
    let well_formed = !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed.chars().all(|c| c.is_ascii_digit() || c == '.')
        && trimmed.matches('.').count() <= 1;
    if !well_formed {
        return Err(AppError::InvalidAmount(value.to_string()));
    }
    parse_ether(trimmed).map_err(|e| AppError::InvalidAmount(format!("{}: {}", value, e)))
}

pub fn parse_u256_dec(value: &str) -> Result<U256> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "Expected a decimal integer, got {:?}",
            value
        )));
    }
    U256::from_dec_str(trimmed).map_err(|e| AppError::BadRequest(format!("{}: {}", value, e)))
}

/// Formats 18-decimal base units the way wallets display them ("100.0", "0.25").
pub fn format_token_amount(value: U256) -> String {
    match format_units(value, TOKEN_DECIMALS) {
        Ok(text) => trim_fraction(&text),
        Err(_) => "0".to_string(),
    }
}

pub fn format_gwei(value: U256) -> String {
    match format_units(value, "gwei") {
        Ok(text) => trim_fraction(&text),
        Err(_) => "0".to_string(),
    }
}

fn trim_fraction(text: &str) -> String {
    match text.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{}.0", int)
            } else {
                format!("{}.{}", int, frac)
            }
        }
        None => format!("{}.0", text),
    }
}

/// Saturating U256 -> u64 for block numbers, delays and counters.
pub fn u256_to_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CONTRACT_AMOR;

    #[test]
    fn checksummed_whitelist_address_is_valid() {
        assert!(is_valid_address(CONTRACT_AMOR));
        assert!(is_valid_address(&CONTRACT_AMOR.to_lowercase()));
    }

    #[test]
    fn bad_checksum_is_rejected() {
        // Same address with one letter's case flipped
        assert!(!is_valid_address("0x7c833fe6b80465F956E2939aD6f03FFaC08f058e"));
    }

    #[test]
    fn wrong_length_or_prefix_is_rejected() {
        assert!(!is_valid_address("0x1234"));
        assert!(!is_valid_address("7C833fe6b80465F956E2939aD6f03FFaC08f058e"));
        assert!(!is_valid_address("0xZZ833fe6b80465f956e2939ad6f03ffac08f058e"));
    }

    #[test]
    fn parse_token_amount_scales_by_1e18() {
        let amount = parse_token_amount("100").expect("amount");
        assert_eq!(amount, U256::from(100u64) * U256::exp10(18));
        let half = parse_token_amount("0.5").expect("amount");
        assert_eq!(half, U256::exp10(17) * U256::from(5u64));
    }

    #[test]
    fn parse_token_amount_rejects_malformed() {
        assert!(parse_token_amount("").is_err());
        assert!(parse_token_amount("-1").is_err());
        assert!(parse_token_amount("1.2.3").is_err());
        assert!(parse_token_amount("ten").is_err());
    }

    #[test]
    fn format_token_amount_matches_wallet_style() {
        assert_eq!(format_token_amount(U256::exp10(18) * U256::from(100u64)), "100.0");
        assert_eq!(format_token_amount(U256::exp10(17) * U256::from(25u64)), "2.5");
        assert_eq!(format_token_amount(U256::zero()), "0.0");
    }

    #[test]
    fn truncate_chars_appends_ellipsis() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
