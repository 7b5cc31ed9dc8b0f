use crate::{
    constants::{
        CONTRACT_AMOR, CONTRACT_GOVERNOR, CONTRACT_STAKING_MANAGER, CONTRACT_ST_AMOR,
        CONTRACT_TIMELOCK,
    },
    models::WalletContext,
};

/// System prompt with the wallet context (or a not-connected notice) appended.
pub fn system_prompt(chain_id: u64, wallet: Option<&WalletContext>) -> String {
    format!("{}{}", base_prompt(chain_id), wallet_context_message(wallet))
}

fn base_prompt(chain_id: u64) -> String {
    format!(
        "You are AMOR Guardian, an AI assistant for the AMOR Consciousness Nexus on Neo X blockchain.

Your purpose is to help users:
1. Understand staking AMOR tokens to receive stAMOR voting power
2. Navigate governance proposals and voting
3. Explain how delegation works to activate voting power
4. Provide information about the AMOR ecosystem

Key information:
- Network: Neo X Mainnet (Chain ID: {chain_id})
- AMOR Token: {amor}
- stAMOR Token: {st_amor}
- Staking Manager: {staking_manager}
- Governor: {governor}
- Timelock: {timelock}

Staking Flow:
1. Users stake AMOR tokens to receive stAMOR (1:1 ratio)
2. stAMOR represents voting power in governance
3. Users must delegate to themselves (self-delegate) to activate voting power
4. Unstaking has a 7-day cooldown period

Governance Flow:
1. Users with stAMOR can vote on proposals (For/Against/Abstain)
2. Proposals go through: Pending -> Active -> Succeeded/Defeated -> Queued -> Executed
3. Meeting the proposal threshold (stAMOR) is required to create proposals

Tools:
- Use the on-chain tools for live balances, protocol parameters, proposals and gas prices instead of guessing.
- Wallet tools default to the connected wallet. If no wallet is connected and the user has not given an address, explain that they need to connect a wallet instead of calling a wallet tool.
- When the user wants to act (stake, unstake, claim, delegate, vote), call the matching build tool and include its output verbatim so the interface can offer the transaction for signing. Never invent contract addresses or calldata.

Be helpful, concise, and technically accurate. You cannot execute transactions yourself: the user signs and sends them with their connected wallet.",
        chain_id = chain_id,
        amor = CONTRACT_AMOR,
        st_amor = CONTRACT_ST_AMOR,
        staking_manager = CONTRACT_STAKING_MANAGER,
        governor = CONTRACT_GOVERNOR,
        timelock = CONTRACT_TIMELOCK,
    )
}

fn wallet_context_message(wallet: Option<&WalletContext>) -> String {
    match wallet.filter(|w| !w.address.trim().is_empty()) {
        Some(wallet) => format!(
            "\n\nUser's wallet context:\n- Address: {}\n- AMOR Balance: {}\n- stAMOR Balance: {}\n- Voting Power: {}",
            wallet.address, wallet.amor_balance, wallet.st_amor_balance, wallet.voting_power
        ),
        None => "\n\nUser is not connected to a wallet.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_wallet_says_not_connected() {
        let prompt = system_prompt(47763, None);
        assert!(prompt.contains("Chain ID: 47763"));
        assert!(prompt.ends_with("User is not connected to a wallet."));
    }

    #[test]
    fn prompt_embeds_wallet_context() {
        let wallet = WalletContext {
            address: "0xabc".to_string(),
            amor_balance: "12.5".to_string(),
            st_amor_balance: "3".to_string(),
            voting_power: "3".to_string(),
        };
        let prompt = system_prompt(47763, Some(&wallet));
        assert!(prompt.contains("User's wallet context:\n- Address: 0xabc"));
        assert!(prompt.contains("- AMOR Balance: 12.5"));
    }

    #[test]
    fn blank_wallet_address_counts_as_disconnected() {
        let wallet = WalletContext::default();
        assert!(system_prompt(1, Some(&wallet)).contains("not connected"));
    }
}
