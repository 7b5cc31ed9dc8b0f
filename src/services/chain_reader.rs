use chrono::{DateTime, SecondsFormat, Utc};
use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use std::str::FromStr;
use std::sync::Arc;

use super::onchain::{ChainRpc, ProposalVotes, RawUnstakeRequest};
use crate::{
    constants::{
        CONTRACT_AMOR, CONTRACT_ST_AMOR, DEFAULT_WITHDRAWAL_DELAY_SECS, ZERO_ADDRESS,
    },
    error::{AppError, Result},
    models::chain::proposal_state_name,
    models::{
        ChainStats, ProposalDetails, TokenPrice, UnstakeRequest, UserChainData,
        VotingPowerAnalysis, VotingStatus,
    },
    utils::{format_token_amount, is_valid_address, parse_u256_dec, u256_to_u64},
};

/// Outcome of one contract read. Kept distinct from the coalesced value so a
/// failed read never looks like a genuine zero until the snapshot boundary.
type FieldRead<T> = std::result::Result<T, String>;

fn tagged<T>(field: &'static str, outcome: Result<T>) -> FieldRead<T> {
    outcome.map_err(|err| {
        tracing::debug!(field, error = %err, "chain read failed, using default");
        err.to_string()
    })
}

fn amount_or_zero(read: &FieldRead<U256>) -> String {
    match read {
        Ok(value) => format_token_amount(*value),
        Err(_) => "0".to_string(),
    }
}

fn number_or(read: &FieldRead<U256>, default: u64) -> u64 {
    match read {
        Ok(value) => u256_to_u64(*value),
        Err(_) => default,
    }
}

fn address_or_zero(read: &FieldRead<Address>) -> String {
    match read {
        Ok(address) => to_checksum(address, None),
        Err(_) => ZERO_ADDRESS.to_string(),
    }
}

struct StatsReading {
    total_staked: FieldRead<U256>,
    proposal_threshold: FieldRead<U256>,
    voting_delay: FieldRead<U256>,
    voting_period: FieldRead<U256>,
    withdrawal_delay: FieldRead<U256>,
    quorum_numerator: FieldRead<U256>,
    paused: FieldRead<bool>,
}

impl StatsReading {
    fn into_stats(self) -> ChainStats {
        ChainStats {
            total_staked_amor: amount_or_zero(&self.total_staked),
            proposal_threshold: amount_or_zero(&self.proposal_threshold),
            voting_delay: number_or(&self.voting_delay, 0),
            voting_period: number_or(&self.voting_period, 0),
            withdrawal_delay: number_or(&self.withdrawal_delay, DEFAULT_WITHDRAWAL_DELAY_SECS),
            quorum_numerator: number_or(&self.quorum_numerator, 0),
            staking_paused: self.paused.unwrap_or(false),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

struct WalletReading {
    amor_balance: FieldRead<U256>,
    st_amor_balance: FieldRead<U256>,
    votes: FieldRead<U256>,
    active_stake: FieldRead<U256>,
    delegate: FieldRead<Address>,
}

struct ProposalReading {
    state: FieldRead<u8>,
    votes: FieldRead<ProposalVotes>,
    proposer: FieldRead<Address>,
    snapshot: FieldRead<U256>,
    deadline: FieldRead<U256>,
}

/// Best-effort snapshots of protocol and wallet state.
#[derive(Clone)]
pub struct ChainReader {
    rpc: Arc<dyn ChainRpc>,
    amor: Address,
    st_amor: Address,
}

impl ChainReader {
    pub fn new(rpc: Arc<dyn ChainRpc>) -> Result<Self> {
        Ok(Self {
            rpc,
            amor: protocol_address(CONTRACT_AMOR)?,
            st_amor: protocol_address(CONTRACT_ST_AMOR)?,
        })
    }

    pub async fn get_chain_stats(&self) -> ChainStats {
        let rpc = &self.rpc;
        let (
            total_staked,
            proposal_threshold,
            voting_delay,
            voting_period,
            withdrawal_delay,
            quorum_numerator,
            paused,
        ) = tokio::join!(
            rpc.token_total_supply(self.st_amor),
            rpc.proposal_threshold(),
            rpc.voting_delay(),
            rpc.voting_period(),
            rpc.withdrawal_delay(),
            rpc.quorum_numerator(),
            rpc.staking_paused(),
        );

        StatsReading {
            total_staked: tagged("totalStakedAmor", total_staked),
            proposal_threshold: tagged("proposalThreshold", proposal_threshold),
            voting_delay: tagged("votingDelay", voting_delay),
            voting_period: tagged("votingPeriod", voting_period),
            withdrawal_delay: tagged("withdrawalDelay", withdrawal_delay),
            quorum_numerator: tagged("quorumNumerator", quorum_numerator),
            paused: tagged("stakingPaused", paused),
        }
        .into_stats()
    }

    pub async fn get_user_chain_data(&self, address: &str) -> UserChainData {
        let Some(user) = checked_address(address) else {
            tracing::warn!("User chain data requested for invalid address {}", address);
            return UserChainData::empty(address);
        };

        let reading = self.read_wallet(user).await;
        let unstake_requests = self.read_unstake_requests(user).await;

        UserChainData {
            address: address.to_string(),
            amor_balance: amount_or_zero(&reading.amor_balance),
            st_amor_balance: amount_or_zero(&reading.st_amor_balance),
            voting_power: amount_or_zero(&reading.votes),
            active_stake: amount_or_zero(&reading.active_stake),
            delegate: address_or_zero(&reading.delegate),
            unstake_requests,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    async fn read_wallet(&self, user: Address) -> WalletReading {
        let rpc = &self.rpc;
        let (amor_balance, st_amor_balance, votes, active_stake, delegate) = tokio::join!(
            rpc.token_balance(self.amor, user),
            rpc.token_balance(self.st_amor, user),
            rpc.votes(user),
            rpc.active_stake(user),
            rpc.delegates(user),
        );

        WalletReading {
            amor_balance: tagged("amorBalance", amor_balance),
            st_amor_balance: tagged("stAmorBalance", st_amor_balance),
            votes: tagged("votingPower", votes),
            active_stake: tagged("activeStake", active_stake),
            delegate: tagged("delegate", delegate),
        }
    }

    // Reads requests 0..requestCount in order and stops at the first failure.
    async fn read_unstake_requests(&self, user: Address) -> Vec<UnstakeRequest> {
        let count = match tagged("requestCount", self.rpc.unstake_request_count(user).await) {
            Ok(count) => u256_to_u64(count),
            Err(_) => return Vec::new(),
        };

        let mut requests = Vec::new();
        for id in 0..count {
            let raw: RawUnstakeRequest =
                match tagged("unstakeRequest", self.rpc.unstake_request(user, U256::from(id)).await)
                {
                    Ok(raw) => raw,
                    Err(_) => break,
                };
            requests.push(UnstakeRequest {
                id,
                amount: format_token_amount(raw.amount),
                requested_at: u256_to_u64(raw.requested_at),
                unlock_at: u256_to_u64(raw.unlock_at),
                claimed: raw.claimed,
                cancelled: raw.cancelled,
            });
        }
        requests
    }

    /// Fails only when the proposal id is not a decimal integer.
    pub async fn get_proposal_details(&self, proposal_id: &str) -> Result<ProposalDetails> {
        let id = parse_u256_dec(proposal_id)?;
        let rpc = &self.rpc;
        let (state, votes, proposer, snapshot, deadline) = tokio::join!(
            rpc.proposal_state(id),
            rpc.proposal_votes(id),
            rpc.proposal_proposer(id),
            rpc.proposal_snapshot(id),
            rpc.proposal_deadline(id),
        );
        let reading = ProposalReading {
            state: tagged("state", state),
            votes: tagged("proposalVotes", votes),
            proposer: tagged("proposer", proposer),
            snapshot: tagged("snapshotBlock", snapshot),
            deadline: tagged("deadlineBlock", deadline),
        };

        let mut details = ProposalDetails::unknown(proposal_id);
        if let Ok(state) = reading.state {
            details.state = state;
            details.state_name = proposal_state_name(state).to_string();
        }
        if let Ok(votes) = reading.votes {
            details.for_votes = format_token_amount(votes.for_votes);
            details.against_votes = format_token_amount(votes.against);
            details.abstain_votes = format_token_amount(votes.abstain);
        }
        details.proposer = address_or_zero(&reading.proposer);
        details.snapshot_block = number_or(&reading.snapshot, 0);
        details.deadline_block = number_or(&reading.deadline, 0);
        Ok(details)
    }

    pub async fn check_has_voted(&self, proposal_id: &str, address: &str) -> Result<VotingStatus> {
        let id = parse_u256_dec(proposal_id)?;
        let mut status = VotingStatus {
            proposal_id: proposal_id.to_string(),
            address: address.to_string(),
            has_voted: false,
            timestamp: Utc::now().timestamp_millis(),
        };
        if let Some(account) = checked_address(address) {
            status.has_voted = tagged("hasVoted", self.rpc.has_voted(id, account).await)
                .unwrap_or(false);
        }
        Ok(status)
    }

    pub async fn analyze_voting_power(&self, address: &str) -> VotingPowerAnalysis {
        let mut analysis = VotingPowerAnalysis {
            address: address.to_string(),
            st_amor_balance: "0".to_string(),
            voting_power: "0".to_string(),
            delegate: ZERO_ADDRESS.to_string(),
            is_self_delegated: false,
            voting_power_active: false,
            recommendations: Vec::new(),
            timestamp: Utc::now().timestamp_millis(),
        };
        let Some(user) = checked_address(address) else {
            analysis
                .recommendations
                .push("Invalid address provided.".to_string());
            return analysis;
        };

        let rpc = &self.rpc;
        let (balance, votes, delegate) = tokio::join!(
            rpc.token_balance(self.st_amor, user),
            rpc.votes(user),
            rpc.delegates(user),
        );
        let balance = tagged("stAmorBalance", balance);
        let votes = tagged("votingPower", votes);
        let delegate = tagged("delegate", delegate);

        let has_balance = matches!(balance, Ok(value) if !value.is_zero());
        let has_votes = matches!(votes, Ok(value) if !value.is_zero());
        let delegate_address = delegate.clone().unwrap_or_default();

        analysis.st_amor_balance = amount_or_zero(&balance);
        analysis.voting_power = amount_or_zero(&votes);
        analysis.delegate = address_or_zero(&delegate);
        analysis.is_self_delegated = delegate_address == user;
        analysis.voting_power_active = has_votes;
        analysis.recommendations = voting_recommendations(
            has_balance,
            delegate_address,
            analysis.is_self_delegated,
            has_votes,
            &analysis.st_amor_balance,
            &analysis.delegate,
        );
        analysis
    }
}

fn voting_recommendations(
    has_balance: bool,
    delegate: Address,
    is_self_delegated: bool,
    has_votes: bool,
    st_amor_balance: &str,
    delegate_display: &str,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if !has_balance {
        recommendations.push(
            "You have no stAMOR tokens. Stake AMOR to receive stAMOR and participate in governance."
                .to_string(),
        );
    } else if delegate.is_zero() {
        recommendations.push(
            "Your voting power is not activated. Delegate to yourself (self-delegate) to activate your voting power."
                .to_string(),
        );
    } else if !is_self_delegated && !has_votes {
        recommendations.push(format!(
            "Your voting power is delegated to {}. To vote directly, self-delegate to activate your own voting power.",
            delegate_display
        ));
    } else if is_self_delegated && has_votes {
        recommendations
            .push("Your voting power is active and ready to vote on proposals.".to_string());
    }

    let balance: f64 = st_amor_balance.parse().unwrap_or(0.0);
    if has_balance && balance < 100.0 {
        recommendations.push(
            "Consider staking more AMOR to increase your voting power and influence in governance."
                .to_string(),
        );
    }
    recommendations
}

/// Indicative prices only; there is no market data feed behind this.
pub fn get_token_price(symbol: &str) -> TokenPrice {
    let upper = symbol.trim().to_uppercase();
    let (price, change) = match upper.as_str() {
        "AMOR" | "STAMOR" => ("0.0234", "+5.2"),
        "GAS" => ("4.87", "-1.3"),
        "NEO" => ("12.45", "+2.1"),
        _ => ("0", "0"),
    };
    TokenPrice {
        symbol: upper,
        price_usd: price.to_string(),
        change_24h: change.to_string(),
        last_updated: Utc::now().timestamp_millis(),
    }
}

fn protocol_address(value: &str) -> Result<Address> {
    Address::from_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid contract address {}: {}", value, e)))
}

fn checked_address(value: &str) -> Option<Address> {
    let trimmed = value.trim();
    if !is_valid_address(trimmed) {
        return None;
    }
    Address::from_str(trimmed).ok()
}

// ==================== TEXT RENDERERS ====================
// Tool results handed back to the model.

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub fn format_chain_stats_for_ai(stats: &ChainStats) -> String {
    format!(
        "On-Chain Statistics:\n\
         - Total Staked AMOR: {} stAMOR\n\
         - Proposal Threshold: {} stAMOR required to create proposals\n\
         - Voting Delay: {} hours after proposal creation before voting starts\n\
         - Voting Period: {} days for voting on proposals\n\
         - Unstaking Withdrawal Delay: {} days cooldown after requesting unstake\n\
         - Quorum: {}% of total voting power required\n\
         - Staking Contract Paused: {}",
        stats.total_staked_amor,
        stats.proposal_threshold,
        stats.voting_delay / 3600,
        stats.voting_period / 86_400,
        stats.withdrawal_delay / 86_400,
        stats.quorum_numerator,
        yes_no(stats.staking_paused),
    )
}

pub fn format_user_data_for_ai(data: &UserChainData) -> String {
    let delegate = if data.delegate == ZERO_ADDRESS {
        "Not delegated"
    } else {
        data.delegate.as_str()
    };
    let mut output = format!(
        "User Wallet Data ({}):\n\
         - AMOR Balance: {} AMOR (available to stake)\n\
         - stAMOR Balance: {} stAMOR (staked tokens)\n\
         - Voting Power: {} votes\n\
         - Active Stake: {} stAMOR\n\
         - Delegate: {}",
        data.address,
        data.amor_balance,
        data.st_amor_balance,
        data.voting_power,
        data.active_stake,
        delegate,
    );

    let pending: Vec<&UnstakeRequest> = data
        .unstake_requests
        .iter()
        .filter(|r| r.is_pending())
        .collect();
    if pending.is_empty() {
        return output;
    }

    let total: f64 = pending
        .iter()
        .map(|r| r.amount.parse::<f64>().unwrap_or(0.0))
        .sum();
    output.push_str(&format!(
        "\n- Pending Unstake Requests: {} ({:.4} AMOR total)",
        pending.len(),
        total
    ));
    let now = Utc::now().timestamp();
    for request in pending {
        let unlock_at = i64::try_from(request.unlock_at).unwrap_or(i64::MAX);
        let status = if now >= unlock_at {
            "Ready to claim".to_string()
        } else {
            let unlock = DateTime::<Utc>::from_timestamp(unlock_at, 0)
                .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| request.unlock_at.to_string());
            format!("Unlocks: {}", unlock)
        };
        output.push_str(&format!(
            "\n  - Request #{}: {} AMOR, {}",
            request.id, request.amount, status
        ));
    }
    output
}

pub fn format_token_price_for_ai(price: &TokenPrice) -> String {
    let updated = DateTime::<Utc>::from_timestamp_millis(price.last_updated)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default();
    format!(
        "Token Price ({}):\n\
         - Price: ${} USD\n\
         - 24h Change: {}%\n\
         - Last Updated: {}\n\n\
         Note: Prices are indicative and may vary across exchanges.",
        price.symbol, price.price_usd, price.change_24h, updated
    )
}

fn share(part: f64, total: f64) -> String {
    if total > 0.0 {
        format!("{:.1}", part / total * 100.0)
    } else {
        "0".to_string()
    }
}

pub fn format_proposal_details_for_ai(details: &ProposalDetails) -> String {
    let for_votes: f64 = details.for_votes.parse().unwrap_or(0.0);
    let against: f64 = details.against_votes.parse().unwrap_or(0.0);
    let abstain: f64 = details.abstain_votes.parse().unwrap_or(0.0);
    let total = for_votes + against + abstain;

    format!(
        "Proposal Details (ID: {}):\n\
         - Status: {}\n\
         - Proposer: {}\n\
         - Snapshot Block: {}\n\
         - Deadline Block: {}\n\n\
         Vote Tally:\n\
         - For: {} votes ({}%)\n\
         - Against: {} votes ({}%)\n\
         - Abstain: {} votes ({}%)\n\
         - Total Votes: {:.4} votes",
        details.proposal_id,
        details.state_name,
        details.proposer,
        details.snapshot_block,
        details.deadline_block,
        details.for_votes,
        share(for_votes, total),
        details.against_votes,
        share(against, total),
        details.abstain_votes,
        share(abstain, total),
        total,
    )
}

pub fn format_voting_status_for_ai(status: &VotingStatus) -> String {
    format!(
        "Voting Status:\n- Proposal ID: {}\n- Address: {}\n- Has Voted: {}",
        status.proposal_id,
        status.address,
        yes_no(status.has_voted)
    )
}

pub fn format_voting_power_analysis_for_ai(analysis: &VotingPowerAnalysis) -> String {
    let delegate = if analysis.delegate == ZERO_ADDRESS {
        "Not set"
    } else {
        analysis.delegate.as_str()
    };
    let mut output = format!(
        "Voting Power Analysis ({}):\n\
         - stAMOR Balance: {} stAMOR\n\
         - Active Voting Power: {} votes\n\
         - Delegate: {}\n\
         - Self-Delegated: {}\n\
         - Voting Power Active: {}",
        analysis.address,
        analysis.st_amor_balance,
        analysis.voting_power,
        delegate,
        yes_no(analysis.is_self_delegated),
        yes_no(analysis.voting_power_active),
    );
    if !analysis.recommendations.is_empty() {
        output.push_str("\n\nRecommendations:");
        for (index, recommendation) in analysis.recommendations.iter().enumerate() {
            output.push_str(&format!("\n{}. {}", index + 1, recommendation));
        }
    }
    output
}
