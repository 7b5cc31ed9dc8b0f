use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256,
};
use std::str::FromStr;
use std::sync::Arc;

use super::contracts::{
    erc20::Erc20, governor::Governor, staked_amor::StakedAmor, staking_manager::StakingManager,
};
use crate::{
    config::Config,
    constants::{CONTRACT_AMOR, CONTRACT_GOVERNOR, CONTRACT_STAKING_MANAGER, CONTRACT_ST_AMOR},
    error::{AppError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawUnstakeRequest {
    pub amount: U256,
    pub requested_at: U256,
    pub unlock_at: U256,
    pub claimed: bool,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProposalVotes {
    pub against: U256,
    pub for_votes: U256,
    pub abstain: U256,
}

/// The JSON-RPC surface the service reads from. Every method is a single
/// contract call or provider request; failures come back as
/// `AppError::BlockchainRPC` and are never retried here.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn token_total_supply(&self, token: Address) -> Result<U256>;
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;
    async fn votes(&self, account: Address) -> Result<U256>;
    async fn delegates(&self, account: Address) -> Result<Address>;

    async fn withdrawal_delay(&self) -> Result<U256>;
    async fn staking_paused(&self) -> Result<bool>;
    async fn active_stake(&self, user: Address) -> Result<U256>;
    async fn unstake_request_count(&self, user: Address) -> Result<U256>;
    async fn unstake_request(&self, user: Address, request_id: U256) -> Result<RawUnstakeRequest>;

    async fn proposal_threshold(&self) -> Result<U256>;
    async fn voting_delay(&self) -> Result<U256>;
    async fn voting_period(&self) -> Result<U256>;
    async fn quorum_numerator(&self) -> Result<U256>;
    async fn proposal_state(&self, proposal_id: U256) -> Result<u8>;
    async fn proposal_votes(&self, proposal_id: U256) -> Result<ProposalVotes>;
    async fn proposal_proposer(&self, proposal_id: U256) -> Result<Address>;
    async fn proposal_snapshot(&self, proposal_id: U256) -> Result<U256>;
    async fn proposal_deadline(&self, proposal_id: U256) -> Result<U256>;
    async fn has_voted(&self, proposal_id: U256, account: Address) -> Result<bool>;

    async fn gas_price(&self) -> Result<U256>;
    async fn estimate_gas(&self, from: Address, to: Address, data: Bytes) -> Result<U256>;
}

/// ethers-backed reader. Built once at startup and shared through `AppState`.
pub struct OnchainReader {
    provider: Arc<Provider<Http>>,
    amor: Erc20<Provider<Http>>,
    st_amor: StakedAmor<Provider<Http>>,
    staking_manager: StakingManager<Provider<Http>>,
    governor: Governor<Provider<Http>>,
}

impl OnchainReader {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| AppError::Internal(format!("Invalid RPC URL: {}", e)))?;
        let provider = Arc::new(provider);

        Ok(Self {
            amor: Erc20::new(contract_address(CONTRACT_AMOR)?, provider.clone()),
            st_amor: StakedAmor::new(contract_address(CONTRACT_ST_AMOR)?, provider.clone()),
            staking_manager: StakingManager::new(
                contract_address(CONTRACT_STAKING_MANAGER)?,
                provider.clone(),
            ),
            governor: Governor::new(contract_address(CONTRACT_GOVERNOR)?, provider.clone()),
            provider,
        })
    }

    fn erc20_at(&self, token: Address) -> Erc20<Provider<Http>> {
        if token == self.amor.address() {
            self.amor.clone()
        } else {
            Erc20::new(token, self.provider.clone())
        }
    }
}

fn contract_address(value: &str) -> Result<Address> {
    Address::from_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid contract address {}: {}", value, e)))
}

fn rpc_err(err: impl std::fmt::Display) -> AppError {
    AppError::BlockchainRPC(err.to_string())
}

#[async_trait]
impl ChainRpc for OnchainReader {
    async fn token_total_supply(&self, token: Address) -> Result<U256> {
        self.erc20_at(token)
            .total_supply()
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        self.erc20_at(token)
            .balance_of(owner)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn votes(&self, account: Address) -> Result<U256> {
        self.st_amor.get_votes(account).call().await.map_err(rpc_err)
    }

    async fn delegates(&self, account: Address) -> Result<Address> {
        self.st_amor.delegates(account).call().await.map_err(rpc_err)
    }

    async fn withdrawal_delay(&self) -> Result<U256> {
        self.staking_manager
            .withdrawal_delay()
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn staking_paused(&self) -> Result<bool> {
        self.staking_manager.paused().call().await.map_err(rpc_err)
    }

    async fn active_stake(&self, user: Address) -> Result<U256> {
        self.staking_manager
            .get_active_stake(user)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn unstake_request_count(&self, user: Address) -> Result<U256> {
        self.staking_manager
            .request_count(user)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn unstake_request(&self, user: Address, request_id: U256) -> Result<RawUnstakeRequest> {
        let (amount, requested_at, unlock_at, claimed, cancelled) = self
            .staking_manager
            .get_request(user, request_id)
            .call()
            .await
            .map_err(rpc_err)?;
        Ok(RawUnstakeRequest {
            amount,
            requested_at,
            unlock_at,
            claimed,
            cancelled,
        })
    }

    async fn proposal_threshold(&self) -> Result<U256> {
        self.governor
            .proposal_threshold()
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn voting_delay(&self) -> Result<U256> {
        self.governor.voting_delay().call().await.map_err(rpc_err)
    }

    async fn voting_period(&self) -> Result<U256> {
        self.governor.voting_period().call().await.map_err(rpc_err)
    }

    async fn quorum_numerator(&self) -> Result<U256> {
        self.governor
            .quorum_numerator()
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn proposal_state(&self, proposal_id: U256) -> Result<u8> {
        self.governor
            .state(proposal_id)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn proposal_votes(&self, proposal_id: U256) -> Result<ProposalVotes> {
        let (against, for_votes, abstain) = self
            .governor
            .proposal_votes(proposal_id)
            .call()
            .await
            .map_err(rpc_err)?;
        Ok(ProposalVotes {
            against,
            for_votes,
            abstain,
        })
    }

    async fn proposal_proposer(&self, proposal_id: U256) -> Result<Address> {
        self.governor
            .proposal_proposer(proposal_id)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn proposal_snapshot(&self, proposal_id: U256) -> Result<U256> {
        self.governor
            .proposal_snapshot(proposal_id)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn proposal_deadline(&self, proposal_id: U256) -> Result<U256> {
        self.governor
            .proposal_deadline(proposal_id)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn has_voted(&self, proposal_id: U256, account: Address) -> Result<bool> {
        self.governor
            .has_voted(proposal_id, account)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn gas_price(&self) -> Result<U256> {
        self.provider.get_gas_price().await.map_err(rpc_err)
    }

    async fn estimate_gas(&self, from: Address, to: Address, data: Bytes) -> Result<U256> {
        let tx: TypedTransaction = TransactionRequest::new().from(from).to(to).data(data).into();
        self.provider.estimate_gas(&tx, None).await.map_err(rpc_err)
    }
}
