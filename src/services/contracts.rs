// Contract bindings for the AMOR protocol. Each binding lives in its own module
// so the generated call structs (`BalanceOfCall`, ...) do not collide.

pub mod erc20 {
    ethers::contract::abigen!(
        Erc20,
        r#"[
            function totalSupply() view returns (uint256)
            function balanceOf(address owner) view returns (uint256)
            function decimals() view returns (uint8)
            function approve(address spender, uint256 amount) returns (bool)
        ]"#
    );
}

pub mod staked_amor {
    ethers::contract::abigen!(
        StakedAmor,
        r#"[
            function totalSupply() view returns (uint256)
            function balanceOf(address owner) view returns (uint256)
            function delegates(address account) view returns (address)
            function getVotes(address account) view returns (uint256)
            function delegate(address delegatee)
        ]"#
    );
}

pub mod staking_manager {
    ethers::contract::abigen!(
        StakingManager,
        r#"[
            function WITHDRAWAL_DELAY() view returns (uint256)
            function totalStaked() view returns (uint256)
            function getActiveStake(address user) view returns (uint256)
            function requestCount(address user) view returns (uint256)
            function getRequest(address user, uint256 requestId) view returns (uint256 amount, uint256 requestedAt, uint256 unlockAt, bool claimed, bool cancelled)
            function paused() view returns (bool)
            function stake(uint256 amount)
            function requestUnstake(uint256 amount) returns (uint256 requestId)
            function cancelUnstake(uint256 requestId)
            function claimUnstake(uint256 requestId)
        ]"#
    );
}

pub mod governor {
    ethers::contract::abigen!(
        Governor,
        r#"[
            function proposalThreshold() view returns (uint256)
            function votingDelay() view returns (uint256)
            function votingPeriod() view returns (uint256)
            function quorumNumerator() view returns (uint256)
            function state(uint256 proposalId) view returns (uint8)
            function proposalVotes(uint256 proposalId) view returns (uint256 againstVotes, uint256 forVotes, uint256 abstainVotes)
            function hasVoted(uint256 proposalId, address account) view returns (bool)
            function proposalSnapshot(uint256 proposalId) view returns (uint256)
            function proposalDeadline(uint256 proposalId) view returns (uint256)
            function proposalProposer(uint256 proposalId) view returns (address)
            function castVote(uint256 proposalId, uint8 support) returns (uint256)
            function castVoteWithReason(uint256 proposalId, uint8 support, string reason) returns (uint256)
        ]"#
    );
}
