/// Application constants

// Network (Neo X mainnet)
pub const NEO_X_CHAIN_ID: u64 = 47763;
pub const NEO_X_RPC_URL: &str = "https://mainnet-1.rpc.banelabs.org";

// Protocol contracts
pub const CONTRACT_AMOR: &str = "0x7C833fe6b80465F956E2939aD6f03FFaC08f058e";
pub const CONTRACT_ST_AMOR: &str = "0x05fda76aa1e88e83EbB5f155Cd43BE2eb6718eAD";
pub const CONTRACT_STAKING_MANAGER: &str = "0x58390f0883b176c6EbcDddE9527321F4b4E5c565";
pub const CONTRACT_TIMELOCK: &str = "0xae73C3390a145154Ab94935FB06f2Fc31A04E7d6";
pub const CONTRACT_GOVERNOR: &str = "0xaf596B738B57B6Ac939f453Ce2201349F3105146";

/// Only these targets may be offered for signing from chat output.
pub const CONTRACT_WHITELIST: [&str; 5] = [
    CONTRACT_AMOR,
    CONTRACT_ST_AMOR,
    CONTRACT_STAKING_MANAGER,
    CONTRACT_TIMELOCK,
    CONTRACT_GOVERNOR,
];

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// Token configuration
pub const TOKEN_DECIMALS: u32 = 18;

// Staking defaults
pub const DEFAULT_WITHDRAWAL_DELAY_SECS: u64 = 604_800; // 7 days

// Governor proposal states, indexed by the on-chain enum value
pub const PROPOSAL_STATE_NAMES: [&str; 8] = [
    "Pending",
    "Active",
    "Canceled",
    "Defeated",
    "Succeeded",
    "Queued",
    "Expired",
    "Executed",
];

pub const VOTE_SUPPORT_LABELS: [&str; 3] = ["Against", "For", "Abstain"];

// Guardian configuration
pub const GUARDIAN_HISTORY_WINDOW: usize = 10;
pub const GUARDIAN_MAX_TOOL_ROUNDS: usize = 6;
pub const GUARDIAN_TOOL_PLACEHOLDER: &str = "_Checking on-chain data..._\n\n";
pub const GUARDIAN_TOOL_LIMIT_NOTE: &str =
    "\n\n_(Reached the tool-call limit for this message; some data may be incomplete.)_";
pub const GUARDIAN_EMPTY_REPLY: &str = "I apologize, but I could not generate a response.";
pub const GUARDIAN_APOLOGY: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

// LLM defaults
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
pub const LLM_REQUEST_TIMEOUT_SECS: u64 = 60;

// Simulation
pub const SIMULATION_ERROR_MAX_CHARS: usize = 200;

// API version
pub const API_VERSION: &str = "v1";

// SSE
pub const SSE_KEEP_ALIVE_SECS: u64 = 15;
