// src/models/mod.rs
pub mod chain;
pub mod guardian;
pub mod transaction;

// Re-export commonly used types so other modules can use `crate::models::X`
pub use chain::{
    ChainStats, GasPriceInfo, ProposalDetails, SimulationResult, TokenPrice, UnstakeRequest,
    UserChainData, VotingPowerAnalysis, VotingStatus,
};
pub use guardian::{
    ChatSession, GuardianChatResponse, GuardianMessage, Role, StreamChunk, WalletContext,
};
pub use transaction::{
    BlockReason, BuildTransactionRequest, MultiStepTransaction, ParsedTransaction,
    TransactionData, TransactionPlan, TransactionSuggestion, TransactionType,
};
