// All service modules
pub mod chain_reader;
pub mod contracts;
pub mod gas_optimizer;
pub mod guardian;
pub mod llm;
pub mod onchain;
pub mod safety_gate;
pub mod session_store;
pub mod transaction_builder;
pub mod transaction_parser;

// Re-export for convenience
pub use chain_reader::ChainReader;
pub use gas_optimizer::GasOptimizer;
pub use guardian::Guardian;
