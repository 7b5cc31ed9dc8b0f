// src/api/mod.rs

pub mod chain;
pub mod guardian;
pub mod health;
pub mod transactions;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    llm::LlmClient, onchain::ChainRpc, session_store::SessionStore, ChainReader, GasOptimizer,
    Guardian,
};

// AppState definition
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chain: ChainReader,
    pub gas: GasOptimizer,
    pub guardian: Arc<Guardian>,
}

impl AppState {
    /// Wires the long-lived clients built in `main` into the services.
    pub fn new(
        config: Config,
        rpc: Arc<dyn ChainRpc>,
        llm: Arc<dyn LlmClient>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let chain = ChainReader::new(rpc.clone())?;
        let gas = GasOptimizer::new(rpc);
        let guardian = Guardian::new(llm, sessions, chain.clone(), gas.clone(), &config);
        Ok(Self {
            config,
            chain,
            gas,
            guardian: Arc::new(guardian),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::test_config;
    use crate::error::AppError;
    use crate::services::llm::{ChatMessage, LlmResponse, ToolDefinition};
    use crate::services::onchain::testing::StubRpc;
    use crate::services::session_store::InMemorySessionStore;
    use async_trait::async_trait;
    use futures_util::stream::{self, BoxStream};

    /// Answers every completion with the same text.
    pub struct EchoLlm {
        pub reply: Option<String>,
    }

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<LlmResponse> {
            match &self.reply {
                Some(reply) => Ok(LlmResponse {
                    content: Some(reply.clone()),
                    tool_calls: Vec::new(),
                }),
                None => Err(AppError::ExternalAPI("LLM unavailable".to_string())),
            }
        }

        async fn stream_complete(
            &self,
            _messages: &[ChatMessage],
        ) -> Result<BoxStream<'static, Result<String>>> {
            match &self.reply {
                Some(reply) => Ok(Box::pin(stream::iter(vec![Ok(reply.clone())]))),
                None => Err(AppError::ExternalAPI("LLM unavailable".to_string())),
            }
        }
    }

    pub fn state_with(rpc: StubRpc, reply: Option<&str>) -> AppState {
        AppState::new(
            test_config(),
            Arc::new(rpc),
            Arc::new(EchoLlm {
                reply: reply.map(str::to_string),
            }),
            Arc::new(InMemorySessionStore::new()),
        )
        .expect("state")
    }
}
