use serde::Deserialize;
use std::env;

use crate::constants::{
    DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MAX_TOKENS, DEFAULT_LLM_MODEL, DEFAULT_LLM_TEMPERATURE,
    GUARDIAN_HISTORY_WINDOW, GUARDIAN_MAX_TOOL_ROUNDS, NEO_X_CHAIN_ID, NEO_X_RPC_URL,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Blockchain
    pub rpc_url: String,
    pub chain_id: u64,

    // LLM
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,

    // Guardian
    pub guardian_max_tool_rounds: usize,
    pub guardian_history_window: usize,

    // Wallet connect
    pub walletconnect_project_id: String,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            rpc_url: env::var("NEO_X_RPC_URL").unwrap_or_else(|_| NEO_X_RPC_URL.to_string()),
            chain_id: env::var("NEO_X_CHAIN_ID")
                .unwrap_or_else(|_| NEO_X_CHAIN_ID.to_string())
                .parse()?,

            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            llm_max_tokens: env::var("LLM_MAX_TOKENS")
                .unwrap_or_else(|_| DEFAULT_LLM_MAX_TOKENS.to_string())
                .parse()?,
            llm_temperature: env::var("LLM_TEMPERATURE")
                .unwrap_or_else(|_| DEFAULT_LLM_TEMPERATURE.to_string())
                .parse()?,

            guardian_max_tool_rounds: env::var("GUARDIAN_MAX_TOOL_ROUNDS")
                .unwrap_or_else(|_| GUARDIAN_MAX_TOOL_ROUNDS.to_string())
                .parse()?,
            guardian_history_window: env::var("GUARDIAN_HISTORY_WINDOW")
                .unwrap_or_else(|_| GUARDIAN_HISTORY_WINDOW.to_string())
                .parse()?,

            walletconnect_project_id: env::var("WALLETCONNECT_PROJECT_ID").unwrap_or_default(),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc_url.trim().is_empty() {
            anyhow::bail!("NEO_X_RPC_URL is empty");
        }
        url::Url::parse(&self.rpc_url)
            .map_err(|e| anyhow::anyhow!("NEO_X_RPC_URL is not a valid URL: {}", e))?;
        url::Url::parse(&self.openai_base_url)
            .map_err(|e| anyhow::anyhow!("OPENAI_BASE_URL is not a valid URL: {}", e))?;

        if self.guardian_max_tool_rounds == 0 {
            anyhow::bail!("GUARDIAN_MAX_TOOL_ROUNDS must be > 0");
        }
        if self.guardian_history_window == 0 {
            anyhow::bail!("GUARDIAN_HISTORY_WINDOW must be > 0");
        }

        if self.openai_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; Guardian chat requests will fail");
        }
        if self.chain_id != NEO_X_CHAIN_ID {
            tracing::warn!(
                "Configured chain id {} differs from Neo X mainnet ({})",
                self.chain_id,
                NEO_X_CHAIN_ID
            );
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            tracing::warn!("LLM_TEMPERATURE should be between 0 and 2");
        }
        if self.walletconnect_project_id.trim().is_empty() {
            tracing::warn!("WALLETCONNECT_PROJECT_ID is not set");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 5000,
        environment: "development".to_string(),
        rpc_url: "http://localhost:8545".to_string(),
        chain_id: NEO_X_CHAIN_ID,
        openai_api_key: Some("test_key".to_string()),
        openai_base_url: "http://localhost:9999/v1".to_string(),
        openai_model: DEFAULT_LLM_MODEL.to_string(),
        llm_max_tokens: DEFAULT_LLM_MAX_TOKENS,
        llm_temperature: DEFAULT_LLM_TEMPERATURE,
        guardian_max_tool_rounds: GUARDIAN_MAX_TOOL_ROUNDS,
        guardian_history_window: GUARDIAN_HISTORY_WINDOW,
        walletconnect_project_id: String::new(),
        cors_allowed_origins: "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_defaults() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unparsable_rpc_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_tool_rounds() {
        let mut config = test_config();
        config.guardian_max_tool_rounds = 0;
        assert!(config.validate().is_err());
    }
}
