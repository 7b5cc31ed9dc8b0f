use serde::{Deserialize, Serialize};

use super::transaction::ParsedTransaction;

// ==================== CHAT ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: i64, // unix millis
}

impl GuardianMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ==================== WALLET CONTEXT ====================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletContext {
    pub address: String,
    #[serde(default)]
    pub amor_balance: String,
    #[serde(default)]
    pub st_amor_balance: String,
    #[serde(default)]
    pub voting_power: String,
}

// ==================== SESSION ====================
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    pub id: String,
    pub messages: Vec<GuardianMessage>,
    pub wallet_context: Option<WalletContext>,
}

impl ChatSession {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            messages: Vec::new(),
            wallet_context: None,
        }
    }

    /// Last `window` turns, oldest first.
    pub fn recent_messages(&self, window: usize) -> &[GuardianMessage] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_context
            .as_ref()
            .map(|ctx| ctx.address.trim())
            .filter(|addr| !addr.is_empty())
    }
}

// ==================== HTTP PAYLOADS ====================
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianChatRequest {
    // Missing fields reach `validate_turn` as blanks and fail with a 400.
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub message: String,
    pub wallet_context: Option<WalletContext>,
}

#[derive(Debug, Serialize)]
pub struct GuardianChatResponse {
    pub message: String,
    pub transactions: Vec<ParsedTransaction>,
}

#[derive(Debug, Serialize)]
pub struct GuardianHistoryResponse {
    pub messages: Vec<GuardianMessage>,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub done: bool,
}

impl StreamChunk {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            done: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ParseTransactionsRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseTransactionsResponse {
    pub transactions: Vec<ParsedTransaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_messages_keeps_last_window() {
        let mut session = ChatSession::new("s1");
        for i in 0..12 {
            session.messages.push(GuardianMessage::user(format!("msg {}", i)));
        }
        let recent = session.recent_messages(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].content, "msg 2");
        assert_eq!(recent[9].content, "msg 11");
    }

    #[test]
    fn wallet_context_reads_camel_case() {
        let ctx: WalletContext = serde_json::from_value(serde_json::json!({
            "address": "0xabc",
            "amorBalance": "10.0",
            "stAmorBalance": "5.0",
            "votingPower": "5.0"
        }))
        .expect("wallet context should parse");
        assert_eq!(ctx.st_amor_balance, "5.0");
    }

    #[test]
    fn stream_chunk_serializes_done_marker_only() {
        let json = serde_json::to_value(StreamChunk::done()).expect("serialize");
        assert_eq!(json, serde_json::json!({ "done": true }));
        let json = serde_json::to_value(StreamChunk::content("hi")).expect("serialize");
        assert_eq!(json, serde_json::json!({ "content": "hi" }));
    }

    #[test]
    fn wallet_address_ignores_blank() {
        let mut session = ChatSession::new("s1");
        session.wallet_context = Some(WalletContext::default());
        assert!(session.wallet_address().is_none());
    }
}
