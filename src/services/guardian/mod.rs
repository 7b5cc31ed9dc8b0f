pub mod prompt;
pub mod tools;

use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

use self::tools::ToolExecutor;
use super::{
    chain_reader::ChainReader,
    gas_optimizer::GasOptimizer,
    llm::{ChatMessage, LlmClient, LlmResponse, ToolDefinition},
    session_store::SessionStore,
    transaction_parser,
};
use crate::{
    config::Config,
    constants::{
        GUARDIAN_APOLOGY, GUARDIAN_EMPTY_REPLY, GUARDIAN_TOOL_LIMIT_NOTE,
        GUARDIAN_TOOL_PLACEHOLDER,
    },
    error::{AppError, Result},
    models::{
        ChatSession, GuardianChatResponse, GuardianMessage, Role, StreamChunk, WalletContext,
    },
};

/// How the tool loop ended.
enum ToolLoopEnd {
    Answer(Option<String>),
    LimitReached,
}

/// The Guardian chat orchestrator.
///
/// A turn appends the user message, sends the system prompt plus recent history
/// to the model, resolves tool calls for a bounded number of rounds and stores
/// the final answer. The session lock is held for the whole turn, so turns for
/// one session id never interleave.
pub struct Guardian {
    llm: Arc<dyn LlmClient>,
    sessions: Arc<dyn SessionStore>,
    tools: ToolExecutor,
    tool_definitions: Vec<ToolDefinition>,
    chain_id: u64,
    max_tool_rounds: usize,
    history_window: usize,
}

impl Guardian {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        sessions: Arc<dyn SessionStore>,
        chain: ChainReader,
        gas: GasOptimizer,
        config: &Config,
    ) -> Self {
        Self {
            llm,
            sessions,
            tools: ToolExecutor::new(chain, gas),
            tool_definitions: tools::tool_definitions(),
            chain_id: config.chain_id,
            max_tool_rounds: config.guardian_max_tool_rounds,
            history_window: config.guardian_history_window,
        }
    }

    pub async fn history(&self, session_id: &str) -> Vec<GuardianMessage> {
        match self.sessions.get(session_id).await {
            Some(session) => session.lock().await.messages.clone(),
            None => Vec::new(),
        }
    }

    pub async fn clear(&self, session_id: &str) -> bool {
        let removed = self.sessions.delete(session_id).await;
        if removed {
            tracing::info!("Cleared guardian session {}", session_id);
        }
        removed
    }

    /// One non-streaming turn. LLM failures are returned after an apology has
    /// been recorded in the session.
    pub async fn chat(
        &self,
        session_id: &str,
        message: &str,
        wallet_context: Option<WalletContext>,
    ) -> Result<GuardianChatResponse> {
        validate_turn(session_id, message)?;
        match self.run_turn(session_id, message, wallet_context).await {
            Ok(answer) => Ok(GuardianChatResponse {
                transactions: transaction_parser::extract_transactions(&answer),
                message: answer,
            }),
            Err(e) => {
                self.record_failure(session_id, &e).await;
                Err(e)
            }
        }
    }

    async fn run_turn(
        &self,
        session_id: &str,
        message: &str,
        wallet_context: Option<WalletContext>,
    ) -> Result<String> {
        let handle = self.sessions.get_or_create(session_id).await;
        let mut session = handle.lock().await;
        let (mut conversation, wallet) = self.begin_turn(&mut session, message, wallet_context);

        let answer = match self.resolve_tools(&mut conversation, wallet.as_deref(), None).await? {
            ToolLoopEnd::Answer(content) => non_empty_or_default(content),
            ToolLoopEnd::LimitReached => {
                let forced = self.llm.complete(&conversation, None).await?;
                format!(
                    "{}{}",
                    non_empty_or_default(forced.content),
                    GUARDIAN_TOOL_LIMIT_NOTE
                )
            }
        };

        session.messages.push(GuardianMessage::assistant(answer.clone()));
        Ok(answer)
    }

    /// Streaming turn. Chunks go to `tx`; the last chunk is always `done`
    /// (or an error with `done`). A closed receiver does not stop the turn.
    pub async fn chat_stream(
        &self,
        session_id: &str,
        message: &str,
        wallet_context: Option<WalletContext>,
        tx: mpsc::Sender<StreamChunk>,
    ) {
        let outcome = match validate_turn(session_id, message) {
            Ok(()) => self.run_stream_turn(session_id, message, wallet_context, &tx).await,
            Err(e) => Err(e),
        };
        let last = match outcome {
            Ok(()) => StreamChunk::done(),
            Err(e) => {
                if !matches!(e, AppError::BadRequest(_)) {
                    self.record_failure(session_id, &e).await;
                }
                StreamChunk::failed(e.to_string())
            }
        };
        let _ = tx.send(last).await;
    }

    async fn run_stream_turn(
        &self,
        session_id: &str,
        message: &str,
        wallet_context: Option<WalletContext>,
        tx: &mpsc::Sender<StreamChunk>,
    ) -> Result<()> {
        let handle = self.sessions.get_or_create(session_id).await;
        let mut session = handle.lock().await;
        let (mut conversation, wallet) = self.begin_turn(&mut session, message, wallet_context);

        let end = self
            .resolve_tools(&mut conversation, wallet.as_deref(), Some(tx))
            .await?;

        let mut answer = String::new();
        let mut chunks = self.llm.stream_complete(&conversation).await?;
        while let Some(chunk) = chunks.next().await {
            let text = chunk?;
            answer.push_str(&text);
            let _ = tx.send(StreamChunk::content(text)).await;
        }

        if matches!(end, ToolLoopEnd::LimitReached) {
            answer.push_str(GUARDIAN_TOOL_LIMIT_NOTE);
            let _ = tx.send(StreamChunk::content(GUARDIAN_TOOL_LIMIT_NOTE)).await;
        }
        if answer.trim().is_empty() {
            answer = GUARDIAN_EMPTY_REPLY.to_string();
        }

        session.messages.push(GuardianMessage::assistant(answer));
        Ok(())
    }

    // Records the user turn and returns the model conversation plus the
    // connected wallet address.
    fn begin_turn(
        &self,
        session: &mut ChatSession,
        message: &str,
        wallet_context: Option<WalletContext>,
    ) -> (Vec<ChatMessage>, Option<String>) {
        if let Some(wallet) = wallet_context {
            session.wallet_context = Some(wallet);
        }
        session.messages.push(GuardianMessage::user(message.trim()));
        tracing::debug!(
            "Guardian turn for session {} ({} messages stored)",
            session.id,
            session.messages.len()
        );

        let mut conversation = vec![ChatMessage::system(prompt::system_prompt(
            self.chain_id,
            session.wallet_context.as_ref(),
        ))];
        conversation.extend(
            session
                .recent_messages(self.history_window)
                .iter()
                .map(to_chat_message),
        );
        (conversation, session.wallet_address().map(str::to_string))
    }

    // Calls the model with tools until it answers without tool calls, running
    // at most `max_tool_rounds` rounds of tools.
    async fn resolve_tools(
        &self,
        conversation: &mut Vec<ChatMessage>,
        wallet: Option<&str>,
        progress: Option<&mpsc::Sender<StreamChunk>>,
    ) -> Result<ToolLoopEnd> {
        let mut rounds = 0;
        loop {
            let response = self
                .llm
                .complete(conversation, Some(self.tool_definitions.as_slice()))
                .await?;
            if response.tool_calls.is_empty() {
                return Ok(ToolLoopEnd::Answer(response.content));
            }
            if rounds >= self.max_tool_rounds {
                tracing::warn!(
                    rounds,
                    "Guardian reached the tool-call limit, forcing a final answer"
                );
                return Ok(ToolLoopEnd::LimitReached);
            }
            rounds += 1;

            if let Some(tx) = progress {
                let _ = tx.send(StreamChunk::content(GUARDIAN_TOOL_PLACEHOLDER)).await;
            }
            self.run_tool_round(conversation, response, wallet).await;
        }
    }

    // Tools in a round run one after another, in the order the model listed them.
    async fn run_tool_round(
        &self,
        conversation: &mut Vec<ChatMessage>,
        response: LlmResponse,
        wallet: Option<&str>,
    ) {
        let calls = response.tool_calls;
        conversation.push(ChatMessage::assistant_tool_calls(
            response.content,
            calls.clone(),
        ));
        for call in &calls {
            tracing::info!("Guardian tool call: {}", call.function.name);
            let result = self.tools.execute(call, wallet).await;
            conversation.push(ChatMessage::tool_result(call.id.clone(), result));
        }
    }

    async fn record_failure(&self, session_id: &str, error: &AppError) {
        tracing::error!("Guardian turn failed for session {}: {}", session_id, error);
        self.sessions
            .append_message(session_id, GuardianMessage::assistant(GUARDIAN_APOLOGY))
            .await;
    }
}

fn validate_turn(session_id: &str, message: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        return Err(AppError::BadRequest("sessionId is required".to_string()));
    }
    if message.trim().is_empty() {
        return Err(AppError::BadRequest("message is required".to_string()));
    }
    Ok(())
}

fn non_empty_or_default(content: Option<String>) -> String {
    content
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| GUARDIAN_EMPTY_REPLY.to_string())
}

fn to_chat_message(message: &GuardianMessage) -> ChatMessage {
    match message.role {
        Role::User => ChatMessage::user(message.content.clone()),
        Role::Assistant => ChatMessage::assistant(message.content.clone()),
        Role::System => ChatMessage::system(message.content.clone()),
    }
}
