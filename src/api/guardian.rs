use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::AppState;
use crate::{
    constants::SSE_KEEP_ALIVE_SECS,
    error::Result,
    models::guardian::{
        GuardianChatRequest, GuardianChatResponse, GuardianHistoryResponse,
        ParseTransactionsRequest, ParseTransactionsResponse, StreamChunk,
    },
    services::transaction_parser,
};

const STREAM_BUFFER: usize = 32;

/// POST /api/guardian/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<GuardianChatRequest>,
) -> Result<Json<GuardianChatResponse>> {
    let response = state
        .guardian
        .chat(&req.session_id, &req.message, req.wallet_context)
        .await?;
    Ok(Json(response))
}

/// POST /api/guardian/chat/stream
///
/// The turn runs on its own task so it completes (and lands in history)
/// even if the client goes away mid-stream.
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(req): Json<GuardianChatRequest>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<StreamChunk>(STREAM_BUFFER);
    let guardian = state.guardian.clone();

    tokio::spawn(async move {
        guardian
            .chat_stream(&req.session_id, &req.message, req.wallet_context, tx)
            .await;
    });

    let stream = ReceiverStream::new(rx).map(|chunk| {
        let event = Event::default()
            .json_data(&chunk)
            .unwrap_or_else(|_| Event::default().data(r#"{"error":"serialization failed","done":true}"#));
        Ok(event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS))
            .text("ping"),
    )
}

/// GET /api/guardian/history/{sessionId}
pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<GuardianHistoryResponse> {
    let messages = state.guardian.history(&session_id).await;
    Json(GuardianHistoryResponse { messages })
}

/// DELETE /api/guardian/session/{sessionId}
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> StatusCode {
    state.guardian.clear(&session_id).await;
    StatusCode::NO_CONTENT
}

/// POST /api/guardian/transactions/parse
pub async fn parse_transactions(
    Json(req): Json<ParseTransactionsRequest>,
) -> Json<ParseTransactionsResponse> {
    Json(ParseTransactionsResponse {
        transactions: transaction_parser::extract_transactions(&req.text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::state_with;
    use crate::error::AppError;
    use crate::models::Role;
    use crate::services::onchain::testing::StubRpc;
    use axum::response::IntoResponse;

    fn request(session: &str, message: &str) -> GuardianChatRequest {
        GuardianChatRequest {
            session_id: session.to_string(),
            message: message.to_string(),
            wallet_context: None,
        }
    }

    #[tokio::test]
    async fn chat_returns_message_and_records_history() {
        let state = state_with(StubRpc::default(), Some("Staking turns AMOR into stAMOR."));

        let Json(body) = chat(State(state.clone()), Json(request("s1", "What is stAMOR?")))
            .await
            .expect("chat");
        assert_eq!(body.message, "Staking turns AMOR into stAMOR.");
        assert!(body.transactions.is_empty());

        let Json(history) = history(State(state), Path("s1".to_string())).await;
        assert_eq!(history.messages.len(), 2);
        assert_eq!(history.messages[0].role, Role::User);
        assert_eq!(history.messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn chat_failure_maps_to_server_error() {
        let state = state_with(StubRpc::default(), None);
        let err = chat(State(state), Json(request("s1", "hello")))
            .await
            .expect_err("llm down");
        assert!(matches!(err, AppError::ExternalAPI(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let state = state_with(StubRpc::default(), Some("unused"));
        let err = chat(State(state), Json(request("s1", "   ")))
            .await
            .expect_err("blank");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn body_without_session_id_is_bad_request() {
        let state = state_with(StubRpc::default(), Some("unused"));
        let Json(req) =
            Json::<GuardianChatRequest>::from_bytes(br#"{"message":"hi"}"#).expect("extract");
        let err = chat(State(state.clone()), Json(req))
            .await
            .expect_err("missing sessionId");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let Json(req) =
            Json::<GuardianChatRequest>::from_bytes(br#"{"sessionId":"s9"}"#).expect("extract");
        let err = chat(State(state.clone()), Json(req))
            .await
            .expect_err("missing message");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let Json(history) = history(State(state), Path("s9".to_string())).await;
        assert!(history.messages.is_empty());
    }

    #[tokio::test]
    async fn delete_session_is_no_content_even_when_missing() {
        let state = state_with(StubRpc::default(), Some("hi"));
        chat(State(state.clone()), Json(request("s1", "hello")))
            .await
            .expect("chat");

        let status = clear_session(State(state.clone()), Path("s1".to_string())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let Json(history) = history(State(state.clone()), Path("s1".to_string())).await;
        assert!(history.messages.is_empty());

        let status = clear_session(State(state), Path("missing".to_string())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn parse_endpoint_gates_suggestions() {
        let text = "Transaction ready\nContract: 0x0000000000000000000000000000000000000001\nData: 0x1234\nDescription: Stake 5 AMOR";
        let Json(body) = parse_transactions(Json(ParseTransactionsRequest {
            text: text.to_string(),
        }))
        .await;
        assert_eq!(body.transactions.len(), 1);
        assert!(!body.transactions[0].executable);
        assert!(!body.transactions[0].is_verified);
    }
}
