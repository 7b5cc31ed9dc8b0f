use axum::Json;

use crate::{
    error::Result,
    models::transaction::{BuildTransactionRequest, TransactionPlan},
    services::transaction_builder,
};

/// POST /api/transactions/build
///
/// Returns unsigned calldata; the client wallet signs and sends it.
pub async fn build(Json(req): Json<BuildTransactionRequest>) -> Result<Json<TransactionPlan>> {
    let plan = transaction_builder::build_transaction(&req)?;
    tracing::debug!("Built transaction plan for {:?}", req);
    Ok(Json(plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CONTRACT_AMOR, CONTRACT_STAKING_MANAGER};
    use axum::{http::StatusCode, response::IntoResponse};

    fn request(body: serde_json::Value) -> BuildTransactionRequest {
        serde_json::from_value(body).expect("request")
    }

    #[tokio::test]
    async fn stake_builds_approve_then_stake() {
        let Json(plan) = build(Json(request(
            serde_json::json!({"type": "stake", "amount": "100"}),
        )))
        .await
        .expect("plan");

        let TransactionPlan::MultiStep(multi) = plan else {
            panic!("stake should be multi-step");
        };
        assert_eq!(multi.total_steps, 2);
        assert_eq!(multi.steps[0].to, CONTRACT_AMOR);
        assert_eq!(multi.steps[1].to, CONTRACT_STAKING_MANAGER);
    }

    #[tokio::test]
    async fn cancel_unstake_uses_camel_case_fields() {
        let Json(plan) = build(Json(request(
            serde_json::json!({"type": "cancelUnstake", "requestId": 3}),
        )))
        .await
        .expect("plan");
        assert!(matches!(plan, TransactionPlan::Single(_)));
    }

    #[tokio::test]
    async fn invalid_vote_support_is_rejected() {
        let err = build(Json(request(
            serde_json::json!({"type": "vote", "proposalId": "1", "support": 7}),
        )))
        .await
        .expect_err("support out of range");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_delegatee_is_rejected() {
        let err = build(Json(request(
            serde_json::json!({"type": "delegate", "delegatee": "0x123"}),
        )))
        .await
        .expect_err("bad address");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
