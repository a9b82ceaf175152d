//! Retrieval endpoints: one per strategy plus the concurrent fan-out.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use cerebra_common::{ApiResponse, QueryRequest};
use cerebra_rag::{RagAnswer, Strategy, StrategyOutcome};

use crate::error::ApiResult;
use crate::state::SharedState;

/// Per-strategy response keys: `{strategy}_rag_response` and
/// `{strategy}_retriever_response`.
fn answer_json(strategy: Strategy, answer: &RagAnswer) -> Value {
    let mut data = serde_json::Map::new();
    data.insert(
        format!("{}_rag_response", strategy.as_str()),
        Value::String(answer.response.clone()),
    );
    data.insert(
        format!("{}_retriever_response", strategy.as_str()),
        Value::String(answer.retrieved_context.clone()),
    );
    Value::Object(data)
}

fn outcome_json(strategy: Strategy, outcome: &StrategyOutcome) -> Value {
    match outcome {
        StrategyOutcome::Answered(answer) => answer_json(strategy, answer),
        StrategyOutcome::Failed { error, strategy } => {
            json!({ "error": error, "strategy": strategy })
        }
    }
}

async fn answer_endpoint(
    state: SharedState,
    brain_id: String,
    strategy: Strategy,
    req: QueryRequest,
) -> ApiResult<impl IntoResponse> {
    let answer = state.orchestrator.answer(&brain_id, strategy, &req).await?;
    let body = ApiResponse::ok(200, "Response generated successfully.", answer_json(strategy, &answer));
    Ok(Json(body))
}

/// POST /api/{brain_id}/hybrid
pub async fn hybrid(
    State(state): State<SharedState>,
    Path(brain_id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<impl IntoResponse> {
    answer_endpoint(state, brain_id, Strategy::Hybrid, req).await
}

/// POST /api/{brain_id}/dense
pub async fn dense(
    State(state): State<SharedState>,
    Path(brain_id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<impl IntoResponse> {
    answer_endpoint(state, brain_id, Strategy::Dense, req).await
}

/// POST /api/{brain_id}/sparse
pub async fn sparse(
    State(state): State<SharedState>,
    Path(brain_id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<impl IntoResponse> {
    answer_endpoint(state, brain_id, Strategy::Sparse, req).await
}

/// POST /api/{brain_id}/hyde
pub async fn hyde(
    State(state): State<SharedState>,
    Path(brain_id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<impl IntoResponse> {
    answer_endpoint(state, brain_id, Strategy::Hyde, req).await
}

/// POST /api/{brain_id}/all - run every strategy concurrently. Partial
/// failure is a 200; failed strategies carry their error inline.
pub async fn all(
    State(state): State<SharedState>,
    Path(brain_id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<impl IntoResponse> {
    let answers = state.orchestrator.answer_all(&brain_id, &req).await;
    let data = json!({
        "hybrid": outcome_json(Strategy::Hybrid, &answers.hybrid),
        "hyde": outcome_json(Strategy::Hyde, &answers.hyde),
        "dense": outcome_json(Strategy::Dense, &answers.dense),
        "sparse": outcome_json(Strategy::Sparse, &answers.sparse),
    });
    Ok(Json(ApiResponse::ok(200, "Response generated successfully.", data)))
}
