use crate::peer::HttpPeerClient;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{Block, Ledger, LedgerError, MineOutcome, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub node_id: Arc<str>,
    pub peer_client: HttpPeerClient,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>, node_id: impl Into<Arc<str>>, peer_client: HttpPeerClient) -> Self {
        Self {
            ledger,
            node_id: node_id.into(),
            peer_client,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Invalid(#[from] LedgerError),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Invalid(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// Every field is optional on the wire so a missing one is reported by name.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<serde_json::Number>,
}

impl TransactionRequest {
    pub fn into_transaction(self) -> Result<Transaction, LedgerError> {
        Ok(Transaction {
            sender: self.sender.ok_or(LedgerError::MissingField("sender"))?,
            recipient: self.recipient.ok_or(LedgerError::MissingField("recipient"))?,
            amount: self.amount.ok_or(LedgerError::MissingField("amount"))?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    pub block_index: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterPeersRequest {
    pub nodes: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterPeersResponse {
    pub message: String,
    pub total_nodes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    pub replaced: bool,
    pub chain: Vec<Block>,
    pub length: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/transactions", get(pending_transactions))
        .route("/transactions/new", post(new_transaction))
        .route("/chain", get(full_chain))
        .route("/mine", get(mine))
        .route("/nodes/new", post(register_nodes))
        .route("/nodes/resolve", get(resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn pending_transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    Json(state.ledger.pending_transactions())
}

async fn new_transaction(
    State(state): State<AppState>,
    body: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let Json(request) = body?;
    let tx = request.into_transaction()?;
    let block_index = state.ledger.submit_transaction(tx);
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: format!("Transaction will be added to block {block_index}"),
            block_index,
        }),
    ))
}

/// The chain as a bare JSON array, oldest block first.
async fn full_chain(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.ledger.chain())
}

async fn mine(State(state): State<AppState>) -> Result<Json<MineResponse>, ApiError> {
    let ledger = Arc::clone(&state.ledger);
    let outcome = tokio::task::spawn_blocking(move || ledger.mine())
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    match outcome {
        MineOutcome::Mined { index, hash } => {
            // Reward for this block rides in the next one.
            state
                .ledger
                .submit_transaction(Transaction::reward(&*state.node_id));
            Ok(Json(MineResponse {
                message: format!("Block {index} is mined"),
                index: Some(index),
                hash: Some(hex::encode(hash)),
            }))
        }
        MineOutcome::NoPendingTransactions => Ok(Json(MineResponse {
            message: "No transactions to mine".to_string(),
            index: None,
            hash: None,
        })),
        MineOutcome::Discarded(err) => Err(ApiError::Conflict(format!(
            "mining did not complete: {err}"
        ))),
        MineOutcome::Cancelled => Err(ApiError::Conflict(
            "mining did not complete: chain replaced during search".to_string(),
        )),
    }
}

async fn register_nodes(
    State(state): State<AppState>,
    body: Result<Json<RegisterPeersRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterPeersResponse>), ApiError> {
    let Json(request) = body?;
    let nodes = request.nodes.ok_or(LedgerError::EmptyPeerList)?;
    let total_nodes = state.ledger.register_peers(&nodes)?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterPeersResponse {
            message: "New node/s added".to_string(),
            total_nodes,
        }),
    ))
}

async fn resolve(State(state): State<AppState>) -> Json<ResolveResponse> {
    let resolution = state.ledger.resolve(&state.peer_client).await;
    let message = if resolution.replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    info!(replaced = resolution.replaced, length = resolution.length, "consensus pass finished");
    let chain = state.ledger.chain();
    Json(ResolveResponse {
        message: message.to_string(),
        replaced: resolution.replaced,
        length: chain.len(),
        chain,
    })
}
