//! # REST API
//!
//! Builds the axum router that exposes the operator's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                          | Description                          |
//! |--------|-------------------------------|--------------------------------------|
//! | GET    | `/health`                     | Liveness probe                       |
//! | GET    | `/status`                     | Operator status summary              |
//! | POST   | `/payments/sign`              | Sign (and optionally forward) a payment |
//! | POST   | `/stages/commit`              | Commit the pending root of a stage   |
//! | GET    | `/stages/:height`             | Local view of a stage                |
//! | POST   | `/stages/:height/finalize`    | Finalize a stage                     |
//! | POST   | `/stages/:height/exonerate`   | Exonerate a payment                  |
//! | POST   | `/stages/:height/penalty`     | Submit a penalty                     |
//!
//! Protocol errors map to status codes: caller mistakes are 400, missing
//! roots 404, a bad slice 422, booster or chain trouble 502, and a signer
//! misconfiguration 500.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ifc_protocol::chain::TxHandle;
use ifc_protocol::config::StageTimings;
use ifc_protocol::crypto::hash::{decode_hex, parse_h256, H256};
use ifc_protocol::payment::{PaymentSigner, RawPayment, SignedPaymentCommitment};
use ifc_protocol::stage::{CommitOptions, ExonerationProof, StageLifecycle, StageRecord};
use ifc_protocol::ProtocolError;

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cloned per request; shared parts sit behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    pub signer: PaymentSigner,
    pub lifecycle: Arc<StageLifecycle>,
    pub metrics: SharedMetrics,
    pub started_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/payments/sign", post(sign_payment_handler))
        .route("/stages/commit", post(commit_handler))
        .route("/stages/:height", get(stage_handler))
        .route("/stages/:height/finalize", post(finalize_handler))
        .route("/stages/:height/exonerate", post(exonerate_handler))
        .route("/stages/:height/penalty", post(penalty_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub version: String,
    pub signer_address: String,
    pub timings: StageTimings,
    /// Stages this operator has submitted something for.
    pub stages_tracked: usize,
    pub started_at: String,
    pub timestamp: String,
}

/// Body of `POST /payments/sign`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPaymentRequest {
    pub payment: RawPayment,
    /// Defaults to the payment's own `stageHeight`.
    #[serde(default)]
    pub stage_height: Option<u64>,
    /// Forward the commitment to the booster after signing.
    #[serde(default)]
    pub forward: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPaymentResponse {
    pub commitment: SignedPaymentCommitment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booster: Option<serde_json::Value>,
}

/// Body of `POST /stages/commit`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub stage_height: u64,
    #[serde(default)]
    pub objection_time: Option<u64>,
    #[serde(default)]
    pub finalize_time: Option<u64>,
    /// Hex-encoded stage data.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub nonce: Option<u64>,
}

/// Body of `POST /stages/:height/exonerate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExonerateRequest {
    pub payment_hash: String,
    /// Fetched from the booster when absent.
    #[serde(default)]
    pub proof: Option<ExonerationProof>,
}

/// Body of `POST /stages/:height/penalty`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyRequest {
    pub payment_hashes: Vec<String>,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub retryable: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A protocol error on its way out as an HTTP response.
pub struct ApiError(ProtocolError);

impl From<ProtocolError> for ApiError {
    fn from(e: ProtocolError) -> Self {
        Self(e)
    }
}

/// HTTP status for a protocol error.
pub fn status_for(err: &ProtocolError) -> StatusCode {
    match err {
        ProtocolError::MalformedPayment(_)
        | ProtocolError::MalformedLightTx(_)
        | ProtocolError::InvalidType(_)
        | ProtocolError::Serialization(_) => StatusCode::BAD_REQUEST,
        ProtocolError::NoPendingRoot(_) | ProtocolError::NoCommittedRoot(_) => {
            StatusCode::NOT_FOUND
        }
        ProtocolError::SliceMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProtocolError::Gateway { .. } | ProtocolError::ChainSubmission { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ProtocolError::SignatureMismatch { .. }
        | ProtocolError::Crypto(_)
        | ProtocolError::DepositCancelled => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}

/// Record the failure in metrics and turn it into an [`ApiError`].
fn fail(state: &AppState, err: ProtocolError) -> ApiError {
    state.metrics.record_failure(&err);
    ApiError(err)
}

fn parse_hash(field: &str, value: &str) -> Result<H256, ProtocolError> {
    parse_h256(value).map_err(|e| ProtocolError::Serialization(format!("{field}: {e}")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// Does not probe the booster or the chain; that belongs in `/status`
/// consumers' own checks.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — operator status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        version: state.version.clone(),
        signer_address: state.signer.signer_address().to_hex(),
        timings: state.lifecycle.timings(),
        stages_tracked: state.lifecycle.stage_records().len(),
        started_at: state.started_at.to_rfc3339(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// `POST /payments/sign` — sign a payment commitment, optionally forward it.
async fn sign_payment_handler(
    State(state): State<AppState>,
    Json(req): Json<SignPaymentRequest>,
) -> Result<Json<SignPaymentResponse>, ApiError> {
    let stage_height = req
        .stage_height
        .or(req.payment.stage_height)
        .ok_or_else(|| ProtocolError::MalformedPayment("stageHeight".into()))?;

    let started = Instant::now();
    let commitment = state
        .signer
        .sign_commitment(&req.payment, stage_height)
        .map_err(|e| fail(&state, e))?;
    state
        .metrics
        .signing_latency_seconds
        .observe(started.elapsed().as_secs_f64());
    state.metrics.payments_signed_total.inc();

    let booster = if req.forward {
        let resp = state
            .lifecycle
            .send_payments(std::slice::from_ref(&commitment))
            .await
            .map_err(|e| fail(&state, e))?;
        Some(resp)
    } else {
        None
    };

    Ok(Json(SignPaymentResponse {
        commitment,
        booster,
    }))
}

/// `POST /stages/commit` — commit the booster's pending root.
async fn commit_handler(
    State(state): State<AppState>,
    Json(req): Json<CommitRequest>,
) -> Result<Json<TxHandle>, ApiError> {
    let defaults = state.lifecycle.timings();
    let timings = match (req.objection_time, req.finalize_time) {
        (None, None) => None,
        (o, f) => Some(StageTimings {
            objection_time: o.unwrap_or(defaults.objection_time),
            finalize_time: f.unwrap_or(defaults.finalize_time),
        }),
    };
    let data = match req.data.as_deref() {
        Some(hex) => {
            decode_hex(hex).map_err(|e| ProtocolError::Serialization(format!("data: {e}")))?
        }
        None => Vec::new(),
    };

    let options = CommitOptions {
        timings,
        data,
        nonce: req.nonce,
    };
    let handle = state
        .lifecycle
        .commit_with(req.stage_height, options)
        .await
        .map_err(|e| fail(&state, e))?;
    state.metrics.record_transition("commit");
    Ok(Json(handle))
}

/// `GET /stages/:height` — what this operator has submitted for a stage.
async fn stage_handler(
    Path(height): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<StageRecord>, (StatusCode, Json<ErrorResponse>)> {
    state.lifecycle.stage_record(height).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no submissions recorded for stage {height}"),
                retryable: false,
            }),
        )
    })
}

/// `POST /stages/:height/finalize`
async fn finalize_handler(
    Path(height): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<TxHandle>, ApiError> {
    let handle = state
        .lifecycle
        .finalize(height)
        .await
        .map_err(|e| fail(&state, e))?;
    state.metrics.record_transition("finalize");
    Ok(Json(handle))
}

/// `POST /stages/:height/exonerate` — with a caller-supplied proof, or one
/// fetched from the booster.
async fn exonerate_handler(
    Path(height): Path<u64>,
    State(state): State<AppState>,
    Json(req): Json<ExonerateRequest>,
) -> Result<Json<TxHandle>, ApiError> {
    let payment_hash = parse_hash("paymentHash", &req.payment_hash)?;

    let result = match &req.proof {
        Some(proof) => {
            state
                .lifecycle
                .exonerate_with_proof(height, &payment_hash, proof)
                .await
        }
        None => state.lifecycle.exonerate(height, &payment_hash).await,
    };
    let handle = result.map_err(|e| fail(&state, e))?;
    state.metrics.record_transition("exonerate");
    Ok(Json(handle))
}

/// `POST /stages/:height/penalty`
async fn penalty_handler(
    Path(height): Path<u64>,
    State(state): State<AppState>,
    Json(req): Json<PenaltyRequest>,
) -> Result<Json<TxHandle>, ApiError> {
    let hashes = req
        .payment_hashes
        .iter()
        .map(|h| parse_hash("paymentHashes", h))
        .collect::<Result<Vec<_>, _>>()?;

    let handle = state
        .lifecycle
        .pay_penalty(height, hashes)
        .await
        .map_err(|e| fail(&state, e))?;
    state.metrics.record_transition("penalize");
    Ok(Json(handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use ifc_protocol::chain::{ChainClient, ContractCall};
    use ifc_protocol::crypto::hash::{keccak256, merkle_parent, to_hex};
    use ifc_protocol::crypto::{Address, Credential, IfcKeypair, SealingKeypair};
    use ifc_protocol::gateway::{BoosterGateway, PendingRoot, Slice};
    use ifc_protocol::light_tx::SignedLightTransaction;
    use parking_lot::Mutex;
    use tower::ServiceExt;

    /// Booster stub with a fixed two-leaf stage at height 1.
    struct FakeBooster {
        pending: Option<PendingRoot>,
        committed: Option<H256>,
        leaves: [H256; 2],
        forwarded: Mutex<usize>,
    }

    impl FakeBooster {
        fn new() -> Self {
            let leaves = [keccak256(b"p0"), keccak256(b"p1")];
            let root = merkle_parent(&leaves[0], &leaves[1]);
            Self {
                pending: Some(PendingRoot {
                    stage_height: 1,
                    root_hash: root,
                }),
                committed: Some(root),
                leaves,
                forwarded: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl BoosterGateway for FakeBooster {
        async fn pending_root(&self, _h: Option<u64>) -> ifc_protocol::Result<PendingRoot> {
            self.pending
                .ok_or_else(|| ProtocolError::NoPendingRoot("empty".into()))
        }
        async fn committed_root(&self, _h: u64) -> ifc_protocol::Result<Option<H256>> {
            Ok(self.committed)
        }
        async fn slice(&self, _h: u64, payment_hash: &H256) -> ifc_protocol::Result<Slice> {
            let index = if *payment_hash == self.leaves[0] { 0 } else { 1 };
            Ok(Slice {
                tree_node_index: index,
                siblings: vec![self.leaves[1 - index as usize]],
                colliding_payment_hashes: vec![*payment_hash],
            })
        }
        async fn send_payments(
            &self,
            payments: &[SignedPaymentCommitment],
        ) -> ifc_protocol::Result<serde_json::Value> {
            *self.forwarded.lock() += payments.len();
            Ok(serde_json::json!({ "ok": true }))
        }
        async fn send_light_tx(
            &self,
            _tx: &SignedLightTransaction,
        ) -> ifc_protocol::Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
        async fn contract_address(&self) -> ifc_protocol::Result<Address> {
            Ok(Address::from_bytes([0xcc; 20]))
        }
        async fn viable_stage_height(&self) -> ifc_protocol::Result<u64> {
            Ok(1)
        }
    }

    struct FakeChain {
        fail: bool,
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        async fn submit(
            &self,
            _contract: &Address,
            call: &ContractCall,
            _nonce: Option<u64>,
        ) -> ifc_protocol::Result<TxHandle> {
            if self.fail {
                return Err(ProtocolError::chain(call.method(), "execution reverted"));
            }
            Ok(TxHandle {
                method: call.method().to_string(),
                tx_hash: [0x11; 32],
            })
        }
    }

    fn state_with(booster: FakeBooster, chain: FakeChain, credential: Credential) -> AppState {
        let lifecycle = StageLifecycle::new(
            Arc::new(booster),
            Arc::new(chain),
            StageTimings::default(),
        );
        AppState {
            version: "0.1.0-test".into(),
            signer: PaymentSigner::new(credential),
            lifecycle: Arc::new(lifecycle),
            metrics: Arc::new(crate::metrics::NodeMetrics::new().unwrap()),
            started_at: Utc::now(),
        }
    }

    fn test_state() -> AppState {
        state_with(
            FakeBooster::new(),
            FakeChain { fail: false },
            Credential::new(IfcKeypair::generate()),
        )
    }

    fn payment_json() -> serde_json::Value {
        let raw = RawPayment::new(
            "0x00000000000000000000000000000000000000aa",
            "0x00000000000000000000000000000000000000bb",
            25,
            3,
            1,
            &SealingKeypair::generate().public_key_bytes(),
            &SealingKeypair::generate().public_key_bytes(),
        );
        serde_json::to_value(raw).unwrap()
    }

    /// Sends a request and returns (status, parsed JSON body).
    async fn send(
        router: &Router,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(path);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_state());
        let (status, json) = send(&router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn status_reports_signer() {
        let state = test_state();
        let signer = state.signer.signer_address().to_hex();
        let router = create_router(state);
        let (status, json) = send(&router, "GET", "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["signerAddress"], signer);
        assert_eq!(json["stagesTracked"], 0);
    }

    #[tokio::test]
    async fn sign_payment_returns_commitment() {
        let state = test_state();
        let metrics = state.metrics.clone();
        let router = create_router(state);
        let (status, json) = send(
            &router,
            "POST",
            "/payments/sign",
            Some(serde_json::json!({ "payment": payment_json() })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["commitment"]["stageHeight"], 1);
        assert!(json["commitment"]["r"].as_str().unwrap().starts_with("0x"));
        assert!(json.get("booster").is_none());
        assert_eq!(metrics.payments_signed_total.get(), 1);
    }

    #[tokio::test]
    async fn sign_payment_can_forward() {
        let router = create_router(test_state());
        let (status, json) = send(
            &router,
            "POST",
            "/payments/sign",
            Some(serde_json::json!({ "payment": payment_json(), "forward": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["booster"]["ok"], true);
    }

    #[tokio::test]
    async fn incomplete_payment_is_bad_request() {
        let router = create_router(test_state());
        let mut payment = payment_json();
        payment.as_object_mut().unwrap().remove("to");
        let (status, json) = send(
            &router,
            "POST",
            "/payments/sign",
            Some(serde_json::json!({ "payment": payment })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("`to`"));
    }

    #[tokio::test]
    async fn misconfigured_signer_is_server_error() {
        let credential = Credential::with_signer_address(
            IfcKeypair::generate(),
            Address::from_bytes([9; 20]),
        );
        let router = create_router(state_with(
            FakeBooster::new(),
            FakeChain { fail: false },
            credential,
        ));
        let (status, _) = send(
            &router,
            "POST",
            "/payments/sign",
            Some(serde_json::json!({ "payment": payment_json() })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn commit_then_stage_view() {
        let router = create_router(test_state());

        let (status, _) = send(&router, "GET", "/stages/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = send(
            &router,
            "POST",
            "/stages/commit",
            Some(serde_json::json!({ "stageHeight": 1, "data": "0xbeef" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["method"], "addNewStage");
        assert_eq!(json["txHash"], format!("0x{}", "11".repeat(32)));

        let (status, json) = send(&router, "GET", "/stages/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], "committed");
    }

    #[tokio::test]
    async fn commit_without_pending_root_is_not_found() {
        let mut booster = FakeBooster::new();
        booster.pending = None;
        let router = create_router(state_with(
            booster,
            FakeChain { fail: false },
            Credential::new(IfcKeypair::generate()),
        ));
        let (status, json) = send(
            &router,
            "POST",
            "/stages/commit",
            Some(serde_json::json!({ "stageHeight": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["retryable"], true);
    }

    #[tokio::test]
    async fn chain_failure_is_bad_gateway() {
        let state = state_with(
            FakeBooster::new(),
            FakeChain { fail: true },
            Credential::new(IfcKeypair::generate()),
        );
        let metrics = state.metrics.clone();
        let router = create_router(state);

        let (status, json) = send(&router, "POST", "/stages/1/finalize", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json["error"].as_str().unwrap().contains("execution reverted"));
        assert_eq!(
            metrics
                .upstream_failures_total
                .with_label_values(&["chain"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn exonerate_with_booster_slice() {
        let router = create_router(test_state());
        let payment_hash = to_hex(&keccak256(b"p1"));
        let (status, json) = send(
            &router,
            "POST",
            "/stages/1/exonerate",
            Some(serde_json::json!({ "paymentHash": payment_hash })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["method"], "exonerate");
    }

    #[tokio::test]
    async fn forged_proof_is_unprocessable() {
        let state = test_state();
        let metrics = state.metrics.clone();
        let router = create_router(state);
        let forged = keccak256(b"forged");
        let proof = ExonerationProof {
            stage_height: 1,
            payment_hash: forged,
            tree_node_index: 0,
            slice: vec![keccak256(b"p1")],
            colliding_payment_hashes: vec![],
        };
        let (status, _) = send(
            &router,
            "POST",
            "/stages/1/exonerate",
            Some(serde_json::json!({
                "paymentHash": to_hex(&forged),
                "proof": proof_json(&proof),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(metrics.rejected_slices_total.get(), 1);
    }

    fn proof_json(proof: &ExonerationProof) -> serde_json::Value {
        serde_json::to_value(proof).unwrap()
    }

    #[tokio::test]
    async fn exonerate_without_committed_root_is_not_found() {
        let mut booster = FakeBooster::new();
        booster.committed = None;
        let router = create_router(state_with(
            booster,
            FakeChain { fail: false },
            Credential::new(IfcKeypair::generate()),
        ));
        let (status, _) = send(
            &router,
            "POST",
            "/stages/1/exonerate",
            Some(serde_json::json!({ "paymentHash": to_hex(&keccak256(b"p0")) })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn penalty_rejects_bad_hash() {
        let router = create_router(test_state());
        let (status, _) = send(
            &router,
            "POST",
            "/stages/2/penalty",
            Some(serde_json::json!({ "paymentHashes": ["not-hex"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(
            &router,
            "POST",
            "/stages/2/penalty",
            Some(serde_json::json!({ "paymentHashes": [to_hex(&[7u8; 32])] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["method"], "payPenalty");
    }
}
