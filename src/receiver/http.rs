//! OTLP/HTTP receiver.
//!
//! `POST /v1/logs`, `/v1/traces` and `/v1/metrics` accept binary protobuf or
//! JSON bodies. The encoding is chosen from `Content-Type`; without a
//! recognised type the body is tried as protobuf first, then as JSON. The
//! response is JSON when the client's `Accept` asks for it, protobuf otherwise.

use crate::core::OteluiError;
use crate::storage::TelemetryStore;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use opentelemetry_proto::tonic::collector::{
    logs::v1::{ExportLogsServiceRequest, ExportLogsServiceResponse},
    metrics::v1::{ExportMetricsServiceRequest, ExportMetricsServiceResponse},
    trace::v1::{ExportTraceServiceRequest, ExportTraceServiceResponse},
};
use prost::Message;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP OTLP server state.
#[derive(Clone)]
pub struct HttpOtelState {
    pub store: Arc<TelemetryStore>,
}

/// Create HTTP router for OTLP endpoints.
pub fn create_http_router(store: Arc<TelemetryStore>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/v1/logs", post(handle_logs_v1))
        .route("/v1/traces", post(handle_traces_v1))
        .route("/v1/metrics", post(handle_metrics_v1))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(HttpOtelState { store })
}

async fn handle_logs_v1(
    State(state): State<HttpOtelState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpError> {
    let request: ExportLogsServiceRequest = decode_request(&headers, &body)?;
    state.store.consume_logs(request.resource_logs).await;
    Ok(encode_response(&headers, &ExportLogsServiceResponse { partial_success: None }))
}

async fn handle_traces_v1(
    State(state): State<HttpOtelState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpError> {
    let request: ExportTraceServiceRequest = decode_request(&headers, &body)?;
    state.store.consume_traces(request.resource_spans).await;
    Ok(encode_response(&headers, &ExportTraceServiceResponse { partial_success: None }))
}

async fn handle_metrics_v1(
    State(state): State<HttpOtelState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpError> {
    let request: ExportMetricsServiceRequest = decode_request(&headers, &body)?;
    state.store.consume_metrics(request.resource_metrics).await;
    Ok(encode_response(&headers, &ExportMetricsServiceResponse { partial_success: None }))
}

/// Body encodings understood on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Protobuf,
    Json,
    Unknown,
}

fn media_type(value: Option<&HeaderValue>) -> Option<String> {
    let value = value?.to_str().ok()?;
    let essence = value.split(';').next()?.trim().to_ascii_lowercase();
    Some(essence)
}

fn request_encoding(headers: &HeaderMap) -> Encoding {
    match media_type(headers.get(header::CONTENT_TYPE)).as_deref() {
        Some("application/x-protobuf") | Some("application/protobuf") => Encoding::Protobuf,
        Some("application/json") => Encoding::Json,
        _ => Encoding::Unknown,
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|v| v.split(';').next().is_some_and(|t| t.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE)))
}

/// Decode an OTLP export request body
fn decode_request<T>(headers: &HeaderMap, body: &[u8]) -> Result<T, HttpError>
where
    T: Message + Default + DeserializeOwned,
{
    let decode_protobuf = |body: &[u8]| {
        T::decode(body).map_err(|e| OteluiError::protocol(format!("Failed to parse protobuf: {e}")))
    };
    let decode_json = |body: &[u8]| {
        serde_json::from_slice::<T>(body)
            .map_err(|e| OteluiError::protocol(format!("Invalid JSON: {e}")))
    };

    let decoded = match request_encoding(headers) {
        Encoding::Protobuf => decode_protobuf(body),
        Encoding::Json => decode_json(body),
        Encoding::Unknown => decode_protobuf(body).or_else(|_| decode_json(body)),
    };

    decoded.map_err(|e| {
        tracing::debug!(error = %e, category = e.category(), "Rejected OTLP/HTTP request");
        HttpError::from(e)
    })
}

/// Encode an export response in the encoding the client accepts
fn encode_response<T>(headers: &HeaderMap, message: &T) -> Response
where
    T: Message + Serialize,
{
    if wants_json(headers) {
        match serde_json::to_vec(message) {
            Ok(body) => ([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response(),
            Err(e) => HttpError::Internal(format!("Failed to encode response: {e}")).into_response(),
        }
    } else {
        ([(header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)], message.encode_to_vec()).into_response()
    }
}

/// Errors surfaced to OTLP/HTTP clients
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Internal(String),
}

impl From<OteluiError> for HttpError {
    fn from(err: OteluiError) -> Self {
        match err {
            OteluiError::Protocol(msg) => HttpError::BadRequest(msg),
            other => HttpError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, error_message).into_response()
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            HttpError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for HttpError {}
