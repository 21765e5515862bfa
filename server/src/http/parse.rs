use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::HttpState;
use crate::error::ApiError;

/// Response body of `POST /parse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResponse {
    pub ok: bool,
    pub queries_received: usize,
    pub exprs: Vec<String>,
    pub metrics: Vec<String>,
    pub metrics_count: usize,
    /// One entry per expression, empty when it parsed.
    pub parse_errors_by_idx: Vec<String>,
}

impl ParseResponse {
    pub fn new(exprs: Vec<String>, metrics: Vec<String>, errors: Vec<String>) -> Self {
        Self {
            ok: true,
            queries_received: exprs.len(),
            metrics_count: metrics.len(),
            exprs,
            metrics,
            parse_errors_by_idx: errors,
        }
    }
}

/// Decodes a JSON array of strings from the first JSON value of `body`.
///
/// A `null` body is an empty batch and a `null` element is an empty expression.
/// Anything after the first value is ignored.
pub fn decode_exprs(body: &[u8]) -> Result<Vec<String>, ApiError> {
    let mut de = serde_json::Deserializer::from_slice(body);
    let exprs: Option<Vec<Option<String>>> =
        Deserialize::deserialize(&mut de).map_err(ApiError::InvalidBody)?;
    Ok(exprs
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

pub async fn parse_handler(
    State(state): State<HttpState>,
    body: Bytes,
) -> Result<Json<ParseResponse>, ApiError> {
    let exprs = decode_exprs(&body).inspect_err(|e| {
        warn!(error = ?e, body_bytes = body.len(), "rejected /parse request");
    })?;

    let (metrics, errors) = state.extractor.extract(&exprs).into_parts();
    debug!(
        exprs = exprs.len(),
        metrics = metrics.len(),
        "extracted metric names"
    );

    Ok(Json(ParseResponse::new(exprs, metrics, errors)))
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}
