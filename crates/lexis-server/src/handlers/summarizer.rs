//! Handlers for the standalone summarizer service.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use lexis_core::text::{char_len, truncate_summary};
use tracing::{info, warn};

use crate::dto::{HealthResponse, SummarizeRequest, SummaryReport};
use crate::error::AppError;
use crate::handlers::{require, STATUS_HEALTHY};
use crate::services::inference;
use crate::ServerState;

/// Returned as the summary when the model failed to load.
pub const UNAVAILABLE_SUMMARY: &str = "Summarization service is not available.";

/// POST /summarize
pub async fn summarize(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummaryReport>, AppError> {
    let Json(req) = payload?;
    let text = require(req.text, "No text provided")?;
    let original_length = char_len(&text);
    info!("Summarizing text of length: {}", original_length);

    let summary = match state.summarizer.get() {
        Some(summarizer) => {
            let params = state.summary_params;
            let raw = inference::run("summarization", summarizer, move |s| s.summarize(&text, &params)).await?;
            truncate_summary(raw, req.max_chars)
        }
        None => {
            warn!("Summarizer unavailable: {}", state.summarizer.reason().unwrap_or_default());
            UNAVAILABLE_SUMMARY.to_string()
        }
    };

    Ok(Json(SummaryReport {
        original_length,
        summary_length: char_len(&summary),
        summary,
    }))
}

/// GET /health
pub async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: STATUS_HEALTHY,
        summarizer_available: state.summarizer.is_available(),
    })
}
