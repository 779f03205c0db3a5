//! Summarization, translation and question-answering handlers.
//!
//! A pipeline that failed to load answers 503.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use lexis_core::text::char_len;
use tracing::info;

use crate::dto::{
    AnswerResponse, NlpHealthResponse, QaRequest, SummaryResponse, TextRequest, TranslationResponse,
};
use crate::error::AppError;
use crate::handlers::{require, STATUS_HEALTHY};
use crate::services::inference;
use crate::ServerState;

const NO_TEXT: &str = "No text provided";
const NO_QUESTION: &str = "No question provided";
const NO_CONTEXT: &str = "No context provided";

fn unavailable(task: &str) -> AppError {
    AppError::Unavailable(format!("{} service is not available.", task))
}

/// POST /summarize
pub async fn summarize(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Json(req) = payload?;
    let text = require(req.text, NO_TEXT)?;
    let summarizer = state.summarizer.get().ok_or_else(|| unavailable("Summarization"))?;

    info!("Summarizing text of length: {}", char_len(&text));
    let params = state.summary_params;
    let summary = inference::run("summarization", summarizer, move |s| s.summarize(&text, &params)).await?;

    Ok(Json(SummaryResponse { summary }))
}

/// POST /translate
pub async fn translate(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<TranslationResponse>, AppError> {
    let Json(req) = payload?;
    let text = require(req.text, NO_TEXT)?;
    let translator = state.translator.get().ok_or_else(|| unavailable("Translation"))?;

    info!("Translating text of length: {}", char_len(&text));
    let translation = inference::run("translation", translator, move |t| t.translate(&text)).await?;

    Ok(Json(TranslationResponse { translation }))
}

/// POST /qa
pub async fn qa(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<QaRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, AppError> {
    let Json(req) = payload?;
    let question = require(req.question, NO_QUESTION)?;
    let context = require(req.context, NO_CONTEXT)?;
    let qa = state.qa.get().ok_or_else(|| unavailable("Question answering"))?;

    info!("Answering question over context of length: {}", char_len(&context));
    let answer = inference::run("question-answering", qa, move |q| q.answer(&question, &context)).await?;

    Ok(Json(AnswerResponse { answer: answer.text }))
}

/// GET /health
pub async fn health(State(state): State<Arc<ServerState>>) -> Json<NlpHealthResponse> {
    Json(NlpHealthResponse {
        status: STATUS_HEALTHY,
        summarizer_available: state.summarizer.is_available(),
        translator_available: state.translator.is_available(),
        qa_available: state.qa.is_available(),
    })
}
