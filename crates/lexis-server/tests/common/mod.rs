#![allow(dead_code)]

use std::thread;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use lexis_core::{Answer, PipelineError, QuestionAnswerer, SummaryParams, Summarizer, Translator};
use serde_json::Value;
use tower::ServiceExt;

/// Echoes its input back, tagged, after a short delay.
pub struct TaggingSummarizer;

impl Summarizer for TaggingSummarizer {
    fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String, PipelineError> {
        thread::sleep(Duration::from_millis(5));
        Ok(format!("[{}] {}", params.max_length, text))
    }
}

/// Always returns the same summary.
pub struct FixedSummarizer(pub String);

impl Summarizer for FixedSummarizer {
    fn summarize(&self, _text: &str, _params: &SummaryParams) -> Result<String, PipelineError> {
        Ok(self.0.clone())
    }
}

pub struct FailingSummarizer;

impl Summarizer for FailingSummarizer {
    fn summarize(&self, _text: &str, _params: &SummaryParams) -> Result<String, PipelineError> {
        Err(PipelineError::Inference("index out of range".into()))
    }
}

pub struct UpperTranslator;

impl Translator for UpperTranslator {
    fn translate(&self, text: &str) -> Result<String, PipelineError> {
        Ok(text.to_uppercase())
    }
}

/// Answers with the last word of the context.
pub struct LastWordQa;

impl QuestionAnswerer for LastWordQa {
    fn answer(&self, _question: &str, context: &str) -> Result<Answer, PipelineError> {
        let word = context
            .split_whitespace()
            .last()
            .ok_or_else(|| PipelineError::InvalidInput("empty context".into()))?;
        let start = context.rfind(word).unwrap_or(0);
        Ok(Answer {
            text: word.to_string(),
            score: 1.0,
            start,
            end: start + word.len(),
        })
    }
}

pub async fn send_raw(app: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(raw) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(raw.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_raw(app, "POST", uri, Some(&body.to_string())).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send_raw(app, "GET", uri, None).await
}
