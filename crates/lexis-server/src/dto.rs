use serde::{Deserialize, Serialize};

// === Requests ===

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: Option<String>,
    pub max_chars: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct QaRequest {
    pub question: Option<String>,
    pub context: Option<String>,
}

// === Responses ===

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Summary plus character counts of input and output.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub summary: String,
    pub original_length: usize,
    pub summary_length: usize,
}

#[derive(Debug, Serialize)]
pub struct TranslationResponse {
    pub translation: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub summarizer_available: bool,
}

#[derive(Debug, Serialize)]
pub struct NlpHealthResponse {
    pub status: &'static str,
    pub summarizer_available: bool,
    pub translator_available: bool,
    pub qa_available: bool,
}
