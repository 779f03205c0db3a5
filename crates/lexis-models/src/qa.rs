//! Extractive question answering over a DistilBERT checkpoint.

use std::ops::Range;

use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module};
use candle_transformers::models::distilbert::{self, DistilBertModel};
use lexis_config::QaConfig;
use lexis_core::{Answer, PipelineError, QuestionAnswerer};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::debug;

use crate::hub::{ModelFiles, TOKENIZER_FILE};
use crate::ModelError;

/// Hidden size, read separately to size the span head.
#[derive(Deserialize)]
struct HeadConfig {
    dim: usize,
}

/// A candidate answer span over token positions, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

pub struct DistilBertQa {
    model: DistilBertModel,
    qa_outputs: Linear,
    tokenizer: Tokenizer,
    max_seq_len: usize,
    max_question_len: usize,
    doc_stride: usize,
    max_answer_len: usize,
    device: Device,
}

impl DistilBertQa {
    pub fn load(settings: &QaConfig, device: &Device) -> Result<Self, ModelError> {
        let files = ModelFiles::resolve(&settings.model_id, settings.revision.as_deref())?;
        let config: distilbert::Config = files.load_config()?;
        let head: HeadConfig = files.load_config()?;
        let tokenizer = files.load_tokenizer(TOKENIZER_FILE)?;

        let vb = files.load_weights(device)?;
        let model = DistilBertModel::load(vb.pp("distilbert"), &config)?;
        let qa_outputs = candle_nn::linear(head.dim, 2, vb.pp("qa_outputs"))?;

        Ok(Self {
            model,
            qa_outputs,
            tokenizer,
            max_seq_len: settings.max_seq_len,
            max_question_len: settings.max_question_len,
            doc_stride: settings.doc_stride,
            max_answer_len: settings.max_answer_len,
            device: device.clone(),
        })
    }

    fn run(&self, question: &str, context: &str) -> Result<Answer, ModelError> {
        let encoding = self
            .tokenizer
            .encode((question, context), true)
            .map_err(ModelError::tokenizer)?;
        let ids = encoding.get_ids();
        let sequence_ids = encoding.get_sequence_ids();
        let question_tokens = segment(&sequence_ids, 0).ok_or(ModelError::NoAnswer)?;
        let context_tokens = segment(&sequence_ids, 1).ok_or(ModelError::NoAnswer)?;

        // [CLS] question [SEP] ... [SEP], with an overlong question cut short.
        let kept_question = question_tokens.len().min(self.max_question_len);
        let mut prefix = ids[..question_tokens.start + kept_question].to_vec();
        prefix.extend_from_slice(&ids[question_tokens.end..context_tokens.start]);
        let suffix = &ids[context_tokens.end..];

        let budget = self.max_seq_len.saturating_sub(prefix.len() + suffix.len());
        let windows = context_windows(context_tokens.len(), budget, self.doc_stride);
        debug!(
            "Scoring {} context tokens in {} window(s)",
            context_tokens.len(),
            windows.len()
        );

        let scored = windows
            .into_iter()
            .map(|tokens| {
                let mut input = prefix.clone();
                input.extend_from_slice(&ids[context_tokens.start + tokens.start..context_tokens.start + tokens.end]);
                input.extend_from_slice(suffix);
                let (start_logits, end_logits) = self.span_logits(&input)?;
                let within = prefix.len()..prefix.len() + tokens.len();
                Ok(WindowLogits {
                    tokens,
                    start_logits: start_logits[within.clone()].to_vec(),
                    end_logits: end_logits[within].to_vec(),
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let span = best_windowed_span(&scored, self.max_answer_len).ok_or(ModelError::NoAnswer)?;
        let offsets = &encoding.get_offsets()[context_tokens];
        let (start, _) = offsets[span.start];
        let (_, end) = offsets[span.end];
        let text = context.get(start..end).ok_or(ModelError::NoAnswer)?;

        Ok(Answer {
            text: text.to_string(),
            score: span.score,
            start,
            end,
        })
    }

    /// Start and end logits for every position of one encoded window.
    fn span_logits(&self, ids: &[u32]) -> Result<(Vec<f32>, Vec<f32>), ModelError> {
        let len = ids.len();
        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        // Nonzero entries are masked out; a single unpadded sequence masks nothing.
        let mask = Tensor::zeros((len, len), DType::U8, &self.device)?;
        let hidden = self.model.forward(&input_ids, &mask)?;

        let logits = self.qa_outputs.forward(&hidden)?.squeeze(0)?.to_dtype(DType::F32)?;
        let start_logits = logits.narrow(1, 0, 1)?.squeeze(1)?.to_vec1::<f32>()?;
        let end_logits = logits.narrow(1, 1, 1)?.squeeze(1)?.to_vec1::<f32>()?;
        Ok((start_logits, end_logits))
    }
}

impl QuestionAnswerer for DistilBertQa {
    fn answer(&self, question: &str, context: &str) -> Result<Answer, PipelineError> {
        Ok(self.run(question, context)?)
    }
}

/// Token positions belonging to sequence `id` of an encoded pair.
fn segment(sequence_ids: &[Option<usize>], id: usize) -> Option<Range<usize>> {
    let start = sequence_ids.iter().position(|seq| *seq == Some(id))?;
    let end = sequence_ids.iter().rposition(|seq| *seq == Some(id))?;
    Some(start..end + 1)
}

/// Splits `len` context tokens into windows of at most `window` tokens.
///
/// Consecutive windows share `stride` tokens and the last one reaches the end
/// of the context.
pub fn context_windows(len: usize, window: usize, stride: usize) -> Vec<Range<usize>> {
    if len == 0 || window == 0 {
        return Vec::new();
    }
    let step = window.saturating_sub(stride).max(1);

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + window).min(len);
        windows.push(start..end);
        if end == len {
            return windows;
        }
        start += step;
    }
}

/// Span logits for the context tokens of one window.
#[derive(Debug, Clone)]
pub struct WindowLogits {
    /// Context token positions covered by the window.
    pub tokens: Range<usize>,
    pub start_logits: Vec<f32>,
    pub end_logits: Vec<f32>,
}

/// Best span across all windows, in context token positions.
///
/// Each window is scored on its own; the earlier window wins a tie.
pub fn best_windowed_span(windows: &[WindowLogits], max_answer_len: usize) -> Option<Span> {
    windows
        .iter()
        .filter_map(|window| {
            let allowed = vec![true; window.tokens.len()];
            best_span(&window.start_logits, &window.end_logits, &allowed, max_answer_len).map(|span| Span {
                start: window.tokens.start + span.start,
                end: window.tokens.start + span.end,
                score: span.score,
            })
        })
        .fold(None, |best: Option<Span>, span| match best {
            Some(b) if b.score >= span.score => Some(b),
            _ => Some(span),
        })
}

/// Softmax over the allowed positions; disallowed positions get zero.
fn masked_softmax(logits: &[f32], allowed: &[bool]) -> Vec<f32> {
    let max = logits
        .iter()
        .zip(allowed)
        .filter(|(_, ok)| **ok)
        .map(|(l, _)| *l)
        .fold(f32::NEG_INFINITY, f32::max);

    let exps: Vec<f32> = logits
        .iter()
        .zip(allowed)
        .map(|(l, ok)| if *ok { (l - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}

/// Picks the span maximizing `p_start * p_end` among allowed positions.
///
/// Spans run forward and are at most `max_answer_len` tokens long.
pub fn best_span(
    start_logits: &[f32],
    end_logits: &[f32],
    allowed: &[bool],
    max_answer_len: usize,
) -> Option<Span> {
    let len = start_logits.len().min(end_logits.len()).min(allowed.len());
    let allowed = &allowed[..len];
    let start_probs = masked_softmax(&start_logits[..len], allowed);
    let end_probs = masked_softmax(&end_logits[..len], allowed);

    let mut best: Option<Span> = None;
    for start in (0..len).filter(|&i| allowed[i]) {
        let last = (start + max_answer_len).min(len);
        for end in (start..last).filter(|&i| allowed[i]) {
            let score = start_probs[start] * end_probs[end];
            if best.map_or(true, |b| score > b.score) {
                best = Some(Span { start, end, score });
            }
        }
    }
    best
}
