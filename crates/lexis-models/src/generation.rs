//! Deterministic greedy decoding shared by the encoder-decoder pipelines.

use std::sync::{Mutex, MutexGuard, PoisonError};

use candle_core::{DType, Tensor};
use lexis_core::SummaryParams;

use crate::ModelError;

/// Bounds on generated tokens, excluding the decoder start token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeBudget {
    /// End-of-sequence is suppressed until this many tokens were generated.
    pub min_new_tokens: usize,
    pub max_new_tokens: usize,
}

impl DecodeBudget {
    pub fn up_to(max_new_tokens: usize) -> Self {
        Self {
            min_new_tokens: 0,
            max_new_tokens,
        }
    }
}

// `max_length` and `min_length` count the decoder start token.
impl From<&SummaryParams> for DecodeBudget {
    fn from(params: &SummaryParams) -> Self {
        Self {
            min_new_tokens: params.min_length.saturating_sub(1),
            max_new_tokens: params.max_length.saturating_sub(1),
        }
    }
}

/// Locks a decoder for one generation.
///
/// Callers reset the KV cache before decoding, so a guard left behind by a
/// panicked generation is still usable.
pub(crate) fn lock_decoder<M>(model: &Mutex<M>) -> MutexGuard<'_, M> {
    model.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Index of the largest logit, skipping `suppressed` ids and NaN.
///
/// Ties go to the lowest index.
pub fn greedy_token(logits: &[f32], suppressed: &[u32]) -> Option<u32> {
    logits
        .iter()
        .enumerate()
        .filter(|(i, v)| !v.is_nan() && !suppressed.contains(&(*i as u32)))
        .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(i, _)| i as u32)
}

/// Logits of the last decoder position for a batch of one.
pub fn last_logits(logits: &Tensor) -> Result<Vec<f32>, ModelError> {
    let vocab = logits.dims().last().copied().unwrap_or(0);
    let flat = logits.flatten_all()?.to_dtype(DType::F32)?.to_vec1::<f32>()?;
    Ok(flat[flat.len().saturating_sub(vocab)..].to_vec())
}

/// Runs a greedy decoding loop.
///
/// `step` receives every token so far (start token first) and returns the
/// next-token logits. The returned tokens exclude the start token and the
/// terminating end-of-sequence token.
pub fn greedy_decode<F>(
    start_token: u32,
    eos_tokens: &[u32],
    always_suppressed: &[u32],
    budget: DecodeBudget,
    mut step: F,
) -> Result<Vec<u32>, ModelError>
where
    F: FnMut(&[u32]) -> Result<Vec<f32>, ModelError>,
{
    let mut tokens = vec![start_token];

    while tokens.len() - 1 < budget.max_new_tokens {
        let logits = step(&tokens)?;

        let mut suppressed = always_suppressed.to_vec();
        if tokens.len() - 1 < budget.min_new_tokens {
            suppressed.extend_from_slice(eos_tokens);
        }

        let Some(next) = greedy_token(&logits, &suppressed) else {
            break;
        };
        if eos_tokens.contains(&next) {
            break;
        }
        tokens.push(next);
    }

    Ok(tokens.split_off(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use std::sync::Arc;
    use std::thread;

    const EOS: u32 = 1;

    fn one_hot(vocab: usize, hot: u32) -> Vec<f32> {
        let mut logits = vec![0.0; vocab];
        logits[hot as usize] = 10.0;
        logits
    }

    #[test]
    fn test_greedy_token_argmax() {
        assert_eq!(greedy_token(&[0.1, 2.0, -1.0], &[]), Some(1));
        assert_eq!(greedy_token(&[0.1, 2.0, -1.0], &[1]), Some(0));
        assert_eq!(greedy_token(&[3.0, 3.0], &[]), Some(0));
        assert_eq!(greedy_token(&[f32::NAN, 0.5], &[]), Some(1));
        assert_eq!(greedy_token(&[], &[]), None);
    }

    #[test]
    fn test_budget_from_summary_params() {
        let budget = DecodeBudget::from(&SummaryParams::default());
        assert_eq!(budget.min_new_tokens, 29);
        assert_eq!(budget.max_new_tokens, 129);
    }

    #[test]
    fn test_decode_stops_at_eos() {
        let script = [5u32, 6, EOS, 7];
        let tokens = greedy_decode(0, &[EOS], &[], DecodeBudget::up_to(10), |seen| {
            Ok(one_hot(8, script[seen.len() - 1]))
        })
        .unwrap();
        assert_eq!(tokens, vec![5, 6]);
    }

    #[test]
    fn test_decode_respects_max() {
        let tokens = greedy_decode(0, &[EOS], &[], DecodeBudget::up_to(3), |_| Ok(one_hot(8, 4))).unwrap();
        assert_eq!(tokens, vec![4, 4, 4]);
    }

    #[test]
    fn test_decode_suppresses_early_eos() {
        // EOS is always the top logit; the runner-up is token 2.
        let budget = DecodeBudget {
            min_new_tokens: 2,
            max_new_tokens: 10,
        };
        let tokens = greedy_decode(0, &[EOS], &[], budget, |_| {
            let mut logits = one_hot(4, EOS);
            logits[2] = 5.0;
            Ok(logits)
        })
        .unwrap();
        assert_eq!(tokens, vec![2, 2]);
    }

    #[test]
    fn test_decode_always_suppressed() {
        let tokens = greedy_decode(0, &[EOS], &[3], DecodeBudget::up_to(2), |_| {
            let mut logits = one_hot(4, 3);
            logits[2] = 1.0;
            Ok(logits)
        })
        .unwrap();
        assert_eq!(tokens, vec![2, 2]);
    }

    #[test]
    fn test_last_logits_takes_final_position() {
        let logits = Tensor::new(&[[[1f32, 2., 3.], [4., 5., 6.]]], &Device::Cpu).unwrap();
        assert_eq!(last_logits(&logits).unwrap(), vec![4., 5., 6.]);

        let flat = Tensor::new(&[[7f32, 8.]], &Device::Cpu).unwrap();
        assert_eq!(last_logits(&flat).unwrap(), vec![7., 8.]);
    }

    #[test]
    fn test_lock_decoder_recovers_after_panic() {
        let model = Arc::new(Mutex::new(vec![7u32]));
        let poisoned = Arc::clone(&model);
        let result = thread::spawn(move || {
            let mut cache = poisoned.lock().unwrap();
            cache.push(8);
            panic!("decode step failed");
        })
        .join();
        assert!(result.is_err());
        assert!(model.is_poisoned());

        let mut cache = lock_decoder(&model);
        cache.clear();
        cache.push(9);
        drop(cache);
        assert_eq!(*lock_decoder(&model), vec![9]);
    }
}
