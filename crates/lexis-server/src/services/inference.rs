//! Runs pipeline calls off the async workers.

use std::sync::Arc;

use lexis_core::PipelineError;
use tracing::error;

use crate::error::AppError;

/// Runs `call` against `pipeline` on the blocking pool and waits for it.
///
/// Inference failures are logged and become [`AppError::Internal`] carrying
/// the error message.
pub async fn run<T, R, F>(task: &'static str, pipeline: Arc<T>, call: F) -> Result<R, AppError>
where
    T: ?Sized + Send + Sync + 'static,
    R: Send + 'static,
    F: FnOnce(&T) -> Result<R, PipelineError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || call(&*pipeline))
        .await
        .map_err(|e| {
            error!("{} task failed to complete: {}", task, e);
            AppError::from(e)
        })?;

    result.map_err(|e| {
        error!("{} error: {}", task, e);
        AppError::from(e)
    })
}
