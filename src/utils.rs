use crate::error::{AppError, AppResult};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task;

pub async fn run_blocking<F, T>(func: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(func).await {
        Ok(Ok(res)) => Ok(res),
        Ok(Err(e)) => Err(e),
        Err(e) => Err(AppError::from(e)),
    }
}

/// Takes a permit when the crawl is bounded; `None` means no limit.
pub async fn acquire_permit(
    semaphore: Option<&Arc<Semaphore>>,
    context: &str,
) -> AppResult<Option<OwnedSemaphorePermit>> {
    match semaphore {
        Some(sem) => sem
            .clone()
            .acquire_owned()
            .await
            .map(Some)
            .map_err(|e| AppError::SemaphoreAcquire(format!("Failed for '{}': {}", context, e))),
        None => Ok(None),
    }
}
