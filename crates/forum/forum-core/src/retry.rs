use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use tracing::debug;

use crate::error::{ForumError, ForumResult};

/// Attempts a read-modify-write cycle gets before a revision conflict is surfaced
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Run `op` until it stops failing with a revision conflict, at most `max_attempts` times.
///
/// `op` must re-read whatever it writes on every call. Errors other than
/// `VersionConflict` are permanent and returned immediately.
pub async fn retry_on_conflict<T, F, Fut>(max_attempts: usize, mut op: F) -> ForumResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ForumResult<T>>,
{
    // Short waits between conflicting writers
    let policy = ExponentialBackoff {
        initial_interval: Duration::from_millis(5),
        max_interval: Duration::from_millis(100),
        max_elapsed_time: Some(Duration::from_secs(2)),
        ..Default::default()
    };

    let mut attempt = 0;
    backoff::future::retry(policy, move || {
        attempt += 1;
        let current = attempt;
        let fut = op();

        async move {
            match fut.await {
                Ok(value) => Ok(value),
                Err(ForumError::VersionConflict(id)) if current < max_attempts => {
                    debug!(id = %id, attempt = current, "Revision conflict, retrying from a fresh read");
                    Err(backoff::Error::transient(ForumError::VersionConflict(id)))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        }
    })
    .await
}
