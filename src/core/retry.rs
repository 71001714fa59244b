//! Retry utility for advisory responses from the hosting API
//!
//! Only errors that report themselves as transient are retried; everything
//! else is returned to the caller on the first failure.

use std::time::Duration;
use tokio::time::sleep;

/// Errors that may succeed when the same request is repeated
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Configurable retry policy for async operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Execute an async operation, repeating it while it fails with a transient error
///
/// # Examples
/// ```rust
/// use secretsweep::core::retry::{retry_async, RetryPolicy, Transient};
///
/// #[derive(Debug)]
/// struct Busy;
/// impl std::fmt::Display for Busy {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "busy")
///     }
/// }
/// impl Transient for Busy {
///     fn is_transient(&self) -> bool { true }
/// }
///
/// # async fn example() -> Result<u32, Busy> {
/// let value = retry_async("list page", RetryPolicy::default(), || async { Ok::<u32, Busy>(1) }).await?;
/// # Ok(value)
/// # }
/// ```
pub async fn retry_async<F, T, E, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + Transient,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) if error.is_transient() && attempt < max_attempts => {
                log::warn!(
                    "'{}' attempt {}/{} was not served, retrying in {:?}: {}",
                    operation_name,
                    attempt,
                    max_attempts,
                    policy.delay,
                    error
                );
                sleep(policy.delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}
