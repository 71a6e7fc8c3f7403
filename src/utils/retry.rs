use std::fmt;
use std::future::Future;
use std::time::Duration;

// ============================================================================
// Transient-Failure Retry
// ============================================================================
//
// Order store writes go through `retry_on_transient`. Errors classify
// themselves through `IsTransient`; anything permanent stops the loop at once,
// transient failures back off exponentially up to `delay_cap`.
//
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Attempts in total, the first one included
    pub max_attempts: u32,
    pub first_delay: Duration,
    pub delay_cap: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            first_delay: Duration::from_millis(200),
            delay_cap: Duration::from_secs(5),
            backoff_factor: 2,
        }
    }
}

impl RetryConfig {
    /// Fail on the first error
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Pauses taken between attempts, one fewer than `max_attempts`
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.first_delay.min(self.delay_cap)), move |previous| {
            Some(previous.saturating_mul(self.backoff_factor).min(self.delay_cap))
        })
        .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed transiently; holds the last error
    Exhausted { attempts: u32, last: E },
    Permanent(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Permanent(error) => error,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last } => write!(f, "gave up after {attempts} attempts: {last}"),
            RetryError::Permanent(error) => write!(f, "{error}"),
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of attempts.
/// The closure receives the 1-based attempt number.
pub async fn retry_on_transient<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display + IsTransient,
{
    let mut delays = config.delays();
    let mut attempt = 1;

    loop {
        let error = match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Succeeded on retry");
                }
                return Ok(value);
            }
            Err(error) if !error.is_transient() => {
                tracing::error!(attempt, error = %error, "Permanent failure, not retrying");
                return Err(RetryError::Permanent(error));
            }
            Err(error) => error,
        };

        let Some(delay) = delays.next() else {
            tracing::error!(attempts = attempt, error = %error, "Retries exhausted");
            return Err(RetryError::Exhausted { attempts: attempt, last: error });
        };

        tracing::warn!(attempt, error = %error, delay_ms = delay.as_millis() as u64, "Transient failure, backing off");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
