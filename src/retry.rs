//! Retry strategies and predicates for network faults.
//!
//! The transport only retries failures that never produced an HTTP response.
//! [`RetryStrategy`] decides how long to wait between attempts and when to
//! give up; [`RetryPredicate`] decides which errors are worth another attempt.

use crate::Error;
use rand::Rng;
use std::time::Duration;

/// Defines when and how to retry failed requests.
///
/// # Examples
///
/// ```
/// use intacct_link::RetryStrategy;
/// use std::time::Duration;
///
/// // 1s, 3s, 9s, 27s, then give up after the fifth attempt
/// let backoff = RetryStrategy::ExponentialBackoff {
///     initial_delay: Duration::from_secs(1),
///     multiplier: 3,
///     max_delay: Duration::from_secs(60),
///     max_retries: 4,
///     jitter: false,
/// };
/// assert_eq!(backoff.delay_for_attempt(3), Some(Duration::from_secs(9)));
/// assert_eq!(backoff.delay_for_attempt(5), None);
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Do not retry failed requests.
    #[default]
    None,

    /// Retry with exponentially increasing delays.
    ///
    /// Each retry waits for `initial_delay * multiplier^(attempt - 1)`, capped
    /// at `max_delay`. Optional jitter scales the delay by a random factor
    /// between 0.5 and 1.0.
    ExponentialBackoff {
        /// The delay before the first retry.
        initial_delay: Duration,
        /// Growth factor between consecutive delays.
        multiplier: u32,
        /// The maximum delay between retries.
        max_delay: Duration,
        /// The maximum number of retries after the first attempt.
        max_retries: usize,
        /// Whether to add random jitter to delays.
        jitter: bool,
    },

    /// Retry with a fixed delay between attempts.
    Linear {
        /// The delay between retry attempts.
        delay: Duration,
        /// The maximum number of retries after the first attempt.
        max_retries: usize,
    },
}

impl RetryStrategy {
    /// The strategy clients use unless told otherwise: five attempts in total,
    /// backing off by a factor of three from one second.
    pub fn network_default() -> Self {
        RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_secs(1),
            multiplier: 3,
            max_delay: Duration::from_secs(60),
            max_retries: 4,
            jitter: true,
        }
    }

    /// Returns the delay after the given failed attempt, or `None` if retries
    /// are exhausted.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt that just failed (1-indexed)
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                multiplier,
                max_delay,
                max_retries,
                jitter,
            } => {
                if attempt > *max_retries {
                    return None;
                }

                let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                let factor = multiplier.saturating_pow(exponent);
                let delay = initial_delay.saturating_mul(factor).min(*max_delay);

                if *jitter {
                    let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
                    Some(delay.mul_f64(jitter_factor))
                } else {
                    Some(delay)
                }
            }
            RetryStrategy::Linear { delay, max_retries } => {
                if attempt > *max_retries {
                    None
                } else {
                    Some(*delay)
                }
            }
        }
    }

    /// Returns the maximum number of retries.
    pub fn max_retries(&self) -> usize {
        match self {
            RetryStrategy::None => 0,
            RetryStrategy::ExponentialBackoff { max_retries, .. } => *max_retries,
            RetryStrategy::Linear { max_retries, .. } => *max_retries,
        }
    }
}

/// Trait for determining whether a failed attempt should be retried.
///
/// # Examples
///
/// ```
/// use intacct_link::{Error, RetryPredicate};
///
/// struct FirstAttemptOnly;
///
/// impl RetryPredicate for FirstAttemptOnly {
///     fn should_retry(&self, error: &Error, attempt: usize) -> bool {
///         attempt == 1 && error.is_retryable()
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Determines whether the request should be retried based on the error.
    ///
    /// # Arguments
    ///
    /// * `error` - The error that occurred
    /// * `attempt` - The attempt number (1-indexed)
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry every error marked as retryable (network faults and timeouts).
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}

/// Retry only on timeout errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTimeout;

impl RetryPredicate for RetryOnTimeout {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Timeout)
    }
}
