// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use tracing::warn;
use wellcp_core::WcpError;

/// A successful value together with the attempt that produced it (1-based).
#[derive(Clone, Debug, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: usize,
}

/// Runs `attempt` until it succeeds, up to `max_attempts` times.
///
/// `attempt` receives the 1-based attempt number. Only retryable errors
/// (see [`WcpError::is_retryable`]) trigger another attempt; anything else is
/// returned as-is. When every attempt fails the result is
/// [`WcpError::RetriesExhausted`] carrying the last failure.
pub fn retry_bounded<T, F>(max_attempts: usize, mut attempt: F) -> Result<Attempted<T>, WcpError>
where
    F: FnMut(usize) -> Result<T, WcpError>,
{
    if max_attempts == 0 {
        return Err(WcpError::invalid_input("max_attempts must be >= 1"));
    }

    let mut last = None;
    for n in 1..=max_attempts {
        match attempt(n) {
            Ok(value) => return Ok(Attempted { value, attempts: n }),
            Err(err) if err.is_retryable() => {
                warn!(attempt = n, max_attempts, error = %err, "attempt failed; retrying");
                last = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    let last = last.unwrap_or_else(|| WcpError::numerical_issue("no attempt recorded"));
    Err(WcpError::retries_exhausted(max_attempts, last))
}
