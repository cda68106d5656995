// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

/// Workspace-wide error type.
#[derive(Clone, Debug, PartialEq)]
pub enum WcpError {
    /// Caller-supplied data or parameters are invalid.
    InvalidInput(String),
    /// A recursive numeric update produced an undefined value.
    NumericalIssue(String),
    /// Requested format or mode is not supported.
    NotSupported(String),
    /// A size, time, or counter limit was exceeded.
    ResourceLimit(String),
    /// Cancellation was requested through a [`crate::CancelToken`].
    Cancelled,
    /// Every attempt of a bounded retry loop failed.
    RetriesExhausted { attempts: usize, last: Box<WcpError> },
    /// A single well of a batch failed.
    WellFailed { well: usize, source: Box<WcpError> },
}

impl WcpError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    pub fn resource_limit(msg: impl Into<String>) -> Self {
        Self::ResourceLimit(msg.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    pub fn retries_exhausted(attempts: usize, last: WcpError) -> Self {
        Self::RetriesExhausted {
            attempts,
            last: Box::new(last),
        }
    }

    pub fn well_failed(well: usize, source: WcpError) -> Self {
        Self::WellFailed {
            well,
            source: Box::new(source),
        }
    }

    /// Returns true for failures that a fresh model instance may not hit again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NumericalIssue(_))
    }

    /// Stable machine-readable code for envelopes and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NumericalIssue(_) => "numerical_issue",
            Self::NotSupported(_) => "not_supported",
            Self::ResourceLimit(_) => "resource_limit",
            Self::Cancelled => "cancelled",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::WellFailed { source, .. } => source.code(),
        }
    }
}

impl fmt::Display for WcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NumericalIssue(msg) => write!(f, "numerical issue: {msg}"),
            Self::NotSupported(msg) => write!(f, "not supported: {msg}"),
            Self::ResourceLimit(msg) => write!(f, "resource limit: {msg}"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::RetriesExhausted { attempts, last } => {
                write!(f, "all {attempts} attempts failed; last error: {last}")
            }
            Self::WellFailed { well, source } => write!(f, "well {well}: {source}"),
        }
    }
}

impl std::error::Error for WcpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RetriesExhausted { last, .. } => Some(last.as_ref()),
            Self::WellFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
