// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::WcpError;
use crate::control::CancelToken;
use crate::observability::ProgressSink;
use std::time::{Duration, Instant};

/// Execution context passed through detector calls.
///
/// Holds only borrowed, read-only hooks; a context is cheap to copy into
/// each worker.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub cancel: Option<&'a CancelToken>,
    pub deadline: Option<Instant>,
    pub progress: Option<&'a dyn ProgressSink>,
}

impl Default for ExecutionContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with no cancellation, deadline, or progress hooks.
    pub fn new() -> Self {
        Self {
            cancel: None,
            deadline: None,
            progress: None,
        }
    }

    /// Sets the optional cancellation token.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an optional progress sink.
    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Returns true when cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    /// Returns an error when cancellation was requested or the deadline passed.
    pub fn check_cancelled(&self) -> Result<(), WcpError> {
        if self.is_cancelled() {
            return Err(WcpError::cancelled());
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(WcpError::resource_limit("deadline exceeded"));
            }
        }
        Ok(())
    }

    /// Checks cancellation every `every` iterations.
    ///
    /// When `every` is zero, it is treated as one (always poll).
    pub fn check_cancelled_every(&self, iteration: usize, every: usize) -> Result<(), WcpError> {
        let every = every.max(1);
        if iteration % every != 0 {
            return Ok(());
        }
        self.check_cancelled()
    }

    /// Emits clamped progress to the sink, if configured.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }

        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionContext;
    use crate::WcpError;
    use crate::control::CancelToken;
    use crate::observability::ProgressSink;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct MockProgressSink {
        values: Mutex<Vec<f32>>,
    }

    impl ProgressSink for MockProgressSink {
        fn on_progress(&self, fraction: f32) {
            self.values
                .lock()
                .expect("progress mutex should lock")
                .push(fraction);
        }
    }

    #[test]
    fn new_context_has_no_hooks() {
        let ctx = ExecutionContext::new();
        assert!(ctx.cancel.is_none());
        assert!(ctx.deadline.is_none());
        assert!(ctx.progress.is_none());
        assert!(ctx.check_cancelled().is_ok());
    }

    #[test]
    fn cancellation_is_reported_as_cancelled() {
        let cancel = CancelToken::new();
        let ctx = ExecutionContext::new().with_cancel(&cancel);
        assert!(ctx.check_cancelled().is_ok());
        cancel.cancel();
        assert_eq!(ctx.check_cancelled(), Err(WcpError::Cancelled));
    }

    #[test]
    fn past_deadline_is_a_resource_limit() {
        let ctx = ExecutionContext::new().with_deadline(Instant::now() - Duration::from_millis(1));
        let err = ctx.check_cancelled().expect_err("deadline should trip");
        assert_eq!(err.code(), "resource_limit");
        assert!(err.to_string().contains("deadline exceeded"));
    }

    #[test]
    fn timeout_sets_a_deadline_relative_to_now() {
        let before = Instant::now();
        let ctx = ExecutionContext::new().with_timeout(Duration::from_secs(60));
        let deadline = ctx.deadline.expect("timeout should set a deadline");
        assert!(deadline >= before + Duration::from_secs(60));
        assert!(ctx.check_cancelled().is_ok());

        let expired = ExecutionContext::new().with_timeout(Duration::ZERO);
        assert_eq!(expired.check_cancelled().map_err(|err| err.code()), Err("resource_limit"));
    }

    #[test]
    fn check_cancelled_every_only_polls_on_multiples() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = ExecutionContext::new().with_cancel(&cancel);
        assert!(ctx.check_cancelled_every(3, 4).is_ok());
        assert!(ctx.check_cancelled_every(4, 4).is_err());
        assert!(ctx.check_cancelled_every(7, 0).is_err());
    }

    #[test]
    fn report_progress_clamps_and_skips_non_finite() {
        let sink = MockProgressSink::default();
        let ctx = ExecutionContext::new().with_progress_sink(&sink);
        ctx.report_progress(-0.5);
        ctx.report_progress(0.5);
        ctx.report_progress(2.0);
        ctx.report_progress(f32::NAN);
        let values = sink.values.lock().expect("progress mutex should lock");
        assert_eq!(values.as_slice(), &[0.0, 0.5, 1.0]);
    }
}
