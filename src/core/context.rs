/// Cancellation Context Module
///
/// A [`Context`] is the cancellation and deadline token that every
/// store-facing call receives. Pipelines forward it to the store untouched;
/// stores check it before submitting work and while streaming, and report a
/// cancelled context as an ordinary error.
use crate::core::{Result, SqlRangeError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation and deadline token.
///
/// Derived contexts inherit every cancellation signal and the earliest
/// deadline of their parent.
#[derive(Debug, Clone, Default)]
pub struct Context {
    signals: Vec<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

/// Cancels the context it was created with, and every context derived from it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    signal: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.signal.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.load(Ordering::Acquire)
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Context::default()
    }

    /// Derives a context that is cancelled when the returned handle fires.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        let signal = Arc::new(AtomicBool::new(false));
        let mut child = self.clone();
        child.signals.push(Arc::clone(&signal));
        (child, CancelHandle { signal })
    }

    /// Derives a context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Context {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context that expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Context {
        let mut child = self.clone();
        child.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        child
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails with [`SqlRangeError::Cancelled`] or
    /// [`SqlRangeError::DeadlineExceeded`] once the context is done.
    pub fn check(&self) -> Result<()> {
        if self.signals.iter().any(|s| s.load(Ordering::Acquire)) {
            return Err(SqlRangeError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SqlRangeError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
