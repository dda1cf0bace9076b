//! Cooperative cancellation
//!
//! A status call polls its [`CancelHandle`] at well-defined checkpoints:
//! between index entries in the parser, at every directory step of the
//! walker, and between entries in the tracked comparator. In-progress
//! file I/O always completes before the flag is observed.

use crate::error::{Result, StatusError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable cancellation flag shared between a caller and a running
/// status call. Timeouts are the caller's job: spawn a timer that calls
/// [`CancelHandle::cancel`] when it elapses.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Checkpoint helper: error out if the flag has been raised.
    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(StatusError::Cancelled)
        } else {
            Ok(())
        }
    }
}
