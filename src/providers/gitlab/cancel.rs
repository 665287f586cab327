use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::error::{GitLabMcpError, Result};

/// Caller-controlled cancellation flag shared between a request and its
/// tool invocation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `Cancelled` once the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GitLabMcpError::Cancelled { partial: None })
        } else {
            Ok(())
        }
    }
}
