use crate::error::Cancelled;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Context handed to every hook invocation.
///
/// Carries a cancellation token and an optional deadline. The dispatcher never
/// enforces the deadline itself; hooks that block on I/O should race their work
/// against [`HookContext::cancelled`].
///
/// A hook that gives up because the context ended should return the
/// [`Cancelled`] marker (for instance through [`HookContext::check`]). Any other
/// error is reported as a rejection, even if the deadline has passed by then.
#[derive(Clone, Debug)]
pub struct HookContext {
    /// Token to check for cancellation/shutdown requests.
    pub cancellation_token: CancellationToken,

    deadline: Option<Instant>,
}

impl HookContext {
    pub fn new(cancellation_token: CancellationToken) -> Self {
        Self {
            cancellation_token,
            deadline: None,
        }
    }

    /// A context that is only cancelled if someone cancels its token.
    pub fn background() -> Self {
        Self::new(CancellationToken::new())
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context whose token is cancelled together with this one but can
    /// also be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            cancellation_token: self.cancellation_token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check if cancellation has been requested or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns `Err(Cancelled)` once the context is done. Meant to be used with `?`
    /// inside hooks.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Completes when the token is cancelled or the deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancellation_token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancellation_token.cancelled().await,
        }
    }
}

impl Default for HookContext {
    fn default() -> Self {
        Self::background()
    }
}
