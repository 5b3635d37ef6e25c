//! Per-command cancellation and deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a guarded call was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    /// The caller cancelled the command.
    #[error("command cancelled by caller")]
    Cancelled,
    /// The command deadline passed.
    #[error("command deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token and optional deadline carried by every command.
///
/// Adapter calls made before the store commit race this context. Once the
/// store has committed, the remaining steps ignore it.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CommandContext {
    /// Context that is never cancelled and has no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context cancelled through `token`.
    #[must_use]
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Set a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel the command.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the token is cancelled or the deadline has passed.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.checkpoint().is_err()
    }

    /// Fail fast if the command was cancelled or ran out of time.
    ///
    /// # Errors
    ///
    /// Returns the interruption reason.
    pub fn checkpoint(&self) -> Result<(), Interrupted> {
        if self.token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Interrupted::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run `fut` unless the command is cancelled or its deadline passes first.
    ///
    /// # Errors
    ///
    /// Returns the interruption reason; `fut` is dropped in that case.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        self.checkpoint()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Interrupted::Cancelled),
            () = deadline => Err(Interrupted::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}
