//! Cancellation and deadlines for store calls.
//!
//! Every [`RecordStore`](crate::store::RecordStore) operation takes a [`Context`]. The
//! context is raced against each backend call: if the context is cancelled or its deadline
//! passes first, the in-flight call is dropped and the operation fails with
//! [`BackendError::Cancelled`] or [`BackendError::DeadlineExceeded`] wrapped in a transport
//! error.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use kiln::context::{CancellationToken, Context};
//!
//! let token = CancellationToken::new();
//! let ctx = Context::with_timeout(Duration::from_secs(5)).with_cancellation(token.clone());
//!
//! // elsewhere
//! token.cancel();
//! ```

use std::{
    future::{Future, pending},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{sync::Notify, time::Instant};

use crate::error::{BackendError, BackendResult};

/// A handle for cancelling in-flight store calls.
///
/// Clones share the same state, so a token can be handed to another task and cancelled from
/// there.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenState>,
}

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Creates a new, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every call running under this token.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Checks if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            // Registered before the flag check so a concurrent cancel cannot be missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Per-call cancellation and deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now. A timeout past the clock's range means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::background().deadline(deadline),
            None => Self::background(),
        }
    }

    /// A context expiring at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline(deadline)
    }

    /// Replaces the cancellation token of this context.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Sets the deadline, keeping the earlier one if a deadline is already set.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Returns the cancellation token of this context.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the deadline of this context, if any.
    pub fn expires_at(&self) -> Option<Instant> {
        self.deadline
    }

    /// Reports why this context is no longer usable, if it is not.
    pub fn check(&self) -> BackendResult<()> {
        if self.token.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Err(BackendError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Runs `call` until it completes, the context is cancelled, or the deadline passes.
    pub async fn run<T, F>(&self, call: F) -> BackendResult<T>
    where
        F: Future<Output = BackendResult<T>>,
    {
        self.check()?;

        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(BackendError::Cancelled),
            _ = expiry => Err(BackendError::DeadlineExceeded),
            result = call => result,
        }
    }
}
