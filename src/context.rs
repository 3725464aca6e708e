//! Cancellable request context shared by every remote call of a page load.
//!
//! Clones share one cancellation token. Children get a child token, so cancelling a parent
//! ends its children but not the other way round.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::Error;

#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that never ends unless cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that ends `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().child_with_timeout(timeout)
    }

    /// A context that ends when this one does, and can be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Like [`Context::child`], with an additional deadline `timeout` from now.
    /// An earlier deadline inherited from the parent still wins.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        Self {
            token: self.token.child_token(),
            deadline: Some(self.deadline.map_or(own, |inherited| inherited.min(own))),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The token behind this context, for callers that wait on cancellation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// `None` while the context is live, otherwise why it ended.
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}
