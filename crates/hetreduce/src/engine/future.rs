//! Asynchronous handle to a reduction's result.
//!
//! ## Purpose
//!
//! A reduction returns immediately with a [`ReduceFuture`]. The handle later
//! yields either the value of the result cell or the fault that stopped the
//! reduction. Synchronize with [`ReduceFuture::wait`] or `.await` it.
//!
//! ## Design notes
//!
//! * **One-shot**: The executing job fulfils a one-shot channel exactly once.
//! * **No cancellation**: Dropping the handle does not stop in-flight work;
//!   the result is discarded when it arrives.

// External dependencies
use futures_intrusive::channel::shared::{OneshotReceiver, OneshotSender, oneshot_channel};
use std::fmt::{Debug, Formatter};
use std::future::{Future, IntoFuture};
use std::pin::Pin;

// Internal dependencies
use crate::primitives::errors::ReduceError;

/// Producer side of a [`ReduceFuture`].
pub struct Promise<T: Send + 'static> {
    tx: OneshotSender<Result<T, ReduceError>>,
}

impl<T: Send + 'static> Promise<T> {
    /// Deliver the outcome. A dropped handle silently discards it.
    pub fn fulfill(self, outcome: Result<T, ReduceError>) {
        let _ = self.tx.send(outcome);
    }
}

/// Handle to the eventual result of a reduction.
pub struct ReduceFuture<T: Send + 'static> {
    rx: OneshotReceiver<Result<T, ReduceError>>,
}

impl<T: Send + 'static> Debug for ReduceFuture<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReduceFuture").finish_non_exhaustive()
    }
}

/// Create a connected promise/handle pair.
pub fn channel<T: Send + 'static>() -> (Promise<T>, ReduceFuture<T>) {
    let (tx, rx) = oneshot_channel();
    (Promise { tx }, ReduceFuture { rx })
}

impl<T: Send + 'static> ReduceFuture<T> {
    /// A handle that is already resolved with `outcome`.
    pub fn ready(outcome: Result<T, ReduceError>) -> Self {
        let (promise, future) = channel();
        promise.fulfill(outcome);
        future
    }

    /// Block until the reduction completes.
    pub fn wait(self) -> Result<T, ReduceError> {
        pollster::block_on(self.rx.receive()).unwrap_or(Err(ReduceError::Disconnected))
    }
}

impl<T: Send + 'static> IntoFuture for ReduceFuture<T> {
    type Output = Result<T, ReduceError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            self.rx
                .receive()
                .await
                .unwrap_or(Err(ReduceError::Disconnected))
        })
    }
}
