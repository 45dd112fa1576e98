//! Long-lived query subscriptions.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// A stream of results for one query, re-emitted after each cache
/// invalidation.
///
/// The background task that refetches lives exactly as long as this value:
/// dropping it or calling `unsubscribe` stops the task.
#[derive(Debug)]
pub struct QueryWatch<T> {
    inner: ReceiverStream<T>,
    task: JoinHandle<()>,
}

impl<T> QueryWatch<T> {
    pub(crate) fn new(inner: ReceiverStream<T>, task: JoinHandle<()>) -> Self {
        Self { inner, task }
    }

    /// Stop watching. Results already buffered are discarded.
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl<T> Stream for QueryWatch<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<T> Drop for QueryWatch<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
