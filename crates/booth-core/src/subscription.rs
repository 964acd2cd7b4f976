//! Explicit change-stream subscription handle.

use futures_util::{FutureExt, StreamExt};
use tracing::debug;

use crate::Result;
use crate::record::ChangeEvent;
use crate::traits::ChangeStream;

/// A live subscription to a store's change stream.
///
/// Dropping the handle releases the stream; [`unsubscribe`](Self::unsubscribe)
/// does the same eagerly. Once released, [`next`](Self::next) yields `None`
/// forever.
pub struct Subscription<C> {
    stream: Option<C>,
}

impl<C: ChangeStream> Subscription<C> {
    pub fn new(stream: C) -> Self {
        debug!("Subscribed to change stream");
        Self {
            stream: Some(stream),
        }
    }

    /// Returns true until the subscription is released or the stream ends.
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Next notification, or `None` once released or exhausted.
    pub async fn next(&mut self) -> Option<Result<ChangeEvent>> {
        let stream = self.stream.as_mut()?;
        let item = stream.next().await;
        if item.is_none() {
            debug!("Change stream ended");
            self.stream = None;
        }
        item
    }

    /// Drop every notification already delivered without waiting for more.
    ///
    /// Returns how many were dropped. An exhausted stream is released.
    pub fn discard_ready(&mut self) -> usize {
        let mut discarded = 0;
        while let Some(item) = self.next().now_or_never() {
            match item {
                Some(_) => discarded += 1,
                None => break,
            }
        }
        discarded
    }

    /// Release the stream. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if self.stream.take().is_some() {
            debug!("Unsubscribed from change stream");
        }
    }
}

impl<C> Drop for Subscription<C> {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            debug!("Change stream released on drop");
        }
    }
}
