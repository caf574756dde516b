use crate::error::MergeError;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Bounded FIFO queue of pending units for one source channel.
pub fn channel<U>(capacity: usize) -> (ChannelSender<U>, ChannelReceiver<U>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ChannelSender { inner: tx },
        ChannelReceiver {
            inner: rx,
            head: None,
        },
    )
}

/// Producer side; clone it to feed one channel from several tasks.
#[derive(Debug)]
pub struct ChannelSender<U> {
    inner: mpsc::Sender<U>,
}

impl<U> Clone for ChannelSender<U> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<U> ChannelSender<U> {
    /// Waits for capacity.
    pub async fn push(&self, unit: U) -> Result<(), MergeError> {
        self.inner
            .send(unit)
            .await
            .map_err(|_| MergeError::ChannelClosed)
    }

    pub fn try_push(&self, unit: U) -> Result<(), MergeError> {
        self.inner.try_send(unit).map_err(|err| match err {
            TrySendError::Full(_) => MergeError::ChannelFull,
            TrySendError::Closed(_) => MergeError::ChannelClosed,
        })
    }
}

/// Merger side. Keeps the next unit in a head slot so it can be inspected
/// without dequeuing it.
#[derive(Debug)]
pub struct ChannelReceiver<U> {
    inner: mpsc::Receiver<U>,
    head: Option<U>,
}

impl<U> ChannelReceiver<U> {
    /// Next unit without removing it. Never blocks.
    pub fn peek(&mut self) -> Option<&U> {
        if self.head.is_none() {
            self.head = self.inner.try_recv().ok();
        }
        self.head.as_ref()
    }

    /// Head slot as filled by the last `peek`.
    pub(crate) fn head(&self) -> Option<&U> {
        self.head.as_ref()
    }

    /// Removes and returns the next unit. Never blocks.
    pub fn poll(&mut self) -> Option<U> {
        self.head.take().or_else(|| self.inner.try_recv().ok())
    }

    /// Every sender is gone and nothing is left to dequeue.
    pub fn is_finished(&self) -> bool {
        self.head.is_none() && self.inner.is_closed() && self.inner.is_empty()
    }
}
