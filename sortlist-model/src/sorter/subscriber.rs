use std::{
    pin::Pin,
    task::{ready, Context, Poll},
};

use futures_core::Stream;
use tokio::sync::broadcast::{self, error::RecvError, Receiver};
use tokio_util::sync::ReusableBoxFuture;

use super::SorterChange;

/// A subscriber for changes of a [`Sorter`][super::Sorter].
///
/// If the subscriber falls behind so far that changes were discarded, the
/// next item is [`SorterChange::Different`], which subsumes all others.
#[derive(Debug)]
pub struct SorterSubscriber {
    inner: ReusableBoxFuture<'static, SubscriberFutureReturn>,
}

impl SorterSubscriber {
    pub(super) fn new(rx: Receiver<SorterChange>) -> Self {
        Self { inner: ReusableBoxFuture::new(make_future(rx)) }
    }

    /// A subscriber for a sorter that never changes.
    ///
    /// The resulting stream ends immediately.
    pub fn closed() -> Self {
        let (_, rx) = broadcast::channel(1);
        Self::new(rx)
    }
}

impl Stream for SorterSubscriber {
    type Item = SorterChange;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let (result, mut rx) = ready!(self.inner.poll(cx));

        let poll = match result {
            Ok(change) => Poll::Ready(Some(change)),
            Err(RecvError::Closed) => Poll::Ready(None),
            Err(RecvError::Lagged(_)) => {
                // Skip everything that's still buffered, one `Different` covers it all.
                while rx.try_recv().is_ok() {}
                Poll::Ready(Some(SorterChange::Different))
            }
        };

        self.inner.set(make_future(rx));
        poll
    }
}

type SubscriberFutureReturn = (Result<SorterChange, RecvError>, Receiver<SorterChange>);

async fn make_future(mut rx: Receiver<SorterChange>) -> SubscriberFutureReturn {
    let result = rx.recv().await;
    (result, rx)
}
