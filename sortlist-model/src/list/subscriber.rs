use std::{
    fmt,
    pin::Pin,
    task::{ready, Context, Poll},
};

use futures_core::Stream;
use imbl::Vector;
use tokio::sync::broadcast::{
    error::{RecvError, TryRecvError},
    Receiver,
};
use tokio_util::sync::ReusableBoxFuture;
#[cfg(feature = "tracing")]
use tracing::info;

use super::{BroadcastMessage, ItemsChanged, ListId};

/// A subscriber for changes of a list.
///
/// Use its [`Stream`] implementation to receive [`ItemsChanged`]
/// notifications (futures-util and other futures-related crates have
/// extension traits with convenience methods). The subscriber also keeps a
/// snapshot of the list's items as of the last change it yielded, available
/// through [`items`][Self::items].
pub struct ListSubscriber<T> {
    id: ListId,
    items: Vector<T>,
    inner: ReusableBoxFuture<'static, SubscriberFutureReturn<BroadcastMessage<T>>>,
}

impl<T: Clone + Send + Sync + 'static> ListSubscriber<T> {
    pub(super) fn new(id: ListId, items: Vector<T>, rx: Receiver<BroadcastMessage<T>>) -> Self {
        Self { id, items, inner: ReusableBoxFuture::new(make_future(rx)) }
    }
}

impl<T> ListSubscriber<T> {
    /// The identity of the list this subscriber receives changes from.
    pub fn id(&self) -> ListId {
        self.id
    }

    /// The items of the list, as of the last change yielded by this
    /// subscriber.
    pub fn items(&self) -> &Vector<T> {
        &self.items
    }
}

impl<T> ListSubscriber<T> {
    /// Skip to the newest message after missing some, reporting everything
    /// as changed.
    fn catch_up(&mut self, rx: &mut Receiver<BroadcastMessage<T>>) -> Option<ItemsChanged>
    where
        T: Clone,
    {
        let mut last = None;
        let newest = loop {
            match rx.try_recv() {
                Ok(msg) => last = Some(msg),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty) => break last,
                Err(TryRecvError::Closed) => {
                    // The list is gone, along with its final items.
                    #[cfg(feature = "tracing")]
                    info!(target: "sortlist_model::list::broadcast", "closed while catching up");
                    return None;
                }
            }
        };

        // A lagged receiver always has the oldest retained message left.
        let Some(msg) = newest else {
            unreachable!("no message left after lagging behind");
        };
        let change = ItemsChanged::new(0, self.items.len(), msg.state.len());
        self.items = msg.state;
        Some(change)
    }
}

// The snapshot is never pinned, only the inner future is (and that one is
// boxed).
impl<T> Unpin for ListSubscriber<T> {}

impl<T: Clone + Send + Sync + 'static> Stream for ListSubscriber<T> {
    type Item = ItemsChanged;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let (result, mut rx) = ready!(self.inner.poll(cx));

        let poll = match result {
            Ok(msg) => {
                self.items = msg.state;
                Poll::Ready(Some(msg.change))
            }
            Err(RecvError::Closed) => Poll::Ready(None),
            Err(RecvError::Lagged(_)) => Poll::Ready(self.catch_up(&mut rx)),
        };

        self.inner.set(make_future(rx));
        poll
    }
}

impl<T> fmt::Debug for ListSubscriber<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSubscriber")
            .field("id", &self.id)
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

type SubscriberFutureReturn<T> = (Result<T, RecvError>, Receiver<T>);

async fn make_future<T: Clone>(mut rx: Receiver<T>) -> SubscriberFutureReturn<T> {
    let result = rx.recv().await;
    (result, rx)
}
