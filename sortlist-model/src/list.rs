use std::{
    fmt, ops,
    sync::atomic::{AtomicU64, Ordering},
};

use imbl::Vector;
use tokio::sync::broadcast::{self, Sender};

mod subscriber;
mod transaction;

pub use self::{subscriber::ListSubscriber, transaction::ObservableListTransaction};

/// Read access to an indexable list that notifies about its changes.
///
/// Implemented by [`ObservableList`] and by the sorted list model of the
/// `sortlist` crate, so that a sorted view can itself be the input of another
/// layer.
pub trait ListModel<T> {
    /// The number of items in the list.
    fn n_items(&self) -> usize;

    /// Get the item at `position`, or `None` if `position` is out of range.
    fn item(&self, position: usize) -> Option<T>;

    /// Obtain a new subscriber that starts out with the current items and
    /// receives every subsequent change.
    fn subscribe(&self) -> ListSubscriber<T>;
}

/// A change to a list: `removed` items starting at `position` were replaced
/// by `added` new items.
///
/// The items before `position` and the items after `position + removed` (in
/// the old list) are untouched. The new length of the list is
/// `old_len - removed + added`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ItemsChanged {
    /// The position of the first changed item.
    pub position: usize,
    /// The number of items that were removed.
    pub removed: usize,
    /// The number of items that were added in their place.
    pub added: usize,
}

impl ItemsChanged {
    /// Create a new `ItemsChanged`.
    pub const fn new(position: usize, removed: usize, added: usize) -> Self {
        Self { position, removed, added }
    }

    /// Whether this change doesn't change anything.
    pub const fn is_noop(&self) -> bool {
        self.removed == 0 && self.added == 0
    }
}

/// Identity of an [`ObservableList`] (or any other [`ListSender`]).
///
/// All subscribers of the same list share its `ListId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListId(u64);

impl ListId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The sending half of a list's change notifications.
///
/// [`ObservableList`] uses this internally. It is public so that other list
/// implementations (like a sorted view of a list) can hand out
/// [`ListSubscriber`]s as well.
pub struct ListSender<T> {
    id: ListId,
    sender: Sender<BroadcastMessage<T>>,
}

impl<T: Clone + Send + Sync + 'static> ListSender<T> {
    /// Create a new `ListSender` with the given capacity for the inner buffer.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is `0`, or larger than `usize::MAX / 2`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { id: ListId::next(), sender }
    }

    /// The identity of the list this sender broadcasts for.
    pub fn id(&self) -> ListId {
        self.id
    }

    /// Obtain a new subscriber, starting out with the given `items`.
    pub fn subscribe(&self, items: Vector<T>) -> ListSubscriber<T> {
        ListSubscriber::new(self.id, items, self.sender.subscribe())
    }

    /// The number of subscribers that are currently alive.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Broadcast `change` to all subscribers.
    ///
    /// `state` is only called if there are subscribers, and has to return the
    /// full list of items after the change.
    pub fn send(&self, change: ItemsChanged, state: impl FnOnce() -> Vector<T>) {
        if change.is_noop() || self.sender.receiver_count() == 0 {
            return;
        }

        let msg = BroadcastMessage { change, state: state() };
        let _num_receivers = self.sender.send(msg).unwrap_or(0);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sortlist_model::list::broadcast",
            position = change.position,
            removed = change.removed,
            added = change.added,
            "Change broadcast to {_num_receivers} receivers"
        );
    }
}

impl<T> fmt::Debug for ListSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSender").field("id", &self.id).finish_non_exhaustive()
    }
}

/// An ordered list of elements that broadcasts any changes made to it.
pub struct ObservableList<T> {
    values: Vector<T>,
    sender: ListSender<T>,
}

impl<T: Clone + Send + Sync + 'static> ObservableList<T> {
    /// Create an empty `ObservableList` that buffers up to 16 changes for
    /// slow subscribers.
    ///
    /// The buffer size may change in non-breaking releases, use
    /// [`with_capacity`](Self::with_capacity) to rely on a specific one.
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    /// Create a new `ObservableList` with the given capacity for the inner
    /// buffer.
    ///
    /// At most `capacity` changes are kept around for subscribers that have
    /// not seen them yet. A subscriber that falls further behind loses the
    /// oldest ones, and sees a single change replacing every item it knew
    /// about with the current items instead.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is `0`, or larger than `usize::MAX / 2`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { values: Vector::new(), sender: ListSender::new(capacity) }
    }

    /// The identity of this list.
    pub fn id(&self) -> ListId {
        self.sender.id()
    }

    /// Stop observing, returning the items.
    pub fn into_inner(self) -> Vector<T> {
        self.values
    }

    /// Subscribe to the changes of this list, starting from its current items.
    pub fn subscribe(&self) -> ListSubscriber<T> {
        self.sender.subscribe(self.values.clone())
    }

    /// Append the given elements at the end of the list and notify
    /// subscribers.
    pub fn append(&mut self, values: Vector<T>) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::list::update", "append(len = {})", values.len());

        let change = ItemsChanged::new(self.values.len(), 0, values.len());
        self.values.append(values);
        self.broadcast_change(change);
    }

    /// Clear out all of the elements in this list and notify subscribers.
    pub fn clear(&mut self) {
        let len = self.values.len();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sortlist_model::list::update",
            nop = (len == 0).then_some(true),
            "clear"
        );

        if len != 0 {
            self.values.clear();
            self.broadcast_change(ItemsChanged::new(0, len, 0));
        }
    }

    /// Add an element at the front of the list and notify subscribers.
    pub fn push_front(&mut self, value: T) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::list::update", "push_front");

        self.values.push_front(value);
        self.broadcast_change(ItemsChanged::new(0, 0, 1));
    }

    /// Add an element at the back of the list and notify subscribers.
    pub fn push_back(&mut self, value: T) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::list::update", "push_back");

        let position = self.values.len();
        self.values.push_back(value);
        self.broadcast_change(ItemsChanged::new(position, 0, 1));
    }

    /// Remove the first element, notify subscribers and return the element.
    ///
    /// If there are no elements, subscribers will not be notified and this
    /// method will return `None`.
    pub fn pop_front(&mut self) -> Option<T> {
        let value = self.values.pop_front();
        if value.is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "sortlist_model::list::update", "pop_front");

            self.broadcast_change(ItemsChanged::new(0, 1, 0));
        }
        value
    }

    /// Remove the last element, notify subscribers and return the element.
    ///
    /// If there are no elements, subscribers will not be notified and this
    /// method will return `None`.
    pub fn pop_back(&mut self) -> Option<T> {
        let value = self.values.pop_back();
        if value.is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "sortlist_model::list::update", "pop_back");

            self.broadcast_change(ItemsChanged::new(self.values.len(), 1, 0));
        }
        value
    }

    /// Insert an element at the given position and notify subscribers.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn insert(&mut self, index: usize, value: T) {
        let len = self.values.len();
        if index <= len {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "sortlist_model::list::update", "insert(index = {index})");

            self.values.insert(index, value);
            self.broadcast_change(ItemsChanged::new(index, 0, 1));
        } else {
            panic!("index out of bounds: the length is {len} but the index is {index}");
        }
    }

    /// Replace the element at the given position, notify subscribers and return
    /// the previous element at that position.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn set(&mut self, index: usize, value: T) -> T {
        let len = self.values.len();
        if index < len {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "sortlist_model::list::update", "set(index = {index})");

            let old_value = self.values.set(index, value);
            self.broadcast_change(ItemsChanged::new(index, 1, 1));
            old_value
        } else {
            panic!("index out of bounds: the length is {len} but the index is {index}");
        }
    }

    /// Remove the element at the given position, notify subscribers and return
    /// the element.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.values.len();
        if index < len {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "sortlist_model::list::update", "remove(index = {index})");

            let value = self.values.remove(index);
            self.broadcast_change(ItemsChanged::new(index, 1, 0));
            value
        } else {
            panic!("index out of bounds: the length is {len} but the index is {index}");
        }
    }

    /// Truncate the list to `len` elements and notify subscribers.
    ///
    /// Does nothing if `len` is greater or equal to the list's current
    /// length.
    pub fn truncate(&mut self, len: usize) {
        let old_len = self.values.len();
        if len < old_len {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "sortlist_model::list::update", "truncate(len = {len})");

            self.values.truncate(len);
            self.broadcast_change(ItemsChanged::new(len, old_len - len, 0));
        }
    }

    /// Replace `removed` elements starting at `position` with `values`, notify
    /// subscribers and return the removed elements.
    ///
    /// This is the most general edit; every other mutating method is a special
    /// case of it.
    ///
    /// # Panics
    ///
    /// Panics if `position + removed > len`.
    #[track_caller]
    pub fn splice(&mut self, position: usize, removed: usize, values: Vector<T>) -> Vector<T> {
        let len = self.values.len();
        let Some(end) = position.checked_add(removed).filter(|&end| end <= len) else {
            panic!(
                "range out of bounds: the length is {len} but the range is \
                 {position}..{position}+{removed}"
            );
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sortlist_model::list::update",
            "splice(position = {position}, removed = {removed}, added = {})",
            values.len()
        );

        let change = ItemsChanged::new(position, removed, values.len());
        let mut removed_values = self.values.split_off(position);
        let rest = removed_values.split_off(end - position);
        self.values.append(values);
        self.values.append(rest);
        self.broadcast_change(change);

        removed_values
    }

    /// Replace all elements with `values` and notify subscribers.
    pub fn reset(&mut self, values: Vector<T>) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::list::update", "reset(len = {})", values.len());

        let change = ItemsChanged::new(0, self.values.len(), values.len());
        self.values = values;
        self.broadcast_change(change);
    }

    /// Start a new transaction to make multiple updates as one unit.
    ///
    /// See [`ObservableListTransaction`]s documentation for more details.
    pub fn transaction(&mut self) -> ObservableListTransaction<'_, T> {
        ObservableListTransaction::new(self)
    }

    fn broadcast_change(&self, change: ItemsChanged) {
        self.sender.send(change, || self.values.clone());
    }
}

impl<T: Clone + Send + Sync + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ObservableList<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList").field("values", &self.values).finish_non_exhaustive()
    }
}

// Read-only access, mutation has to notify subscribers.
impl<T> ops::Deref for ObservableList<T> {
    type Target = Vector<T>;

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl<T: Clone + Send + Sync + 'static> From<Vector<T>> for ObservableList<T> {
    fn from(values: Vector<T>) -> Self {
        let mut this = Self::new();
        this.append(values);
        this
    }
}

impl<T: Clone + Send + Sync + 'static> ListModel<T> for ObservableList<T> {
    fn n_items(&self) -> usize {
        self.values.len()
    }

    fn item(&self, position: usize) -> Option<T> {
        self.values.get(position).cloned()
    }

    fn subscribe(&self) -> ListSubscriber<T> {
        ObservableList::subscribe(self)
    }
}

#[derive(Clone)]
struct BroadcastMessage<T> {
    change: ItemsChanged,
    state: Vector<T>,
}
