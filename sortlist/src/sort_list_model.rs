use std::{
    collections::VecDeque,
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, Waker},
};

use futures_core::Stream;
use imbl::Vector;
use sortlist_model::{
    ItemsChanged, ListModel, ListSender, ListSubscriber, Sorter, SorterChange, SorterOrder,
    SorterSubscriber,
};

use crate::{
    sort_array::{SortArray, SortItem, Unmodified},
    timsort::TimSort,
};

/// A notification from a [`SortListModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortListUpdate {
    /// Items of the sorted list changed.
    Items(ItemsChanged),
    /// The unsorted list was replaced through
    /// [`set_model`][SortListModel::set_model].
    Model,
    /// The sorter was replaced through
    /// [`set_sorter`][SortListModel::set_sorter].
    Sorter,
    /// Sorting started (`true`) or finished (`false`).
    Sorting(bool),
}

/// What a [`SortListModel`] is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortListState {
    /// There is no unsorted list.
    Empty,
    /// There is no sorter, or it doesn't impose an order. The items are those
    /// of the unsorted list, in its order.
    PassThrough,
    /// The items are being sorted.
    Sorting,
    /// The items are sorted.
    Sorted,
}

/// A list that presents the items of another list in sorted order.
///
/// Sorting happens incrementally: whenever the unsorted list or the sorter
/// change, the items are sorted again in small steps, one per poll of the
/// model's [`Stream`] implementation. In between, the items can be read in
/// whatever order the sort has reached, and the stream yields an
/// [`ItemsChanged`] covering all items after every step.
///
/// After an edit of the unsorted list, as much of the existing order as
/// possible is kept: removing items never requires sorting again, and items
/// that were added while the list was sorted are merged into it.
///
/// Without a sorter (or with one that is [`SorterOrder::Unordered`]), the
/// items are those of the unsorted list.
///
/// ```
/// use std::sync::Arc;
///
/// use sortlist::{ItemsChanged, ObservableList, SortListModel, SortListUpdate, Sorter};
/// use imbl::vector;
/// use stream_assert::{assert_next_eq, assert_pending};
///
/// let mut list = ObservableList::from(vector![5, 3, 1, 4, 2]);
/// let sorter: Arc<dyn Sorter<i32>> = Arc::new(i32::cmp);
/// let mut sorted = SortListModel::new(Some(list.subscribe()), Some(sorter));
/// assert!(sorted.is_sorting());
///
/// // Five items are sorted in a single step.
/// assert_next_eq!(sorted, SortListUpdate::Items(ItemsChanged::new(0, 5, 5)));
/// assert_next_eq!(sorted, SortListUpdate::Sorting(false));
/// assert_pending!(sorted);
/// assert_eq!(sorted.to_vector(), vector![1, 2, 3, 4, 5]);
///
/// // New items are added at the end first, then merged in.
/// list.push_back(0);
/// assert_next_eq!(sorted, SortListUpdate::Items(ItemsChanged::new(5, 0, 1)));
/// assert_next_eq!(sorted, SortListUpdate::Sorting(true));
/// ```
pub struct SortListModel<T> {
    model: Option<ListSubscriber<T>>,
    // The unsorted list is gone, no more changes will arrive.
    model_closed: bool,

    sorter: Option<Arc<dyn Sorter<T>>>,
    sorter_changes: Option<SorterSubscriber>,
    // Whether the sorter imposed an order as of its last change.
    ordered: bool,

    // Empty when passing through the unsorted list.
    items: SortArray<T>,
    sort: Option<TimSort<SortItem<T>>>,

    ready: VecDeque<SortListUpdate>,
    // The sorting state as of the last `SortListUpdate::Sorting`.
    sorting_notified: bool,
    sender: ListSender<T>,
    waker: Option<Waker>,
}

impl<T: Clone + Send + Sync + 'static> SortListModel<T> {
    /// Create a new `SortListModel` that sorts the items of `model` with
    /// `sorter`.
    ///
    /// If both are given, sorting starts right away.
    pub fn new(model: Option<ListSubscriber<T>>, sorter: Option<Arc<dyn Sorter<T>>>) -> Self {
        let mut this = Self {
            model,
            model_closed: false,
            sorter: None,
            sorter_changes: None,
            ordered: false,
            items: SortArray::new(),
            sort: None,
            ready: VecDeque::new(),
            sorting_notified: false,
            sender: ListSender::new(16),
            waker: None,
        };

        this.bind_sorter(sorter);
        if this.ordered {
            this.create_items();
        }
        this.resort(0);
        this.sorting_notified = this.sort.is_some();

        this
    }

    /// The subscriber of the unsorted list.
    pub fn model(&self) -> Option<&ListSubscriber<T>> {
        self.model.as_ref()
    }

    /// Replace the unsorted list.
    ///
    /// Does nothing if `model` is a subscriber of the current unsorted list.
    pub fn set_model(&mut self, model: Option<ListSubscriber<T>>) {
        if self.model.as_ref().map(ListSubscriber::id) == model.as_ref().map(ListSubscriber::id) {
            return;
        }

        let removed = self.n_items();
        self.stop_sorting();
        self.items.clear();

        self.model = model;
        self.model_closed = false;
        if self.ordered {
            self.create_items();
        }
        self.resort(0);

        let added = self.n_items();
        self.items_changed(ItemsChanged::new(0, removed, added));
        self.ready.push_back(SortListUpdate::Model);
        self.notify_sorting();
        self.wake();
    }

    /// The sorter.
    pub fn sorter(&self) -> Option<&Arc<dyn Sorter<T>>> {
        self.sorter.as_ref()
    }

    /// Replace the sorter.
    ///
    /// Does nothing if `sorter` is the current sorter.
    pub fn set_sorter(&mut self, sorter: Option<Arc<dyn Sorter<T>>>) {
        let unchanged = match (&self.sorter, &sorter) {
            (Some(old), Some(new)) => same_sorter(old, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.stop_sorting();
        self.items.clear();

        if sorter.is_some() {
            self.bind_sorter(sorter);
            self.handle_sorter_changed(SorterChange::Different);
        } else {
            self.bind_sorter(None);
            let n_items = self.n_items();
            if n_items > 1 {
                self.items_changed(ItemsChanged::new(0, n_items, n_items));
            }
        }

        self.ready.push_back(SortListUpdate::Sorter);
        self.notify_sorting();
        self.wake();
    }

    /// The number of items.
    pub fn n_items(&self) -> usize {
        if self.items.is_empty() {
            self.model.as_ref().map_or(0, |model| model.items().len())
        } else {
            self.items.len()
        }
    }

    /// Get the item at `position`, or `None` if `position` is out of range.
    pub fn item(&self, position: usize) -> Option<T> {
        if self.items.is_empty() {
            self.model.as_ref()?.items().get(position).cloned()
        } else {
            self.items.get(position).map(|entry| entry.item.clone())
        }
    }

    /// All items, in their current order.
    pub fn to_vector(&self) -> Vector<T> {
        if self.items.is_empty() {
            self.model.as_ref().map(|model| model.items().clone()).unwrap_or_default()
        } else {
            self.items.iter().map(|entry| entry.item.clone()).collect()
        }
    }

    /// Whether the items are being sorted right now.
    pub fn is_sorting(&self) -> bool {
        self.sort.is_some()
    }

    /// What the model is currently doing.
    pub fn state(&self) -> SortListState {
        if self.model.is_none() {
            SortListState::Empty
        } else if !self.ordered {
            SortListState::PassThrough
        } else if self.sort.is_some() {
            SortListState::Sorting
        } else {
            SortListState::Sorted
        }
    }

    /// Obtain a new subscriber for the sorted items.
    pub fn subscribe(&self) -> ListSubscriber<T> {
        self.sender.subscribe(self.to_vector())
    }

    /// For testing purposes only.
    #[doc(hidden)]
    pub fn already_sorted(&self) -> Option<usize> {
        self.sort.as_ref().map(TimSort::already_sorted)
    }

    fn bind_sorter(&mut self, sorter: Option<Arc<dyn Sorter<T>>>) {
        self.sorter_changes = sorter.as_ref().map(|sorter| sorter.subscribe());
        self.ordered =
            sorter.as_ref().map_or(false, |sorter| sorter.order() == SorterOrder::Ordered);
        self.sorter = sorter;
    }

    fn create_items(&mut self) {
        let Some(model) = &self.model else { return };

        let items = model.items();
        self.items.reserve(items.len());
        for (position, item) in items.iter().enumerate() {
            self.items.push(item.clone(), position);
        }
    }

    fn handle_sorter_changed(&mut self, _change: SorterChange) {
        let Some(sorter) = &self.sorter else { return };

        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist::sort", change = ?_change, "sorter changed");

        self.ordered = sorter.order() == SorterOrder::Ordered;
        if !self.ordered {
            self.stop_sorting();
            self.items.clear();
        } else if self.items.is_empty() {
            self.create_items();
        }
        self.resort(0);

        let n_items = self.n_items();
        if n_items > 1 {
            self.items_changed(ItemsChanged::new(0, n_items, n_items));
        }
        self.notify_sorting();
    }

    fn handle_items_changed(&mut self, change: ItemsChanged) {
        if change.is_noop() {
            return;
        }
        if !self.ordered {
            self.items_changed(change);
            return;
        }

        let ItemsChanged { position, removed, added } = change;
        let was_sorting = self.stop_sorting();

        let Unmodified { start, end } = self.items.remove_items(position, removed, added);

        let Some(model) = &self.model else { return };
        let backing = model.items();
        self.items.reserve(added);
        for (position, item) in (position..).zip(backing.iter().skip(position).take(added)) {
            self.items.push(item.clone(), position);
        }
        assert_eq!(
            self.items.len(),
            backing.len(),
            "sorted items out of sync with the unsorted list after {change:?}"
        );

        let len = self.items.len();
        if was_sorting {
            self.resort(0);
        } else if added > 0 {
            self.resort(len - added);
        }

        // New items are at the end, so only the start is still in place.
        let end = if added > 0 { 0 } else { end };
        let n = len - start - end;
        self.items_changed(ItemsChanged::new(start, n + removed - added, n));
        self.notify_sorting();
    }

    // Starts sorting, trusting the first `already_sorted` items unless a sort
    // was interrupted.
    fn resort(&mut self, already_sorted: usize) {
        let already_sorted = if self.stop_sorting() { 0 } else { already_sorted };

        let sort = TimSort::new(self.items.len(), already_sorted);
        if sort.is_finished() {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sortlist::sort",
            len = sort.len(),
            already_sorted = sort.already_sorted(),
            "resort"
        );

        self.sort = Some(sort);
    }

    // Returns whether sorting was in progress.
    fn stop_sorting(&mut self) -> bool {
        let Some(mut sort) = self.sort.take() else { return false };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sortlist::sort",
            steps = sort.steps(),
            finished = sort.is_finished(),
            "stop"
        );

        sort.finish();
        true
    }

    fn sort_step(&mut self) {
        let (Some(sort), Some(sorter)) = (&mut self.sort, &self.sorter) else { return };

        #[cfg(feature = "tracing")]
        let start = std::time::Instant::now();

        let more = sort.step(self.items.as_mut_slice(), |left, right| {
            sorter.compare(&left.item, &right.item)
        });

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "sortlist::sort",
            step = sort.steps(),
            more,
            elapsed = ?start.elapsed(),
            "step"
        );

        let len = self.items.len();
        self.items_changed(ItemsChanged::new(0, len, len));
        if !more {
            self.stop_sorting();
        }
        self.notify_sorting();
    }

    fn items_changed(&mut self, change: ItemsChanged) {
        if change.is_noop() {
            return;
        }

        self.sender.send(change, || self.to_vector());
        self.ready.push_back(SortListUpdate::Items(change));
    }

    fn notify_sorting(&mut self) {
        let sorting = self.sort.is_some();
        if sorting != self.sorting_notified {
            self.sorting_notified = sorting;
            self.ready.push_back(SortListUpdate::Sorting(sorting));
        }
    }

    fn wake(&mut self) {
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

// Everything that could be pinned is boxed inside the subscribers.
impl<T> Unpin for SortListModel<T> {}

impl<T: Clone + Send + Sync + 'static> Stream for SortListModel<T> {
    type Item = SortListUpdate;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            // First off, if any updates are ready, return them.
            if let Some(update) = this.ready.pop_front() {
                return Poll::Ready(Some(update));
            }

            // Changes of the sorter and the unsorted list take priority over
            // sorting, which would have to start over after them.
            if let Some(sorter_changes) = &mut this.sorter_changes {
                match Pin::new(sorter_changes).poll_next(cx) {
                    Poll::Ready(Some(change)) => {
                        this.handle_sorter_changed(change);
                        continue;
                    }
                    // The sorter never changes again.
                    Poll::Ready(None) => this.sorter_changes = None,
                    Poll::Pending => {}
                }
            }

            if let (Some(model), false) = (&mut this.model, this.model_closed) {
                match Pin::new(model).poll_next(cx) {
                    Poll::Ready(Some(change)) => {
                        this.handle_items_changed(change);
                        continue;
                    }
                    Poll::Ready(None) => this.model_closed = true,
                    Poll::Pending => {}
                }
            }

            if this.sort.is_some() {
                this.sort_step();
                continue;
            }

            if this.model_closed {
                return Poll::Ready(None);
            }

            this.waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ListModel<T> for SortListModel<T> {
    fn n_items(&self) -> usize {
        SortListModel::n_items(self)
    }

    fn item(&self, position: usize) -> Option<T> {
        SortListModel::item(self, position)
    }

    fn subscribe(&self) -> ListSubscriber<T> {
        SortListModel::subscribe(self)
    }
}

impl<T> fmt::Debug for SortListModel<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortListModel")
            .field("model", &self.model)
            .field("has_sorter", &self.sorter.is_some())
            .field("ordered", &self.ordered)
            .field("items", &self.items)
            .field("sort", &self.sort)
            .finish_non_exhaustive()
    }
}

// Compares the data pointers only, vtables of the same type may differ
// between codegen units.
fn same_sorter<T>(left: &Arc<dyn Sorter<T>>, right: &Arc<dyn Sorter<T>>) -> bool {
    Arc::as_ptr(left).cast::<()>() == Arc::as_ptr(right).cast::<()>()
}
