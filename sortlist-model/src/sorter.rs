use std::{cmp::Ordering, fmt, sync::RwLock};

use tokio::sync::broadcast::{self, Sender};

mod subscriber;

pub use self::subscriber::SorterSubscriber;

/// Whether a [`Sorter`] currently imposes any order at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SorterOrder {
    /// [`Sorter::compare`] is a total preorder over the items.
    Ordered,
    /// The sorter doesn't sort, lists should keep the order of their input.
    Unordered,
}

/// Describes how the ordering of a [`Sorter`] changed.
///
/// Consumers are free to treat every change like [`Different`][Self::Different].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SorterChange {
    /// The sorter changed in an arbitrary way.
    Different,
    /// The sort order was inverted: items that compared as less now compare as
    /// greater and vice versa. Items that compared as equal still do.
    Inverted,
    /// The sorter is less strict: items that compared as equal before still
    /// do, but some items that didn't now compare as equal.
    LessStrict,
    /// The sorter is more strict: items that compared as unequal before still
    /// do, but some items that compared as equal no longer do.
    MoreStrict,
}

/// A comparison function for items of type `T`, which can announce that its
/// results may have changed.
///
/// Any `Fn(&T, &T) -> Ordering` closure is a `Sorter` that never changes.
pub trait Sorter<T: ?Sized>: Send + Sync {
    /// Compare two items.
    ///
    /// Must be a consistent total preorder while [`order`][Self::order]
    /// returns [`SorterOrder::Ordered`].
    fn compare(&self, left: &T, right: &T) -> Ordering;

    /// Whether this sorter sorts at all.
    fn order(&self) -> SorterOrder {
        SorterOrder::Ordered
    }

    /// Obtain a new subscriber for changes of this sorter.
    fn subscribe(&self) -> SorterSubscriber;
}

impl<T, F> Sorter<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering + Send + Sync,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        self(left, right)
    }

    fn subscribe(&self) -> SorterSubscriber {
        SorterSubscriber::closed()
    }
}

type SortFunc<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A [`Sorter`] that uses a replaceable sort function.
///
/// Without a sort function, the sorter is [`SorterOrder::Unordered`].
pub struct CustomSorter<T> {
    state: RwLock<CustomSorterState<T>>,
    sender: Sender<SorterChange>,
}

struct CustomSorterState<T> {
    sort_func: Option<SortFunc<T>>,
    reversed: bool,
}

impl<T> CustomSorter<T> {
    /// Create a new `CustomSorter` sorting with `sort_func`.
    pub fn new<F>(sort_func: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self::with_sort_func(Some(Box::new(sort_func)))
    }

    /// Create a new `CustomSorter` without a sort function.
    pub fn unordered() -> Self {
        Self::with_sort_func(None)
    }

    fn with_sort_func(sort_func: Option<SortFunc<T>>) -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { state: RwLock::new(CustomSorterState { sort_func, reversed: false }), sender }
    }

    /// Replace the sort function and notify subscribers.
    pub fn set_sort_func<F>(&self, sort_func: F)
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.state.write().unwrap().sort_func = Some(Box::new(sort_func));
        self.changed(SorterChange::Different);
    }

    /// Remove the sort function, making the sorter
    /// [`SorterOrder::Unordered`], and notify subscribers.
    pub fn unset_sort_func(&self) {
        self.state.write().unwrap().sort_func = None;
        self.changed(SorterChange::Different);
    }

    /// Whether the results of the sort function are reversed.
    pub fn is_reversed(&self) -> bool {
        self.state.read().unwrap().reversed
    }

    /// Reverse the results of the sort function, or stop doing so.
    ///
    /// Subscribers are notified if the value changes.
    pub fn set_reversed(&self, reversed: bool) {
        let mut state = self.state.write().unwrap();
        if state.reversed == reversed {
            return;
        }

        state.reversed = reversed;
        drop(state);
        self.changed(SorterChange::Inverted);
    }

    /// Notify subscribers that the ordering changed.
    ///
    /// Use this if the sort function depends on outside state that was
    /// modified.
    pub fn changed(&self, change: SorterChange) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::sorter", ?change, "changed");

        let _num_receivers = self.sender.send(change).unwrap_or(0);
    }
}

impl<T> Sorter<T> for CustomSorter<T> {
    fn compare(&self, left: &T, right: &T) -> Ordering {
        let state = self.state.read().unwrap();
        match &state.sort_func {
            Some(sort_func) if state.reversed => sort_func(left, right).reverse(),
            Some(sort_func) => sort_func(left, right),
            None => Ordering::Equal,
        }
    }

    fn order(&self) -> SorterOrder {
        if self.state.read().unwrap().sort_func.is_some() {
            SorterOrder::Ordered
        } else {
            SorterOrder::Unordered
        }
    }

    fn subscribe(&self) -> SorterSubscriber {
        SorterSubscriber::new(self.sender.subscribe())
    }
}

impl<T> fmt::Debug for CustomSorter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().unwrap();
        f.debug_struct("CustomSorter")
            .field("has_sort_func", &state.sort_func.is_some())
            .field("reversed", &state.reversed)
            .finish_non_exhaustive()
    }
}
