use std::{fmt, mem, ops};

use imbl::Vector;

use super::{ItemsChanged, ObservableList};

/// A batch of edits to an [`ObservableList`], published together.
///
/// Nothing reaches the list until [`.commit()`](Self::commit) is called.
/// Dropping the transaction without committing throws the edits away.
///
/// Subscribers see the whole batch as one [`ItemsChanged`] spanning every
/// position any of the edits touched.
pub struct ObservableListTransaction<'o, T: Clone> {
    // Untouched until commit.
    inner: &'o mut ObservableList<T>,
    // Working copy the edits apply to.
    values: Vector<T>,
    // The range touched so far, if any.
    dirty: Option<Dirty>,
}

impl<'o, T: Clone + Send + Sync + 'static> ObservableListTransaction<'o, T> {
    pub(super) fn new(inner: &'o mut ObservableList<T>) -> Self {
        let values = inner.values.clone();
        Self { inner, values, dirty: None }
    }

    /// Write the edits back to the list and notify its subscribers of them.
    pub fn commit(mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::list::transaction::update", "commit");

        let old_len = self.inner.values.len();
        self.inner.values = mem::take(&mut self.values);

        match self.dirty.take() {
            Some(Dirty { start, tail }) => {
                let new_len = self.inner.values.len();
                let change =
                    ItemsChanged::new(start, old_len - start - tail, new_len - start - tail);
                self.inner.broadcast_change(change);
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    target: "sortlist_model::list::broadcast",
                    "nothing changed, not broadcasting"
                );
            }
        }
    }

    /// Discard the edits made so far and continue from the list's current
    /// items.
    pub fn rollback(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::list::transaction::update", "rollback");

        self.values = self.inner.values.clone();
        self.dirty = None;
    }

    /// Append the given elements at the end of the list.
    pub fn append(&mut self, values: Vector<T>) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sortlist_model::list::transaction::update",
            "append(len = {})", values.len()
        );

        self.record(self.values.len(), 0, values.len());
        self.values.append(values);
    }

    /// Clear out all of the elements in this list.
    pub fn clear(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::list::transaction::update", "clear");

        self.record(0, self.values.len(), 0);
        self.values.clear();
    }

    /// Add an element at the front of the list.
    pub fn push_front(&mut self, value: T) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::list::transaction::update", "push_front");

        self.record(0, 0, 1);
        self.values.push_front(value);
    }

    /// Add an element at the back of the list.
    pub fn push_back(&mut self, value: T) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sortlist_model::list::transaction::update", "push_back");

        self.record(self.values.len(), 0, 1);
        self.values.push_back(value);
    }

    /// Insert an element at the given position.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn insert(&mut self, index: usize, value: T) {
        let len = self.values.len();
        if index <= len {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "sortlist_model::list::transaction::update",
                "insert(index = {index})"
            );

            self.record(index, 0, 1);
            self.values.insert(index, value);
        } else {
            panic!("index out of bounds: the length is {len} but the index is {index}");
        }
    }

    /// Replace the element at the given position and return the previous
    /// element at that position.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn set(&mut self, index: usize, value: T) -> T {
        let len = self.values.len();
        if index < len {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "sortlist_model::list::transaction::update",
                "set(index = {index})"
            );

            self.record(index, 1, 1);
            self.values.set(index, value)
        } else {
            panic!("index out of bounds: the length is {len} but the index is {index}");
        }
    }

    /// Remove the element at the given position and return it.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.values.len();
        if index < len {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "sortlist_model::list::transaction::update",
                "remove(index = {index})"
            );

            self.record(index, 1, 0);
            self.values.remove(index)
        } else {
            panic!("index out of bounds: the length is {len} but the index is {index}");
        }
    }

    /// Truncate the list to `len` elements.
    ///
    /// Does nothing if `len` is greater or equal to the list's current
    /// length.
    pub fn truncate(&mut self, len: usize) {
        let old_len = self.values.len();
        if len < old_len {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "sortlist_model::list::transaction::update",
                "truncate(len = {len})"
            );

            self.record(len, old_len - len, 0);
            self.values.truncate(len);
        }
    }

    // Must be called before `self.values` is modified.
    fn record(&mut self, position: usize, removed: usize, added: usize) {
        if removed == 0 && added == 0 {
            return;
        }

        // Number of items at the end of the list that this edit leaves alone.
        let tail = self.values.len() - position - removed;
        self.dirty = Some(match self.dirty {
            Some(dirty) => Dirty { start: dirty.start.min(position), tail: dirty.tail.min(tail) },
            None => Dirty { start: position, tail },
        });
    }
}

impl<T> fmt::Debug for ObservableListTransaction<'_, T>
where
    T: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableListTransaction")
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

// No DerefMut, every edit has to go through a method that widens `dirty`.
impl<T: Clone> ops::Deref for ObservableListTransaction<'_, T> {
    type Target = Vector<T>;

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

// Untouched prefix and suffix lengths, in terms of the list before the first
// edit for `start` and relative to the end for `tail`.
#[derive(Clone, Copy, Debug)]
struct Dirty {
    start: usize,
    tail: usize,
}
