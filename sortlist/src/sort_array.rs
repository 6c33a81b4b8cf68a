use std::slice;

/// An item of a sorted list, with its position in the unsorted list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortItem<T> {
    /// The item.
    pub item: T,
    /// The position of the item in the unsorted list.
    pub position: usize,
}

/// The items of a sorted list, in (possibly partially) sorted order.
///
/// Every item knows its position in the unsorted list, so edits of that list
/// can be applied without searching for the affected items.
#[derive(Clone, Debug)]
pub struct SortArray<T> {
    items: Vec<SortItem<T>>,
}

/// The result of [`SortArray::remove_items`]: the number of items at either
/// end of the array that were not affected by the removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unmodified {
    /// The index of the first removed item, in terms of the array after the
    /// removal. If nothing was removed, this is the length of the array.
    pub start: usize,
    /// The number of items after the last removed item. Zero if nothing was
    /// removed.
    pub end: usize,
}

impl<T> SortArray<T> {
    /// Create a new, empty `SortArray`.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the item at `index`.
    pub fn get(&self, index: usize) -> Option<&SortItem<T>> {
        self.items.get(index)
    }

    /// Replace the item at `index`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn set(&mut self, index: usize, item: SortItem<T>) -> SortItem<T> {
        std::mem::replace(&mut self.items[index], item)
    }

    /// Add an item at the end.
    pub fn push(&mut self, item: T, position: usize) {
        self.items.push(SortItem { item, position });
    }

    /// Shorten the array to `len` items, dropping the rest.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Reserve capacity for at least `additional` more items.
    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    /// Drop all items.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate over the items in their current order.
    pub fn iter(&self) -> slice::Iter<'_, SortItem<T>> {
        self.items.iter()
    }

    /// The items as a mutable slice, for sorting them.
    pub fn as_mut_slice(&mut self) -> &mut [SortItem<T>] {
        &mut self.items
    }

    /// Apply the removal part of an edit of the unsorted list to this array.
    ///
    /// In the unsorted list, `removed` items at `position` were replaced by
    /// `added` new ones. Items that were removed are dropped from the array,
    /// positions of items after the edited range are shifted accordingly.
    /// Everything else keeps its order. Adding the new items is up to the
    /// caller.
    pub fn remove_items(&mut self, position: usize, removed: usize, added: usize) -> Unmodified {
        let len = self.items.len();
        let removed_end = position + removed;

        let mut unmodified = Unmodified { start: usize::MAX, end: 0 };
        let mut index = 0;
        let mut kept = 0;
        self.items.retain_mut(|entry| {
            let current = index;
            index += 1;

            if entry.position >= removed_end {
                entry.position = entry.position - removed + added;
            } else if entry.position >= position {
                unmodified.start = unmodified.start.min(kept);
                unmodified.end = len - current - 1;
                return false;
            }

            kept += 1;
            true
        });

        unmodified.start = unmodified.start.min(kept);
        unmodified
    }
}

impl<T> Default for SortArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a SortArray<T> {
    type Item = &'a SortItem<T>;
    type IntoIter = slice::Iter<'a, SortItem<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
