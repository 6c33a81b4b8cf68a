//! A stable, adaptive merge sort that runs in discrete steps.

use std::{cmp::Ordering, fmt};

use arrayvec::ArrayVec;

mod merge;

/// Arrays shorter than this are sorted as a single run by insertion sort.
const MIN_MERGE: usize = 64;

/// Initial number of consecutive wins of one run after which merging switches
/// to galloping.
const MIN_GALLOP: usize = 7;

/// Enough for 2^64 elements given the run length invariants.
const MAX_PENDING: usize = 85;

/// A sorted range of the data that still has to be merged with its
/// neighbors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run {
    start: usize,
    len: usize,
}

/// The state of one resumable sort of `len` elements.
///
/// The data itself is not owned by `TimSort`, it is passed to every call of
/// [`step`][Self::step] instead, so the owner can hand out read access to it
/// between steps. It must not be modified in between though: the sort
/// remembers which ranges it has already sorted.
///
/// Every step does a bounded amount of work: it either finds the next natural
/// run in the data (extending short runs by insertion sort) or merges two
/// adjacent runs.
///
/// ```
/// use sortlist::TimSort;
///
/// let mut data = vec![5, 3, 1, 4, 2];
/// let mut sort = TimSort::new(data.len(), 0);
/// while sort.step(&mut data, |a, b| a.cmp(b)) {}
///
/// assert_eq!(data, [1, 2, 3, 4, 5]);
/// assert!(sort.is_finished());
/// ```
pub struct TimSort<E> {
    len: usize,
    already_sorted: usize,

    // Start of the data that isn't part of a pending run yet.
    cursor: usize,
    min_run: usize,
    min_gallop: usize,
    pending: ArrayVec<Run, MAX_PENDING>,

    // Copy of the shorter run while merging, empty between steps.
    tmp: Vec<E>,
    steps: usize,
}

impl<E: Clone> TimSort<E> {
    /// Start sorting `len` elements, the first `already_sorted` of which are
    /// known to be sorted.
    ///
    /// `already_sorted` is clamped to `len`. The known-sorted prefix is never
    /// examined again, it only takes part in merges.
    pub fn new(len: usize, already_sorted: usize) -> Self {
        let already_sorted = already_sorted.min(len);

        let mut pending = ArrayVec::new();
        if already_sorted > 0 {
            pending.push(Run { start: 0, len: already_sorted });
        }

        Self {
            len,
            already_sorted,
            // Fewer than two elements are sorted as they are.
            cursor: if len < 2 { len } else { already_sorted },
            min_run: min_run_length(len),
            min_gallop: MIN_GALLOP,
            pending,
            tmp: Vec::new(),
            steps: 0,
        }
    }

    /// Do the next bit of sorting.
    ///
    /// Returns whether there is more work to do. Once it has returned `false`,
    /// calling it again does nothing.
    ///
    /// `compare` must be a consistent total preorder, and must be the same
    /// ordering on every call of the same sort.
    ///
    /// # Panics
    ///
    /// Panics if `data` doesn't have the length this sort was started with.
    #[track_caller]
    pub fn step<F>(&mut self, data: &mut [E], mut compare: F) -> bool
    where
        F: FnMut(&E, &E) -> Ordering,
    {
        assert_eq!(
            data.len(),
            self.len,
            "sort was started for {} elements, but stepped with {}",
            self.len,
            data.len()
        );

        let mut is_less = |a: &E, b: &E| compare(a, b) == Ordering::Less;

        if let Some(index) = collapse(&self.pending, self.len) {
            self.merge_at(data, index, &mut is_less);
        } else if self.cursor < self.len {
            let run = self.next_run(data, &mut is_less);
            self.pending.push(run);
        } else {
            return false;
        }

        self.steps += 1;
        !self.is_finished()
    }

    /// Stop sorting, whether done or not, and release all scratch memory.
    ///
    /// Afterwards, the sort is finished and [`step`][Self::step] does nothing.
    pub fn finish(&mut self) {
        self.tmp = Vec::new();
        self.pending.clear();
        self.cursor = self.len;
    }

    fn next_run<F>(&mut self, data: &mut [E], is_less: &mut F) -> Run
    where
        F: FnMut(&E, &E) -> bool,
    {
        let start = self.cursor;
        let rest = &mut data[start..];

        let (mut len, was_reversed) = find_streak(rest, is_less);
        if was_reversed {
            rest[..len].reverse();
        }

        let min_len = self.min_run.min(rest.len());
        if len < min_len {
            insertion_sort(&mut rest[..min_len], len, is_less);
            len = min_len;
        }

        self.cursor += len;
        Run { start, len }
    }

    fn merge_at<F>(&mut self, data: &mut [E], index: usize, is_less: &mut F)
    where
        F: FnMut(&E, &E) -> bool,
    {
        let left = self.pending[index];
        let right = self.pending[index + 1];
        debug_assert_eq!(left.start + left.len, right.start);

        self.pending[index] = Run { start: left.start, len: left.len + right.len };
        self.pending.remove(index + 1);

        merge::merge(
            &mut data[left.start..right.start + right.len],
            left.len,
            &mut self.tmp,
            &mut self.min_gallop,
            is_less,
        );
    }
}

impl<E> TimSort<E> {
    /// The number of elements being sorted.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no elements to sort.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of the known-sorted prefix this sort was started with.
    pub fn already_sorted(&self) -> usize {
        self.already_sorted
    }

    /// The number of steps that did work so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Whether the data is completely sorted (or the sort was
    /// [finished][Self::finish] early).
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.len && collapse(&self.pending, self.len).is_none()
    }
}

impl<E> fmt::Debug for TimSort<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimSort")
            .field("len", &self.len)
            .field("already_sorted", &self.already_sorted)
            .field("cursor", &self.cursor)
            .field("pending", &self.pending)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

// Examines the stack of runs and identifies the next pair of runs to merge. If
// `Some(r)` is returned, `runs[r]` and `runs[r + 1]` must be merged next. If
// the next run should be found instead, `None` is returned.
//
// The invariants have to be enforced on the top four runs, the top three are
// not enough to keep them for all runs in the stack. Once the top run ends at
// `stop`, merges are demanded until the stack is fully collapsed.
fn collapse(runs: &[Run], stop: usize) -> Option<usize> {
    let n = runs.len();
    if n >= 2
        && (runs[n - 1].start + runs[n - 1].len == stop
            || runs[n - 2].len <= runs[n - 1].len
            || (n >= 3 && runs[n - 3].len <= runs[n - 2].len + runs[n - 1].len)
            || (n >= 4 && runs[n - 4].len <= runs[n - 3].len + runs[n - 2].len))
    {
        if n >= 3 && runs[n - 3].len < runs[n - 1].len {
            Some(n - 3)
        } else {
            Some(n - 2)
        }
    } else {
        None
    }
}

// Finds a streak of presorted elements at the beginning of the slice. Returns
// its length, and whether it is strictly descending (and has to be reversed).
fn find_streak<E, F>(v: &[E], is_less: &mut F) -> (usize, bool)
where
    F: FnMut(&E, &E) -> bool,
{
    let len = v.len();
    if len < 2 {
        return (len, false);
    }

    let mut end = 2;
    if is_less(&v[1], &v[0]) {
        while end < len && is_less(&v[end], &v[end - 1]) {
            end += 1;
        }
        (end, true)
    } else {
        while end < len && !is_less(&v[end], &v[end - 1]) {
            end += 1;
        }
        (end, false)
    }
}

// Binary insertion sort of `v`, the first `sorted` elements of which already
// are. Equal elements keep their order.
fn insertion_sort<E, F>(v: &mut [E], sorted: usize, is_less: &mut F)
where
    F: FnMut(&E, &E) -> bool,
{
    for i in sorted.max(1)..v.len() {
        let (head, tail) = v.split_at(i);
        let pivot = &tail[0];
        let position = head.partition_point(|x| !is_less(pivot, x));
        v[position..=i].rotate_right(1);
    }
}

// Python's listsort computes this the same way: for `n < MIN_MERGE` it's `n`,
// otherwise a value in `MIN_MERGE / 2..=MIN_MERGE` such that `n / min_run` is
// a power of two or slightly less.
fn min_run_length(mut n: usize) -> usize {
    let mut r = 0;
    while n >= MIN_MERGE {
        r |= n & 1;
        n >>= 1;
    }
    n + r
}
