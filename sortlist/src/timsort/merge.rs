//! Merging of two adjacent sorted runs, with galloping.

use super::MIN_GALLOP;

/// Merge the sorted runs `v[..mid]` and `v[mid..]` in place.
///
/// `tmp` is used as scratch space for the shorter of the two runs, and is
/// empty again afterwards. `min_gallop` is adjusted to how well galloping
/// paid off.
pub(super) fn merge<E, F>(
    v: &mut [E],
    mid: usize,
    tmp: &mut Vec<E>,
    min_gallop: &mut usize,
    is_less: &mut F,
) where
    E: Clone,
    F: FnMut(&E, &E) -> bool,
{
    if mid == 0 || mid == v.len() {
        return;
    }

    // Elements of the left run that are not greater than the first element of
    // the right run are already in place.
    let skip = gallop(&v[..mid], 0, |x| !is_less(&v[mid], x));
    let v = &mut v[skip..];
    let mid = mid - skip;
    if mid == 0 {
        return;
    }

    // Same for elements of the right run not less than the last element of the
    // left run.
    let keep = gallop(&v[mid..], v.len() - mid - 1, |x| is_less(x, &v[mid - 1]));
    let v = &mut v[..mid + keep];
    if keep == 0 {
        return;
    }

    if mid <= keep {
        merge_lo(v, mid, tmp, min_gallop, is_less);
    } else {
        merge_hi(v, mid, tmp, min_gallop, is_less);
    }
}

// Merges front to back, with the left run moved to `tmp`.
//
// Requires `v[mid] < v[0]` and `v[len - 1] < v[mid - 1]`.
fn merge_lo<E, F>(
    v: &mut [E],
    mid: usize,
    tmp: &mut Vec<E>,
    min_gallop: &mut usize,
    is_less: &mut F,
) where
    E: Clone,
    F: FnMut(&E, &E) -> bool,
{
    let len = v.len();
    tmp.clear();
    tmp.extend_from_slice(&v[..mid]);
    let mut left = tmp.drain(..);

    // Everything before `dest` is merged, everything from `right` on is the
    // remainder of the right run. The slots in between hold stale values.
    let mut dest = 0;
    let mut right = mid;

    v.swap(dest, right);
    dest += 1;
    right += 1;

    'merge: loop {
        let mut left_count = 0;
        let mut right_count = 0;

        // One element at a time, until one run wins often enough in a row.
        loop {
            if right == len {
                break 'merge;
            }
            let Some(first_left) = left.as_slice().first() else { break 'merge };

            if is_less(&v[right], first_left) {
                v.swap(dest, right);
                dest += 1;
                right += 1;
                right_count += 1;
                left_count = 0;
                if right_count >= *min_gallop {
                    break;
                }
            } else {
                if let Some(value) = left.next() {
                    v[dest] = value;
                    dest += 1;
                }
                left_count += 1;
                right_count = 0;
                if left_count >= *min_gallop {
                    break;
                }
            }
        }

        // Gallop, until neither run wins by a good margin anymore.
        loop {
            if right == len || left.as_slice().is_empty() {
                break 'merge;
            }

            left_count = gallop(left.as_slice(), 0, |x| !is_less(&v[right], x));
            for value in left.by_ref().take(left_count) {
                v[dest] = value;
                dest += 1;
            }
            if left.as_slice().is_empty() {
                break 'merge;
            }

            v.swap(dest, right);
            dest += 1;
            right += 1;
            if right == len {
                break 'merge;
            }

            let Some(first_left) = left.as_slice().first() else { break 'merge };
            right_count = gallop(&v[right..], 0, |x| is_less(x, first_left));
            for _ in 0..right_count {
                v.swap(dest, right);
                dest += 1;
                right += 1;
            }
            if right == len {
                break 'merge;
            }

            if let Some(value) = left.next() {
                v[dest] = value;
                dest += 1;
            }

            *min_gallop = min_gallop.saturating_sub(1).max(1);
            if left_count < MIN_GALLOP && right_count < MIN_GALLOP {
                break;
            }
        }

        *min_gallop += 1;
    }

    // The rest of the right run already is where it belongs.
    for value in left {
        v[dest] = value;
        dest += 1;
    }
    debug_assert_eq!(dest, right);
}

// Merges back to front, with the right run moved to `tmp`.
//
// Requires `v[mid] < v[0]` and `v[len - 1] < v[mid - 1]`.
fn merge_hi<E, F>(
    v: &mut [E],
    mid: usize,
    tmp: &mut Vec<E>,
    min_gallop: &mut usize,
    is_less: &mut F,
) where
    E: Clone,
    F: FnMut(&E, &E) -> bool,
{
    tmp.clear();
    tmp.extend_from_slice(&v[mid..]);
    let mut right = tmp.drain(..);

    // Everything from `dest` on is merged, everything before `left` is the
    // remainder of the left run. The slots in between hold stale values.
    let mut dest = v.len();
    let mut left = mid;

    v.swap(dest - 1, left - 1);
    dest -= 1;
    left -= 1;

    'merge: loop {
        let mut left_count = 0;
        let mut right_count = 0;

        loop {
            if left == 0 {
                break 'merge;
            }
            let Some(last_right) = right.as_slice().last() else { break 'merge };

            if is_less(last_right, &v[left - 1]) {
                v.swap(dest - 1, left - 1);
                dest -= 1;
                left -= 1;
                left_count += 1;
                right_count = 0;
                if left_count >= *min_gallop {
                    break;
                }
            } else {
                if let Some(value) = right.next_back() {
                    dest -= 1;
                    v[dest] = value;
                }
                right_count += 1;
                left_count = 0;
                if right_count >= *min_gallop {
                    break;
                }
            }
        }

        loop {
            if left == 0 {
                break 'merge;
            }
            let Some(last_right) = right.as_slice().last() else { break 'merge };

            left_count = left - gallop(&v[..left], left - 1, |x| !is_less(last_right, x));
            for _ in 0..left_count {
                v.swap(dest - 1, left - 1);
                dest -= 1;
                left -= 1;
            }
            if left == 0 {
                break 'merge;
            }

            if let Some(value) = right.next_back() {
                dest -= 1;
                v[dest] = value;
            }
            let right_len = right.as_slice().len();
            if right_len == 0 {
                break 'merge;
            }

            right_count =
                right_len - gallop(right.as_slice(), right_len - 1, |x| is_less(x, &v[left - 1]));
            for value in right.by_ref().rev().take(right_count) {
                dest -= 1;
                v[dest] = value;
            }
            if right.as_slice().is_empty() {
                break 'merge;
            }

            v.swap(dest - 1, left - 1);
            dest -= 1;
            left -= 1;

            *min_gallop = min_gallop.saturating_sub(1).max(1);
            if left_count < MIN_GALLOP && right_count < MIN_GALLOP {
                break;
            }
        }

        *min_gallop += 1;
    }

    // The rest of the left run already is where it belongs.
    while let Some(value) = right.next_back() {
        dest -= 1;
        v[dest] = value;
    }
    debug_assert_eq!(dest, left);
}

/// Find the number of leading elements of `run` for which `before` is true.
///
/// `before` must be true for a (possibly empty) prefix of `run` and false for
/// the rest. The search starts at `hint` and gallops away from it
/// exponentially, so it's fast if the result is close to `hint`.
pub(super) fn gallop<E>(run: &[E], hint: usize, mut before: impl FnMut(&E) -> bool) -> usize {
    let len = run.len();
    debug_assert!(hint < len);

    let mut last_ofs = 0;
    let mut ofs = 1;

    let (mut lo, mut hi) = if before(&run[hint]) {
        // Gallop right until `run[hint + last_ofs] < result <= run[hint + ofs]`.
        let max_ofs = len - hint;
        while ofs < max_ofs && before(&run[hint + ofs]) {
            last_ofs = ofs;
            ofs = (ofs << 1) + 1;
        }
        ofs = ofs.min(max_ofs);
        (hint + last_ofs + 1, hint + ofs)
    } else {
        // Gallop left until `run[hint - ofs] < result <= run[hint - last_ofs]`.
        let max_ofs = hint + 1;
        while ofs < max_ofs && !before(&run[hint - ofs]) {
            last_ofs = ofs;
            ofs = (ofs << 1) + 1;
        }
        ofs = ofs.min(max_ofs);
        (hint + 1 - ofs, hint - last_ofs)
    };

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if before(&run[mid]) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    lo
}
