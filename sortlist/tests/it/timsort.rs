use std::cell::Cell;

use rand::{rngs::StdRng, Rng, SeedableRng};
use sortlist::TimSort;

fn sort_all<T: Clone + Ord>(data: &mut [T], already_sorted: usize) -> usize {
    let mut sort = TimSort::new(data.len(), already_sorted);
    while sort.step(data, |left, right| left.cmp(right)) {}
    assert!(sort.is_finished());
    sort.steps()
}

// Sorts by key only, counting comparisons.
fn sort_by_key_counting(data: &mut [(u32, usize)]) -> (usize, usize) {
    let comparisons = Cell::new(0);
    let mut sort = TimSort::new(data.len(), 0);
    while sort.step(data, |left, right| {
        comparisons.set(comparisons.get() + 1);
        left.0.cmp(&right.0)
    }) {}
    (sort.steps(), comparisons.get())
}

#[test]
fn sorts_like_std() {
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for len in [0, 1, 2, 3, 10, 63, 64, 65, 100, 257, 1000, 4096, 10_000] {
        for max in [4, 1000, u32::MAX] {
            let mut data: Vec<u32> = (0..len).map(|_| rng.gen_range(0..max)).collect();
            let mut expected = data.clone();
            expected.sort();

            sort_all(&mut data, 0);
            assert_eq!(data, expected, "len = {len}, max = {max}");
        }
    }
}

#[test]
fn stable() {
    let mut rng = StdRng::seed_from_u64(7);

    for len in [5, 64, 500, 3000] {
        // Few distinct keys, tagged with their original index.
        let mut data: Vec<(u32, usize)> = (0..len).map(|i| (rng.gen_range(0..8), i)).collect();
        let mut expected = data.clone();
        expected.sort_by_key(|&(key, _)| key);

        sort_by_key_counting(&mut data);
        assert_eq!(data, expected, "len = {len}");
    }
}

#[test]
fn adaptive() {
    // Every key appears twice, so the reversed input has no long strictly
    // descending runs.
    let sorted: Vec<(u32, usize)> = (0..2000).map(|i| (i as u32 / 2, i)).collect();
    let mut reversed = sorted.clone();
    reversed.reverse();

    let mut data = sorted.clone();
    let (sorted_steps, sorted_comparisons) = sort_by_key_counting(&mut data);
    assert_eq!(data, sorted);
    assert!(sorted_steps <= 2, "{sorted_steps} steps for sorted input");
    assert_eq!(sorted_comparisons, sorted.len() - 1);

    let mut data = reversed;
    let (reversed_steps, reversed_comparisons) = sort_by_key_counting(&mut data);
    assert!(sorted_comparisons < reversed_comparisons);
    assert!(sorted_steps < reversed_steps);
}

#[test]
fn descending_runs_are_reversed() {
    let mut data: Vec<i32> = (0..1000).rev().collect();
    let steps = sort_all(&mut data, 0);

    assert_eq!(data, (0..1000).collect::<Vec<_>>());
    assert_eq!(steps, 1);
}

#[test]
fn deterministic() {
    let mut rng = StdRng::seed_from_u64(42);
    let input: Vec<u16> = (0..5000).map(|_| rng.gen()).collect();

    let mut first = input.clone();
    let mut second = input;
    assert_eq!(sort_all(&mut first, 0), sort_all(&mut second, 0));
    assert_eq!(first, second);
}

#[test]
fn bounded_steps() {
    let mut rng = StdRng::seed_from_u64(1);
    let len = 10_000;
    let mut data: Vec<u32> = (0..len).map(|_| rng.gen()).collect();

    // Every run is at least 32 items long, and there is one merge per run.
    let steps = sort_all(&mut data, 0);
    assert!(steps <= 2 * (len / 32 + 1), "{steps} steps");
}

#[test]
fn readable_between_steps() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut data: Vec<u32> = (0..3000).map(|_| rng.gen_range(0..100)).collect();
    let mut expected = data.clone();
    expected.sort();

    let mut sort = TimSort::new(data.len(), 0);
    let mut steps = 0;
    loop {
        let more = sort.step(&mut data, |left, right| left.cmp(right));
        steps += 1;
        assert_eq!(sort.steps(), steps);

        // Between steps, the data is always a permutation of the input.
        let mut current = data.clone();
        current.sort();
        assert_eq!(current, expected);

        if !more {
            break;
        }
    }

    assert_eq!(data, expected);
    assert!(!sort.step(&mut data, |left, right| left.cmp(right)));
    assert_eq!(sort.steps(), steps);
}

#[test]
fn nothing_to_do() {
    let mut empty: Vec<i32> = Vec::new();
    let mut sort = TimSort::new(0, 0);
    assert!(sort.is_finished());
    assert!(!sort.step(&mut empty, |left, right| left.cmp(right)));
    assert_eq!(sort.steps(), 0);

    let mut single = vec![1];
    let mut sort = TimSort::new(1, 0);
    assert!(sort.is_finished());
    assert!(!sort.step(&mut single, |left, right| left.cmp(right)));
    assert_eq!(sort.steps(), 0);

    // The known-sorted prefix is never validated beyond the length.
    let mut data = vec![1, 2, 3];
    let mut sort = TimSort::new(3, 10);
    assert_eq!(sort.already_sorted(), 3);
    assert!(sort.is_finished());
    assert!(!sort.step(&mut data, |left, right| left.cmp(right)));
    assert_eq!(sort.steps(), 0);
}

#[test]
fn already_sorted_prefix() {
    let mut data = vec![1, 3, 5, 7, 9, 2, 4, 6];
    let mut sort = TimSort::new(data.len(), 5);
    assert_eq!(sort.already_sorted(), 5);
    assert!(!sort.is_finished());

    // One step to find the tail run, one to merge it into the prefix.
    assert!(sort.step(&mut data, |left, right| left.cmp(right)));
    assert!(!sort.step(&mut data, |left, right| left.cmp(right)));
    assert_eq!(data, [1, 2, 3, 4, 5, 6, 7, 9]);
    assert_eq!(sort.steps(), 2);
}

#[test]
fn long_prefix_with_short_tail() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut data: Vec<u32> = (0..5000).map(|_| rng.gen_range(0..1000)).collect();
    data.sort();
    // Shorter than the minimum run length, so it becomes a single run.
    let tail: Vec<u32> = (0..30).map(|_| rng.gen_range(0..1000)).collect();
    data.extend(&tail);

    let mut expected = data.clone();
    expected.sort();

    let steps = sort_all(&mut data, 5000);
    assert_eq!(data, expected);
    assert_eq!(steps, 2);
}

#[test]
fn finish_early() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut data: Vec<u32> = (0..1000).map(|_| rng.gen()).collect();
    let mut expected = data.clone();
    expected.sort();

    let mut sort = TimSort::new(data.len(), 0);
    assert!(sort.step(&mut data, |left, right| left.cmp(right)));
    sort.finish();

    assert!(sort.is_finished());
    assert!(!sort.step(&mut data, |left, right| left.cmp(right)));

    // Abandoning leaves the data intact, just not sorted.
    data.sort();
    assert_eq!(data, expected);
}
