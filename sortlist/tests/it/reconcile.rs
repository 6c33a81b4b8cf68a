use std::sync::Arc;

use futures_util::{FutureExt, StreamExt};
use imbl::Vector;
use rand::{rngs::StdRng, Rng, SeedableRng};

use sortlist::{
    ItemsChanged, ObservableList, SortListModel, SortListState, SortListUpdate, Sorter,
};

// A sort key with few distinct values, and a unique id.
type Item = (u8, u32);

fn by_key() -> Arc<dyn Sorter<Item>> {
    Arc::new(|left: &Item, right: &Item| left.0.cmp(&right.0))
}

struct Harness {
    rng: StdRng,
    next_id: u32,
    list: ObservableList<Item>,
    sorted: SortListModel<Item>,
    // The sorted items as announced through `SortListUpdate::Items`.
    mirror: Vec<Item>,
}

impl Harness {
    fn new(seed: u64, capacity: usize) -> Self {
        let mut this = Self {
            rng: StdRng::seed_from_u64(seed),
            next_id: 0,
            list: ObservableList::with_capacity(capacity),
            sorted: SortListModel::new(None, Some(by_key())),
            mirror: Vec::new(),
        };

        let initial = this.new_items(300);
        this.list.append(initial);
        this.sorted.set_model(Some(this.list.subscribe()));
        this
    }

    fn new_items(&mut self, count: usize) -> Vector<Item> {
        (0..count)
            .map(|_| {
                self.next_id += 1;
                (self.rng.gen_range(0..16), self.next_id)
            })
            .collect()
    }

    fn random_edit(&mut self) {
        let len = self.list.len();
        match self.rng.gen_range(0..10) {
            0 => {
                let item = self.new_items(1)[0];
                self.list.push_back(item);
            }
            1 => {
                let item = self.new_items(1)[0];
                self.list.push_front(item);
            }
            2 if len > 0 => {
                let index = self.rng.gen_range(0..len);
                self.list.remove(index);
            }
            3 if len > 0 => {
                let index = self.rng.gen_range(0..len);
                let item = self.new_items(1)[0];
                self.list.set(index, item);
            }
            4 => {
                let index = self.rng.gen_range(0..=len);
                let item = self.new_items(1)[0];
                self.list.insert(index, item);
            }
            5 => {
                let position = self.rng.gen_range(0..=len);
                let removed = self.rng.gen_range(0..=(len - position).min(8));
                let count = self.rng.gen_range(0..8);
                let values = self.new_items(count);
                self.list.splice(position, removed, values);
            }
            6 => {
                let first = self.new_items(1)[0];
                let second = self.new_items(1)[0];
                let index = self.rng.gen_range(0..=len);

                let mut txn = self.list.transaction();
                txn.insert(index, first);
                if index > 0 {
                    txn.remove(index - 1);
                }
                txn.push_back(second);
                txn.commit();
            }
            7 if self.rng.gen_bool(0.05) => self.list.clear(),
            7 => {
                let count = self.rng.gen_range(1..20);
                let values = self.new_items(count);
                self.list.append(values);
            }
            8 if len > 10 => {
                let len = self.rng.gen_range(len - 10..len);
                self.list.truncate(len);
            }
            _ => {
                let count = self.rng.gen_range(0..3);
                let values = self.new_items(count);
                self.list.append(values);
            }
        }
    }

    // Polls once, checking that the announced change covers everything that
    // changed in the sorted items.
    fn poll(&mut self) -> Option<SortListUpdate> {
        let update = self.sorted.next().now_or_never().flatten()?;

        if let SortListUpdate::Items(ItemsChanged { position, removed, added }) = update {
            let current = self.sorted.to_vector();
            let new_items = current.iter().skip(position).take(added).copied();
            self.mirror.splice(position..position + removed, new_items);
            assert_eq!(self.mirror, current.iter().copied().collect::<Vec<_>>());
        }

        Some(update)
    }

    fn settle(&mut self) {
        while self.poll().is_some() {}
    }

    fn check_settled(&self) {
        assert!(!self.sorted.is_sorting());
        assert_eq!(self.sorted.n_items(), self.list.len());

        let current = self.sorted.to_vector();
        assert!(
            current.iter().zip(current.iter().skip(1)).all(|(left, right)| left.0 <= right.0),
            "not sorted: {current:?}"
        );

        // Every item exactly once.
        let mut ids: Vec<_> = current.iter().map(|&(_, id)| id).collect();
        let mut expected_ids: Vec<_> = self.list.iter().map(|&(_, id)| id).collect();
        ids.sort_unstable();
        expected_ids.sort_unstable();
        assert_eq!(ids, expected_ids);
    }
}

#[test]
fn random_edits_interleaved_with_sorting() {
    for seed in 0..20 {
        let mut harness = Harness::new(seed, 16);

        for _ in 0..200 {
            harness.random_edit();

            let polls = harness.rng.gen_range(0..4);
            for _ in 0..polls {
                harness.poll();
            }
        }

        harness.settle();
        harness.check_settled();
        assert_eq!(harness.sorted.state(), SortListState::Sorted);
    }
}

#[test]
fn random_edits_after_settling() {
    for seed in 100..110 {
        let mut harness = Harness::new(seed, 16);
        harness.settle();
        harness.check_settled();

        for _ in 0..100 {
            harness.random_edit();
            harness.settle();
            harness.check_settled();
        }
    }
}

#[test]
fn lagging_model() {
    for seed in 200..205 {
        // With a tiny buffer, most edits are only seen as a change of
        // everything.
        let mut harness = Harness::new(seed, 1);

        for _ in 0..50 {
            for _ in 0..3 {
                harness.random_edit();
            }
            harness.poll();
        }

        harness.settle();
        harness.check_settled();
    }
}

#[test]
fn subscriber_sees_sorted_items() {
    let mut harness = Harness::new(300, 16);
    let mut sub = harness.sorted.subscribe();
    assert_eq!(sub.items().len(), 300);

    for _ in 0..20 {
        harness.random_edit();
        harness.settle();
    }

    while sub.next().now_or_never().flatten().is_some() {}
    assert_eq!(*sub.items(), harness.sorted.to_vector());
}
