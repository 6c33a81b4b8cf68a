use imbl::vector;
use stream_assert::{assert_next_eq, assert_pending};

use sortlist_model::{ItemsChanged, ObservableList};

#[test]
fn coalesced_change() {
    let mut list: ObservableList<i32> = ObservableList::from(vector![1, 2, 3, 4, 5]);
    let mut sub = list.subscribe();

    let mut txn = list.transaction();
    txn.set(1, 20);
    txn.remove(3);
    assert_eq!(*txn, vector![1, 20, 3, 5]);
    txn.commit();

    // The first and the last item were never touched.
    assert_next_eq!(sub, ItemsChanged::new(1, 3, 2));
    assert_eq!(*sub.items(), vector![1, 20, 3, 5]);
    assert_pending!(sub);
}

#[test]
fn both_ends() {
    let mut list: ObservableList<i32> = ObservableList::from(vector![1, 2, 3]);
    let mut sub = list.subscribe();

    let mut txn = list.transaction();
    txn.push_front(0);
    txn.push_back(4);
    txn.commit();

    assert_next_eq!(sub, ItemsChanged::new(0, 3, 5));
    assert_eq!(*list, vector![0, 1, 2, 3, 4]);
}

#[test]
fn append_and_truncate() {
    let mut list: ObservableList<i32> = ObservableList::from(vector![1, 2, 3]);
    let mut sub = list.subscribe();

    let mut txn = list.transaction();
    txn.append(vector![4, 5, 6]);
    txn.truncate(4);
    txn.insert(4, 7);
    txn.commit();

    assert_next_eq!(sub, ItemsChanged::new(3, 0, 2));
    assert_eq!(*list, vector![1, 2, 3, 4, 7]);
}

#[test]
fn clear_then_refill() {
    let mut list: ObservableList<i32> = ObservableList::from(vector![1, 2]);
    let mut sub = list.subscribe();

    let mut txn = list.transaction();
    txn.clear();
    txn.push_back(3);
    txn.commit();

    assert_next_eq!(sub, ItemsChanged::new(0, 2, 1));
    assert_eq!(*list, vector![3]);
}

#[test]
fn rollback() {
    let mut list: ObservableList<i32> = ObservableList::from(vector![1, 2]);
    let mut sub = list.subscribe();

    let mut txn = list.transaction();
    txn.push_back(3);
    txn.rollback();
    assert_eq!(*txn, vector![1, 2]);
    txn.commit();

    assert_pending!(sub);
    assert_eq!(*list, vector![1, 2]);
}

#[test]
fn drop_discards() {
    let mut list: ObservableList<i32> = ObservableList::from(vector![1, 2]);
    let mut sub = list.subscribe();

    let mut txn = list.transaction();
    txn.remove(0);
    drop(txn);

    assert_pending!(sub);
    assert_eq!(*list, vector![1, 2]);
}

#[test]
fn noop_edits() {
    let mut list: ObservableList<i32> = ObservableList::from(vector![1, 2]);
    let mut sub = list.subscribe();

    let mut txn = list.transaction();
    txn.truncate(5);
    txn.append(vector![]);
    txn.commit();

    assert_pending!(sub);
}
