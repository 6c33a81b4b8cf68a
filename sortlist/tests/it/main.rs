#![allow(missing_docs)]

use std::{cmp::Ordering, sync::Arc};

use futures_util::{FutureExt, StreamExt};
use sortlist::{SortListModel, SortListUpdate, Sorter};

mod reconcile;
mod timsort;

fn ascending() -> Arc<dyn Sorter<i32>> {
    Arc::new(i32::cmp)
}

fn descending() -> Arc<dyn Sorter<i32>> {
    Arc::new(|left: &i32, right: &i32| -> Ordering { right.cmp(left) })
}

/// Poll `model` until it has nothing more to do, collecting everything it
/// yields.
fn settle<T>(model: &mut SortListModel<T>) -> Vec<SortListUpdate>
where
    T: Clone + Send + Sync + 'static,
{
    let mut updates = Vec::new();
    while let Some(Some(update)) = model.next().now_or_never() {
        updates.push(update);
    }
    updates
}
