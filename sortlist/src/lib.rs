//! A list model that presents the items of an observable list in sorted
//! order, sorting incrementally.
//!
//! The primary entry point of this library is [`SortListModel`]. It sorts
//! with [`TimSort`], a stable, adaptive merge sort that can be interrupted
//! after every step, so a large list never has to be sorted in one go.
//!
//! Cargo features:
//!
//! - `tracing`: Emit [tracing](https://docs.rs/tracing) events for sorting
//!   progress and list updates

mod sort_array;
mod sort_list_model;
mod timsort;

pub use self::{
    sort_array::{SortArray, SortItem, Unmodified},
    sort_list_model::{SortListModel, SortListState, SortListUpdate},
    timsort::TimSort,
};

#[doc(no_inline)]
pub use sortlist_model::{
    CustomSorter, ItemsChanged, ListModel, ListSender, ListSubscriber, ObservableList, Sorter,
    SorterChange, SorterOrder, Vector,
};
