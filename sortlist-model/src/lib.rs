//! Observable lists and sorters, the inputs of a sorted list model.
//!
//! [`ObservableList`] is an ordered list of elements that broadcasts every
//! edit as an [`ItemsChanged`] notification. [`Sorter`] is the comparison
//! side: a total preorder over two items that can announce that its ordering
//! may have changed.
//!
//! Cargo features:
//!
//! - `tracing`: Emit [tracing] events when updates are sent out
//! - `serde`: Implement `serde::Serialize` for the notification types

mod list;
mod sorter;

pub use list::{
    ItemsChanged, ListId, ListModel, ListSender, ListSubscriber, ObservableList,
    ObservableListTransaction,
};
pub use sorter::{CustomSorter, Sorter, SorterChange, SorterOrder, SorterSubscriber};

#[doc(no_inline)]
pub use imbl::Vector;
