//! The ordered record container and its building blocks.
//!
//! # Rows
//!
//! A [Row] is a column-name to [Value](crate::common::Value) mapping, the
//! conventional element shape of a collection:
//!
//! ```rust,ignore
//! use rowset::row;
//!
//! let row = row!{ id: 1, name: "Alice", age: 30 };
//! ```
//!
//! # Collections
//!
//! A [Collection] holds elements in one ordered backing store keyed by
//! [Key] and supports structural operations (push, unshift, pop, shift,
//! slice, merge), a merge sort, and query operations (filter, regex search,
//! min/max/average over a column):
//!
//! ```rust,ignore
//! use rowset::collection::Collection;
//! use rowset::row;
//!
//! let mut users = Collection::from_rows(vec![
//!     row!{ id: 1, name: "Alice" },
//!     row!{ id: 2, name: "Bob" },
//! ]);
//! users.sort("name", "ASC");
//! let found = users.search("name", "^A")?;
//! ```
//!
//! # Nested collections
//!
//! A collection stored inside a row travels as a [SharedCollection] handle;
//! every holder observes in-place mutation. See the module documentation on
//! [shared](SharedCollection) and the recursive branch of
//! [Collection::merge].

#[allow(clippy::module_inception)]
mod collection;
mod key;
mod row;
mod shared;

pub use collection::*;
pub use key::*;
pub use row::*;
pub use shared::*;
