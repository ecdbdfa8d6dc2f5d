//! # Rowset - Ordered Record Container
//!
//! Rowset is a small container library for manipulating lists of
//! heterogeneous "row" records without writing ad hoc loops. A
//! [Collection](collection::Collection) behaves simultaneously as an
//! indexable ordered sequence and as a key/value associative store.
//!
//! ## Key Features
//!
//! - **Hybrid shape**: positional access and named keys over one ordered
//!   backing store
//! - **Structural operations**: push/unshift/pop/shift/slice, with
//!   collection arguments flattened into their elements
//! - **Upsert merge**: combine row sets by an identifier column, optionally
//!   absorbing nested collections recursively and in place
//! - **Sorting**: merge sort by any column, ascending or descending, over
//!   numeric or lexicographic values
//! - **Queries**: predicate filter, regex column search, and
//!   min/max/average aggregation
//! - **Untyped rows**: any column, any row shape, dynamically compared
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rowset::collection::Collection;
//! use rowset::row;
//!
//! # fn main() -> rowset::errors::RowsetResult<()> {
//! let mut users = Collection::from_rows(vec![
//!     row!{ id: 1, name: "Alice", age: 30 },
//!     row!{ id: 2, name: "Bob", age: 25 },
//! ]);
//!
//! // Upsert newer rows by id
//! let updates = Collection::from_rows(vec![row!{ id: 2, name: "Bob", age: 26 }]);
//! users.merge(&updates, "id", false, false);
//!
//! // Sort and query
//! users.sort("age", "ASC");
//! let adults = users.filter(|row| true);
//! let found = users.search("name", "^A")?;
//! let oldest = users.maximum("age")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - The collection container, rows, keys, and shared
//!   nested-collection handles
//! - [`common`] - The tagged value variant and sort order
//! - [`errors`] - Error types and result definitions

pub mod collection;
pub mod common;
pub mod errors;

pub use collection::{Collection, Key, Row, SharedCollection};
pub use common::{SortOrder, Value};
pub use errors::{ErrorKind, RowsetError, RowsetResult};
