use indexmap::IndexMap;
use itertools::Itertools;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt::{Debug, Display};

use crate::collection::{Key, Row};
use crate::common::{SortOrder, Value};
use crate::errors::{ErrorKind, RowsetError, RowsetResult};

/// Reads a column off a collection element.
///
/// Rows expose their columns directly; a nested collection is addressed by
/// key; scalars have no columns and yield [Value::Null].
fn column_value(element: &Value, column: &str) -> Value {
    match element {
        Value::Row(row) => row.get(column),
        Value::Collection(shared) => {
            shared.read_with(|nested| nested.get(column).cloned().unwrap_or(Value::Null))
        }
        _ => Value::Null,
    }
}

/// An ordered record container.
///
/// A `Collection` behaves simultaneously as an indexable ordered sequence
/// and as a key/value associative store. Elements live in one ordered
/// backing store mapping a [Key] (integer index or name) to a [Value];
/// freshly appended elements always land on integer keys, so a collection
/// built through [push](Collection::push) is a plain zero-based sequence.
/// Elements are conventionally [Row] records, which is what
/// [merge](Collection::merge), [sort](Collection::sort),
/// [search](Collection::search), and the aggregations address by column
/// name.
///
/// Mutating operations modify the receiver in place and return it (or
/// `RowsetResult` of it where a precondition applies) so calls can chain;
/// [slice](Collection::slice), [filter](Collection::filter), and
/// [search](Collection::search) build new, independent collections.
///
/// The element count always equals the number of live entries in the
/// backing store; there is no separately maintained counter to drift out of
/// sync after a [remove](Collection::remove).
#[derive(Clone, Default)]
pub struct Collection {
    items: IndexMap<Key, Value>,
}

impl Collection {
    /// Creates a new empty collection.
    pub fn new() -> Self {
        Collection {
            items: IndexMap::new(),
        }
    }

    /// Builds a collection from an ordered mapping, classifying its shape.
    ///
    /// If the keys form the contiguous zero-based integer sequence
    /// `0..N`, the mapping already looks like an ordered sequence and is
    /// adopted verbatim. **Any other input is treated as a single
    /// associative record**: the entire mapping becomes ONE element, a
    /// [Row] whose columns are the stringified keys, stored at index 0.
    ///
    /// The wrapping branch is surprising at first sight but intended: the
    /// same constructor accepts either "a list of rows" or "a single row"
    /// and normalizes both into a list-of-rows shape.
    ///
    /// ```rust
    /// use rowset::collection::{Collection, Key};
    /// use rowset::common::Value;
    ///
    /// // associative input: one element, not two
    /// let single = Collection::from_entries(vec![
    ///     (Key::from("name"), Value::from("x")),
    ///     (Key::from("age"), Value::from(3)),
    /// ]);
    /// assert_eq!(single.num_rows(), 1);
    /// ```
    pub fn from_entries<I>(entries: I) -> Collection
    where
        I: IntoIterator<Item = (Key, Value)>,
    {
        let entries: IndexMap<Key, Value> = entries.into_iter().collect();
        let sequential = entries
            .keys()
            .enumerate()
            .all(|(position, key)| key.as_index() == Some(position));

        if sequential {
            return Collection { items: entries };
        }

        // associative input collapses into a single row element
        let mut row = Row::new();
        for (key, value) in entries {
            let _ = row.put(key.to_string(), value);
        }
        let mut items = IndexMap::new();
        items.insert(Key::Index(0), Value::Row(row));
        Collection { items }
    }

    /// Builds a collection by pushing each value in order.
    ///
    /// Collection-typed values flatten, per [push](Collection::push).
    pub fn from_values<I>(values: I) -> Collection
    where
        I: IntoIterator<Item = Value>,
    {
        let mut collection = Collection::new();
        for value in values {
            collection.push(value);
        }
        collection
    }

    /// Builds a collection of row elements.
    pub fn from_rows<I>(rows: I) -> Collection
    where
        I: IntoIterator<Item = Row>,
    {
        Collection::from_values(rows.into_iter().map(Value::Row))
    }

    /// Returns the number of elements in the collection.
    pub fn num_rows(&self) -> usize {
        self.items.len()
    }

    /// Checks if the collection has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Erases the entire collection.
    pub fn clear(&mut self) -> &mut Self {
        self.items.clear();
        self
    }

    /// Replaces the receiver's contents with a copy of `other`, in order.
    ///
    /// The duplicate is independent at the top level only: nested
    /// collections are re-shared by handle, not deep-cloned, so mutating
    /// one of them remains visible through both copies.
    pub fn copy(&mut self, other: &Collection) -> &mut Self {
        self.clear();
        for element in other.items.values() {
            self.push(element.clone());
        }
        self
    }

    /// Adds an element at the end of the collection.
    ///
    /// A [Value::Collection] argument is never stored as-is: it is
    /// flattened into its elements, recursively, so pushing a collection of
    /// N rows grows the receiver by N. Any other value is appended at the
    /// next free integer key.
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if let Value::Collection(nested) = value {
            let elements = nested.read_with(|c| c.items.values().cloned().collect::<Vec<_>>());
            for element in elements {
                self.push(element);
            }
        } else {
            let index = self.next_index();
            self.items.insert(Key::Index(index), value);
        }
        self
    }

    /// Adds an element at the beginning of the collection.
    ///
    /// Flattens a collection argument the same way [push](Collection::push)
    /// does, then the receiver's previous elements follow it.
    pub fn unshift(&mut self, value: impl Into<Value>) -> &mut Self {
        let mut result = Collection::new();
        result.push(value.into());
        for element in self.items.values() {
            result.push(element.clone());
        }
        self.items = result.items;
        self
    }

    /// Removes the last element from the collection.
    ///
    /// # Errors
    ///
    /// Popping an empty collection is a precondition violation and fails
    /// with [ErrorKind::EmptyCollection].
    pub fn pop(&mut self) -> RowsetResult<&mut Self> {
        if self.items.pop().is_none() {
            log::error!("pop on an empty collection");
            return Err(RowsetError::new(
                "pop on an empty collection",
                ErrorKind::EmptyCollection,
            ));
        }
        Ok(self)
    }

    /// Removes the first element from the collection, keeping the order of
    /// the rest. Equivalent to replacing the receiver with `slice(1)`.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::EmptyCollection] on an empty collection.
    pub fn shift(&mut self) -> RowsetResult<&mut Self> {
        if self.is_empty() {
            log::error!("shift on an empty collection");
            return Err(RowsetError::new(
                "shift on an empty collection",
                ErrorKind::EmptyCollection,
            ));
        }
        let rest = self.slice(1, None);
        self.items = rest.items;
        Ok(self)
    }

    /// Cuts a part of the collection starting at positional offset `index`
    /// and taking `length` elements, clipped to the current size. A
    /// `length` of `None` runs to the end of the collection.
    ///
    /// Returns a new collection; the receiver is untouched.
    pub fn slice(&self, index: usize, length: Option<usize>) -> Collection {
        let take = length.unwrap_or_else(|| self.num_rows().saturating_sub(index));
        let mut result = Collection::new();
        for element in self.items.values().skip(index).take(take) {
            result.push(element.clone());
        }
        result
    }

    /// Merges another collection into this one, upserting by key.
    ///
    /// For every row of `other`, the receiver is scanned in order for the
    /// first row whose `id_column` value is loosely equal (numeric
    /// cross-type, numeric text by parsed value) to the incoming one.
    /// A matched row is replaced by the incoming row unless
    /// `keep_existing`; an unmatched incoming row is appended.
    ///
    /// With `recursive`, columns holding collections on both sides are
    /// combined first: the receiver-side nested collection absorbs the
    /// incoming rows in place (observable through every holder of its
    /// handle), and the incoming row is re-pointed at it. When both sides
    /// hold the very same handle the absorb is skipped.
    ///
    /// The scan is unindexed, so merging costs O(receiver × other). That is
    /// fine at in-memory row-set scale and this container does not aim
    /// beyond it.
    pub fn merge(
        &mut self,
        other: &Collection,
        id_column: &str,
        recursive: bool,
        keep_existing: bool,
    ) -> &mut Self {
        let incoming_elements = other.items.values().cloned().collect::<Vec<_>>();
        for mut incoming in incoming_elements {
            let incoming_id = column_value(&incoming, id_column);
            let matched = self
                .items
                .values()
                .position(|existing| column_value(existing, id_column).loosely_eq(&incoming_id));

            let Some(index) = matched else {
                self.push(incoming);
                continue;
            };

            if recursive {
                self.absorb_nested(index, &mut incoming, id_column, keep_existing);
            }
            if !keep_existing {
                if let Some((_, slot)) = self.items.get_index_mut(index) {
                    *slot = incoming;
                }
            }
        }
        self
    }

    /// Nested-collection half of a recursive merge: for every column the
    /// matched rows share, a receiver-side sub-collection absorbs the
    /// incoming one and the incoming row keeps the absorbed handle.
    fn absorb_nested(
        &mut self,
        index: usize,
        incoming: &mut Value,
        id_column: &str,
        keep_existing: bool,
    ) {
        let existing_row = match self.items.get_index(index) {
            Some((_, Value::Row(row))) => row.clone(),
            _ => return,
        };
        let incoming_row = match incoming {
            Value::Row(row) => row,
            _ => return,
        };

        for column in existing_row.columns() {
            let (Value::Collection(ours), Value::Collection(theirs)) =
                (existing_row.get(&column), incoming_row.get(&column))
            else {
                continue;
            };
            // merging a collection into itself would self-deadlock
            if ours.same_handle(&theirs) {
                continue;
            }
            let addition = theirs.snapshot();
            ours.write_with(|nested| {
                nested.merge(&addition, id_column, true, keep_existing);
            });
            // column names taken from a row are never empty
            let _ = incoming_row.put(column.as_str(), Value::Collection(ours.clone()));
        }
    }

    /// Sorts the collection by a column, in place.
    ///
    /// `order` accepts the ascending tokens `"ASC"`, `"asc"`, `"<"` and the
    /// descending tokens `"DESC"`, `"desc"`, `">"`. Any other token leaves
    /// the collection unchanged and logs a warning.
    ///
    /// See [sort_with](Collection::sort_with) for ordering details.
    pub fn sort(&mut self, column: &str, order: &str) -> &mut Self {
        match SortOrder::parse(order) {
            Some(direction) => {
                self.sort_with(column, direction);
            }
            None => {
                log::warn!(
                    "unrecognized sort order token '{}'; collection left unchanged",
                    order
                );
            }
        }
        self
    }

    /// Sorts the collection by a column with an explicit direction.
    ///
    /// Top-down merge sort: the collection splits at the midpoint, both
    /// halves sort recursively, and the halves re-merge by strict
    /// comparison of the column values: numeric values compare
    /// numerically, strings lexicographically.
    ///
    /// Tie-break: when neither side's value compares strictly before the
    /// other, the element is taken from the **right** half. Equal keys are
    /// therefore NOT guaranteed to keep their original relative order
    /// across the split.
    pub fn sort_with(&mut self, column: &str, direction: SortOrder) -> &mut Self {
        let count = self.num_rows();
        if count < 2 {
            return self;
        }

        let mid = count.div_ceil(2);
        let mut left = self.slice(0, Some(mid));
        let mut right = self.slice(mid, None);
        left.sort_with(column, direction);
        right.sort_with(column, direction);

        let left = left.items.into_values().collect::<Vec<_>>();
        let right = right.items.into_values().collect::<Vec<_>>();

        self.clear();
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            let ordering = column_value(&left[i], column).cmp(&column_value(&right[j], column));
            let take_left = match direction {
                SortOrder::Ascending => ordering == Ordering::Less,
                SortOrder::Descending => ordering == Ordering::Greater,
            };
            // ties fall through to the right half
            if take_left {
                self.push(left[i].clone());
                i += 1;
            } else {
                self.push(right[j].clone());
                j += 1;
            }
        }
        for element in &left[i..] {
            self.push(element.clone());
        }
        for element in &right[j..] {
            self.push(element.clone());
        }
        self
    }

    /// Returns a new collection containing every element for which the
    /// predicate holds, preserving order. The receiver is untouched.
    pub fn filter<P>(&self, predicate: P) -> Collection
    where
        P: Fn(&Value) -> bool,
    {
        let mut result = Collection::new();
        for element in self.items.values() {
            if predicate(element) {
                result.push(element.clone());
            }
        }
        result
    }

    /// Uses a regular expression to find matches in the values of a column.
    ///
    /// Returns a new collection of the elements whose column value matched.
    /// Scalar values match by their text rendering; null values, nested
    /// rows, and nested collections never match.
    ///
    /// Caveat: `pattern` is compiled as a raw regular expression. A caller
    /// passing literal column text containing regex metacharacters gets
    /// regex semantics, not literal-string matching.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::InvalidPattern] if the pattern does not
    /// compile.
    pub fn search(&self, column: &str, pattern: &str) -> RowsetResult<Collection> {
        let regex = Regex::new(pattern).map_err(|err| {
            log::error!("invalid search pattern '{}': {}", pattern, err);
            RowsetError::new(
                &format!("invalid search pattern '{}': {}", pattern, err),
                ErrorKind::InvalidPattern,
            )
        })?;

        Ok(self.filter(|element| {
            column_value(element, column)
                .scalar_text()
                .map(|text| regex.is_match(&text))
                .unwrap_or(false)
        }))
    }

    /// Returns the greatest value of a column across all elements, using
    /// the ordinary value ordering.
    ///
    /// The running value seeds from the first element's column (never from
    /// an arbitrary floor, so all-negative columns report correctly).
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::EmptyCollection] on an empty collection.
    pub fn maximum(&self, column: &str) -> RowsetResult<Value> {
        self.fold_column(column, "maximum", |best, candidate| candidate > best)
    }

    /// Returns the smallest value of a column across all elements.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::EmptyCollection] on an empty collection.
    pub fn minimum(&self, column: &str) -> RowsetResult<Value> {
        self.fold_column(column, "minimum", |best, candidate| candidate < best)
    }

    fn fold_column(
        &self,
        column: &str,
        operation: &str,
        replace: impl Fn(&Value, &Value) -> bool,
    ) -> RowsetResult<Value> {
        let mut elements = self.items.values();
        let mut best = match elements.next() {
            Some(element) => column_value(element, column),
            None => {
                log::error!("{} on an empty collection", operation);
                return Err(RowsetError::new(
                    &format!("{} on an empty collection", operation),
                    ErrorKind::EmptyCollection,
                ));
            }
        };
        for element in elements {
            let candidate = column_value(element, column);
            if replace(&best, &candidate) {
                best = candidate;
            }
        }
        Ok(best)
    }

    /// Returns the average of a column across all elements, coercing each
    /// value to f64 (numbers widen, numeric text parses, everything else
    /// counts as zero).
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::EmptyCollection] on an empty collection
    /// instead of dividing by zero.
    pub fn average(&self, column: &str) -> RowsetResult<f64> {
        if self.is_empty() {
            log::error!("average on an empty collection");
            return Err(RowsetError::new(
                "average on an empty collection",
                ErrorKind::EmptyCollection,
            ));
        }
        let total: f64 = self
            .items
            .values()
            .map(|element| column_value(element, column).coerce_f64())
            .sum();
        Ok(total / self.num_rows() as f64)
    }

    /// Checks if a key exists in the collection.
    pub fn exists<K: Into<Key>>(&self, key: K) -> bool {
        self.items.contains_key(&key.into())
    }

    /// Returns the value stored at the key, or `None` if the key is absent.
    /// An absent key is not an error.
    pub fn get<K: Into<Key>>(&self, key: K) -> Option<&Value> {
        self.items.get(&key.into())
    }

    /// Assigns a value to a key, inserting or overwriting.
    ///
    /// Unlike [push](Collection::push), `set` stores a collection value
    /// as-is (by handle) instead of flattening it.
    pub fn set<K: Into<Key>, V: Into<Value>>(&mut self, key: K, value: V) -> &mut Self {
        self.items.insert(key.into(), value.into());
        self
    }

    /// Removes a key and its value, preserving the order of the remaining
    /// elements. Returns the removed value, or `None` if the key was
    /// absent.
    pub fn remove<K: Into<Key>>(&mut self, key: K) -> Option<Value> {
        self.items.shift_remove(&key.into())
    }

    /// Gets an iterator over the `(key, value)` pairs of the collection in
    /// their current order. Each call derives a fresh iterator from the
    /// backing store, so iteration is restartable.
    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.items.iter()
    }

    /// Gets an iterator over the element values in order.
    pub fn values(&self) -> indexmap::map::Values<'_, Key, Value> {
        self.items.values()
    }

    fn next_index(&self) -> usize {
        // a named or out-of-band integer key may already occupy the slot
        let mut index = self.items.len();
        while self.items.contains_key(&Key::Index(index)) {
            index += 1;
        }
        index
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        if self.items.is_empty() {
            return "[]".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let body = self
            .items
            .iter()
            .map(|(key, value)| match key {
                Key::Index(_) => format!("{}{}", indent_str, value.to_pretty_json(indent + 2)),
                Key::Name(name) => format!(
                    "{}\"{}\": {}",
                    indent_str,
                    name,
                    value.to_pretty_json(indent + 2)
                ),
            })
            .join(",\n");
        format!("[\n{}\n{}]", body, " ".repeat(indent))
    }

    pub(crate) fn to_debug_string(&self, indent: usize) -> String {
        if self.items.is_empty() {
            return "[]".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let body = self
            .items
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}{}: {}",
                    indent_str,
                    key,
                    value.to_debug_string(indent + 2)
                )
            })
            .join(",\n");
        format!("[\n{}\n{}]", body, " ".repeat(indent))
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        // entry order matters; the backing map's own equality ignores it
        self.num_rows() == other.num_rows() && self.iter().eq(other.iter())
    }
}

impl Eq for Collection {}

impl Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string(0))
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

impl From<Vec<Value>> for Collection {
    fn from(values: Vec<Value>) -> Self {
        Collection::from_values(values)
    }
}

impl FromIterator<Value> for Collection {
    fn from_iter<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Collection::from_values(values)
    }
}

impl FromIterator<Row> for Collection {
    fn from_iter<I: IntoIterator<Item = Row>>(rows: I) -> Self {
        Collection::from_rows(rows)
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<Key>> std::ops::Index<K> for Collection {
    type Output = Value;

    /// Read half of the indexing operator, wired to
    /// [get](Collection::get).
    ///
    /// # Panics
    ///
    /// Panics if the key is absent; use [get](Collection::get) for a
    /// non-panicking lookup.
    fn index(&self, key: K) -> &Value {
        let key = key.into();
        match self.items.get(&key) {
            Some(value) => value,
            None => panic!("no entry found for key '{}'", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::SharedCollection;
    use crate::row;

    // Setup only one time throughout the project.
    // It will take effect during test, project wide
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    fn numbers() -> Collection {
        Collection::from_rows(vec![
            row! { id: 1, v: 5 },
            row! { id: 2, v: 2 },
            row! { id: 3, v: 9 },
        ])
    }

    // =========================================================================
    // construction
    // =========================================================================

    #[test]
    fn sequential_entries_are_adopted_verbatim() {
        let collection = Collection::from_entries(vec![
            (Key::Index(0), Value::from(10)),
            (Key::Index(1), Value::from(20)),
        ]);
        assert_eq!(collection.num_rows(), 2);
        assert_eq!(collection.get(0usize), Some(&Value::I32(10)));
        assert_eq!(collection.get(1usize), Some(&Value::I32(20)));
    }

    #[test]
    fn associative_entries_collapse_into_a_single_row() {
        let collection = Collection::from_entries(vec![
            (Key::from("name"), Value::from("x")),
            (Key::from("age"), Value::from(3)),
        ]);
        assert_eq!(collection.num_rows(), 1);

        let element = collection.get(0usize).expect("wrapped element");
        let row = element.as_row().expect("row element");
        assert_eq!(row.get("name"), Value::from("x"));
        assert_eq!(row.get("age"), Value::I32(3));
    }

    #[test]
    fn gapped_integer_entries_also_collapse() {
        let collection = Collection::from_entries(vec![(Key::Index(5), Value::from("x"))]);
        assert_eq!(collection.num_rows(), 1);
        let row = collection.get(0usize).and_then(|v| v.as_row().cloned());
        assert_eq!(row.expect("row").get("5"), Value::from("x"));
    }

    #[test]
    fn empty_input_builds_an_empty_collection() {
        let collection = Collection::from_entries(Vec::new());
        assert!(collection.is_empty());
        assert_eq!(collection.num_rows(), 0);
    }

    // =========================================================================
    // push / unshift / pop / shift
    // =========================================================================

    #[test]
    fn push_appends_at_the_next_index() {
        let mut collection = numbers();
        let size_before = collection.num_rows();
        collection.push(Value::Row(row! { id: 4, v: 1 }));

        assert_eq!(collection.num_rows(), size_before + 1);
        assert_eq!(
            collection.get(size_before),
            Some(&Value::Row(row! { id: 4, v: 1 }))
        );
    }

    #[test]
    fn push_flattens_a_collection_argument() {
        let mut collection = Collection::from_values(vec![Value::from(1)]);
        let other = Collection::from_values(vec![Value::from(2), Value::from(3)]);
        collection.push(Value::from(other));

        assert_eq!(collection.num_rows(), 3);
        assert_eq!(collection.get(1usize), Some(&Value::I32(2)));
        assert_eq!(collection.get(2usize), Some(&Value::I32(3)));
    }

    #[test]
    fn push_flattens_recursively() {
        let inner = Collection::from_values(vec![Value::from(2), Value::from(3)]);
        // set stores the nested collection without flattening it
        let mut middle = Collection::from_values(vec![Value::from(1)]);
        middle.set(1usize, Value::from(inner));

        let mut collection = Collection::new();
        collection.push(Value::from(middle));

        assert_eq!(collection.num_rows(), 3);
        assert_eq!(collection.get(0usize), Some(&Value::I32(1)));
        assert_eq!(collection.get(2usize), Some(&Value::I32(3)));
    }

    #[test]
    fn push_chains() {
        let mut collection = Collection::new();
        collection.push(Value::from(1)).push(Value::from(2));
        assert_eq!(collection.num_rows(), 2);
    }

    #[test]
    fn unshift_prepends() {
        let mut collection = numbers();
        collection.unshift(Value::Row(row! { id: 0, v: 7 }));

        assert_eq!(collection.num_rows(), 4);
        assert_eq!(collection.get(0usize), Some(&Value::Row(row! { id: 0, v: 7 })));
        assert_eq!(collection.get(1usize), Some(&Value::Row(row! { id: 1, v: 5 })));
    }

    #[test]
    fn unshift_flattens_a_collection_argument() {
        let mut collection = Collection::from_values(vec![Value::from(9)]);
        let front = Collection::from_values(vec![Value::from(1), Value::from(2)]);
        collection.unshift(Value::from(front));

        assert_eq!(collection.num_rows(), 3);
        assert_eq!(collection.get(0usize), Some(&Value::I32(1)));
        assert_eq!(collection.get(2usize), Some(&Value::I32(9)));
    }

    #[test]
    fn pop_removes_the_last_element() {
        let mut collection = numbers();
        collection.pop().unwrap();
        assert_eq!(collection.num_rows(), 2);
        assert!(!collection.exists(2usize));
    }

    #[test]
    fn pop_then_push_restores_the_collection() {
        let mut collection = numbers();
        let snapshot = collection.clone();
        let last = collection.get(2usize).cloned().unwrap();

        collection.pop().unwrap();
        collection.push(last);

        assert_eq!(collection, snapshot);
    }

    #[test]
    fn pop_on_empty_is_guarded() {
        let mut collection = Collection::new();
        let result = collection.pop();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::EmptyCollection);
        assert_eq!(collection.num_rows(), 0);
    }

    #[test]
    fn shift_drops_the_first_element() {
        let mut collection = numbers();
        collection.shift().unwrap();
        assert_eq!(collection.num_rows(), 2);
        assert_eq!(collection.get(0usize), Some(&Value::Row(row! { id: 2, v: 2 })));
    }

    #[test]
    fn shift_matches_slice_from_one() {
        let collection = Collection::from_rows(vec![row! { id: 1 }, row! { id: 2 }]);
        let sliced = collection.slice(1, None);

        let mut shifted = collection.clone();
        shifted.shift().unwrap();

        assert_eq!(shifted, sliced);
        assert_eq!(shifted.num_rows(), 1);
        assert_eq!(shifted.get(0usize), Some(&Value::Row(row! { id: 2 })));
    }

    #[test]
    fn shift_on_empty_is_guarded() {
        let mut collection = Collection::new();
        let result = collection.shift();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::EmptyCollection);
    }

    // =========================================================================
    // slice / copy / clear
    // =========================================================================

    #[test]
    fn slice_cuts_a_window() {
        let collection =
            Collection::from_values(vec![Value::from(0), Value::from(1), Value::from(2), Value::from(3)]);

        let window = collection.slice(1, Some(2));
        assert_eq!(window.num_rows(), 2);
        assert_eq!(window.get(0usize), Some(&Value::I32(1)));
        assert_eq!(window.get(1usize), Some(&Value::I32(2)));

        // receiver untouched
        assert_eq!(collection.num_rows(), 4);
    }

    #[test]
    fn slice_without_length_runs_to_the_end() {
        let collection = numbers();
        let rest = collection.slice(1, None);
        assert_eq!(rest.num_rows(), 2);
        assert_eq!(rest.get(1usize), Some(&Value::Row(row! { id: 3, v: 9 })));
    }

    #[test]
    fn slice_clips_to_the_collection_size() {
        let collection = numbers();
        assert_eq!(collection.slice(1, Some(50)).num_rows(), 2);
        assert_eq!(collection.slice(10, None).num_rows(), 0);
    }

    #[test]
    fn copy_duplicates_in_order() {
        let source = numbers();
        let mut target = Collection::from_values(vec![Value::from("stale")]);
        target.copy(&source);

        assert_eq!(target, source);
    }

    #[test]
    fn copy_shares_nested_collections_by_handle() {
        let nested = SharedCollection::new(Collection::from_values(vec![Value::from(1)]));

        // a bare push would flatten, so the handle travels inside a row column
        let mut tagged = row! { id: 1 };
        tagged.put("items", Value::Collection(nested.clone())).unwrap();
        let source = Collection::from_rows(vec![tagged]);

        let mut duplicate = Collection::new();
        duplicate.copy(&source);

        nested.write_with(|c| {
            c.push(Value::from(2));
        });

        let through_duplicate = duplicate
            .get(0usize)
            .and_then(|v| v.as_row().cloned())
            .map(|row| row.get("items"))
            .and_then(|v| v.as_collection().cloned())
            .expect("shared nested collection");
        assert_eq!(through_duplicate.read_with(|c| c.num_rows()), 2);
    }

    #[test]
    fn clear_empties_the_collection() {
        let mut collection = numbers();
        collection.clear();
        assert!(collection.is_empty());
    }

    // =========================================================================
    // merge
    // =========================================================================

    #[test]
    fn merge_appends_unknown_ids() {
        let mut target = numbers();
        let other = Collection::from_rows(vec![row! { id: 4, v: 4 }, row! { id: 5, v: 5 }]);
        target.merge(&other, "id", false, false);

        assert_eq!(target.num_rows(), 5);
        assert_eq!(target.get(4usize), Some(&Value::Row(row! { id: 5, v: 5 })));
    }

    #[test]
    fn merge_replaces_matched_rows() {
        let mut target = Collection::from_rows(vec![row! { id: 1, n: "a" }]);
        let other = Collection::from_rows(vec![row! { id: 1, n: "b" }]);
        target.merge(&other, "id", false, false);

        assert_eq!(target.num_rows(), 1);
        assert_eq!(target.get(0usize), Some(&Value::Row(row! { id: 1, n: "b" })));
    }

    #[test]
    fn merge_keep_existing_leaves_matched_rows_untouched() {
        let mut target = Collection::from_rows(vec![row! { id: 1, n: "a" }]);
        let other = Collection::from_rows(vec![row! { id: 1, n: "b" }, row! { id: 2, n: "c" }]);
        target.merge(&other, "id", false, true);

        assert_eq!(target.num_rows(), 2);
        assert_eq!(target.get(0usize), Some(&Value::Row(row! { id: 1, n: "a" })));
        assert_eq!(target.get(1usize), Some(&Value::Row(row! { id: 2, n: "c" })));
    }

    #[test]
    fn merge_matches_the_first_row_only() {
        let mut target =
            Collection::from_rows(vec![row! { id: 1, n: "first" }, row! { id: 1, n: "second" }]);
        let other = Collection::from_rows(vec![row! { id: 1, n: "patched" }]);
        target.merge(&other, "id", false, false);

        assert_eq!(target.get(0usize), Some(&Value::Row(row! { id: 1, n: "patched" })));
        assert_eq!(target.get(1usize), Some(&Value::Row(row! { id: 1, n: "second" })));
    }

    #[test]
    fn merge_matches_ids_loosely() {
        let mut target = Collection::from_rows(vec![row! { id: "1", n: "a" }]);
        let other = Collection::from_rows(vec![row! { id: 1, n: "b" }]);
        target.merge(&other, "id", false, false);

        assert_eq!(target.num_rows(), 1);
        assert_eq!(target.get(0usize), Some(&Value::Row(row! { id: 1, n: "b" })));
    }

    #[test]
    fn merge_size_is_unchanged_when_all_ids_match() {
        let mut target = numbers();
        let other = Collection::from_rows(vec![row! { id: 2, v: 20 }, row! { id: 3, v: 30 }]);
        target.merge(&other, "id", false, false);

        assert_eq!(target.num_rows(), 3);
        assert_eq!(target.get(1usize), Some(&Value::Row(row! { id: 2, v: 20 })));
    }

    #[test]
    fn recursive_merge_absorbs_nested_collections_in_place() {
        let nested = SharedCollection::new(Collection::from_rows(vec![row! { id: 10, q: 1 }]));
        let outside_alias = nested.clone();

        let mut base_row = row! { id: 1 };
        base_row.put("orders", Value::Collection(nested)).unwrap();
        let mut target = Collection::from_rows(vec![base_row]);

        let incoming_orders = Collection::from_rows(vec![row! { id: 11, q: 2 }]);
        let mut incoming_row = row! { id: 1 };
        incoming_row
            .put("orders", Value::from(incoming_orders))
            .unwrap();
        let other = Collection::from_rows(vec![incoming_row]);

        target.merge(&other, "id", true, false);

        // the receiver-side nested collection absorbed the incoming rows,
        // and the merged row points at the very same handle
        assert_eq!(outside_alias.read_with(|c| c.num_rows()), 2);
        let merged_orders = target
            .get(0usize)
            .and_then(|v| v.as_row().cloned())
            .map(|row| row.get("orders"))
            .and_then(|v| v.as_collection().cloned())
            .expect("merged nested collection");
        assert!(merged_orders.same_handle(&outside_alias));
    }

    #[test]
    fn recursive_merge_with_the_same_handle_does_not_deadlock() {
        let nested = SharedCollection::new(Collection::from_rows(vec![row! { id: 10 }]));

        let mut base_row = row! { id: 1 };
        base_row
            .put("orders", Value::Collection(nested.clone()))
            .unwrap();
        let mut target = Collection::from_rows(vec![base_row]);

        let mut incoming_row = row! { id: 1 };
        incoming_row
            .put("orders", Value::Collection(nested.clone()))
            .unwrap();
        let other = Collection::from_rows(vec![incoming_row]);

        target.merge(&other, "id", true, false);
        assert_eq!(nested.read_with(|c| c.num_rows()), 1);
    }

    #[test]
    fn merge_chains() {
        let mut target = Collection::new();
        let a = Collection::from_rows(vec![row! { id: 1 }]);
        let b = Collection::from_rows(vec![row! { id: 2 }]);
        target.merge(&a, "id", false, false).merge(&b, "id", false, false);
        assert_eq!(target.num_rows(), 2);
    }

    // =========================================================================
    // sort
    // =========================================================================

    #[test]
    fn sort_ascending_by_numeric_column() {
        let mut collection = numbers();
        collection.sort("v", "ASC");

        assert_eq!(collection.get(0usize), Some(&Value::Row(row! { id: 2, v: 2 })));
        assert_eq!(collection.get(1usize), Some(&Value::Row(row! { id: 1, v: 5 })));
        assert_eq!(collection.get(2usize), Some(&Value::Row(row! { id: 3, v: 9 })));
    }

    #[test]
    fn sort_descending_by_numeric_column() {
        let mut collection = numbers();
        collection.sort("v", ">");

        assert_eq!(collection.get(0usize), Some(&Value::Row(row! { id: 3, v: 9 })));
        assert_eq!(collection.get(2usize), Some(&Value::Row(row! { id: 2, v: 2 })));
    }

    #[test]
    fn sort_orders_strings_lexicographically() {
        let mut collection = Collection::from_rows(vec![
            row! { id: 1, name: "pear" },
            row! { id: 2, name: "apple" },
            row! { id: 3, name: "mango" },
        ]);
        collection.sort("name", "asc");

        assert_eq!(
            collection.get(0usize),
            Some(&Value::Row(row! { id: 2, name: "apple" }))
        );
        assert_eq!(
            collection.get(2usize),
            Some(&Value::Row(row! { id: 1, name: "pear" }))
        );
    }

    #[test]
    fn sort_is_idempotent() {
        let mut collection = numbers();
        collection.sort("v", "ASC");
        let once = collection.clone();
        collection.sort("v", "ASC");
        assert_eq!(collection, once);
    }

    #[test]
    fn sort_keeps_adjacent_pairs_ordered() {
        let mut collection = Collection::from_rows(
            [9, 1, 8, 2, 7, 3, 6, 4, 5]
                .iter()
                .enumerate()
                .map(|(id, v)| row! { id: (id as i32), v: (*v) })
                .collect::<Vec<_>>(),
        );
        collection.sort("v", "ASC");

        let values = collection
            .values()
            .map(|element| column_value(element, "v"))
            .collect::<Vec<_>>();
        for pair in values.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn sort_takes_ties_from_the_right_half() {
        let mut collection =
            Collection::from_rows(vec![row! { k: 1, tag: "a" }, row! { k: 1, tag: "b" }]);
        collection.sort("k", "ASC");

        // equal keys swap across the split: the right half wins the tie
        assert_eq!(collection.get(0usize), Some(&Value::Row(row! { k: 1, tag: "b" })));
        assert_eq!(collection.get(1usize), Some(&Value::Row(row! { k: 1, tag: "a" })));
    }

    #[test]
    fn sort_with_unrecognized_token_is_a_no_op() {
        let mut collection = numbers();
        let before = collection.clone();
        collection.sort("v", "sideways");
        assert_eq!(collection, before);
    }

    #[test]
    fn sort_by_missing_column_does_not_panic() {
        let mut collection = numbers();
        collection.sort("absent", "ASC");
        assert_eq!(collection.num_rows(), 3);
    }

    // =========================================================================
    // filter / search
    // =========================================================================

    #[test]
    fn filter_keeps_matching_rows_in_order() {
        let collection = numbers();
        let filtered = collection.filter(|element| {
            column_value(element, "v") > Value::I32(3)
        });

        assert_eq!(filtered.num_rows(), 2);
        assert_eq!(filtered.get(0usize), Some(&Value::Row(row! { id: 1, v: 5 })));
        assert_eq!(filtered.get(1usize), Some(&Value::Row(row! { id: 3, v: 9 })));

        // source untouched
        assert_eq!(collection.num_rows(), 3);
    }

    #[test]
    fn filter_with_rejecting_predicate_is_empty() {
        let filtered = numbers().filter(|_| false);
        assert!(filtered.is_empty());
    }

    #[test]
    fn search_matches_by_regex() {
        let collection = Collection::from_rows(vec![
            row! { id: 1, name: "Hello World" },
            row! { id: 2, name: "hello there" },
            row! { id: 3, name: "goodbye" },
        ]);

        let found = collection.search("name", "^hello").unwrap();
        assert_eq!(found.num_rows(), 1);
        assert_eq!(
            found.get(0usize),
            Some(&Value::Row(row! { id: 2, name: "hello there" }))
        );

        let found = collection.search("name", "(?i)hello").unwrap();
        assert_eq!(found.num_rows(), 2);
    }

    #[test]
    fn search_matches_numeric_columns_by_text() {
        let collection = numbers();
        let found = collection.search("v", "^9$").unwrap();
        assert_eq!(found.num_rows(), 1);
        assert_eq!(found.get(0usize), Some(&Value::Row(row! { id: 3, v: 9 })));
    }

    #[test]
    fn search_skips_unmatchable_values() {
        let collection = Collection::from_rows(vec![row! { id: 1 }]);
        // the "name" column is absent, so the value is null and never matches
        let found = collection.search("name", ".*").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn search_surfaces_pattern_errors() {
        let collection = numbers();
        let result = collection.search("v", "(unclosed");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidPattern);
    }

    // =========================================================================
    // aggregation
    // =========================================================================

    #[test]
    fn maximum_and_minimum_scan_the_column() {
        let collection = numbers();
        assert_eq!(collection.maximum("v").unwrap(), Value::I32(9));
        assert_eq!(collection.minimum("v").unwrap(), Value::I32(2));
    }

    #[test]
    fn maximum_handles_all_negative_columns() {
        let collection =
            Collection::from_rows(vec![row! { id: 1, t: (-40) }, row! { id: 2, t: (-7) }]);
        // seeded from the first row, not from zero
        assert_eq!(collection.maximum("t").unwrap(), Value::I32(-7));
        assert_eq!(collection.minimum("t").unwrap(), Value::I32(-40));
    }

    #[test]
    fn maximum_and_minimum_order_strings() {
        let collection = Collection::from_rows(vec![
            row! { id: 1, name: "pear" },
            row! { id: 2, name: "apple" },
        ]);
        assert_eq!(collection.maximum("name").unwrap(), Value::from("pear"));
        assert_eq!(collection.minimum("name").unwrap(), Value::from("apple"));
    }

    #[test]
    fn aggregation_on_empty_is_guarded() {
        let collection = Collection::new();
        for result in [
            collection.maximum("v"),
            collection.minimum("v"),
        ] {
            assert!(result.is_err());
            assert_eq!(result.unwrap_err().kind(), &ErrorKind::EmptyCollection);
        }
        let result = collection.average("v");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::EmptyCollection);
    }

    #[test]
    fn average_coerces_numerically() {
        let collection = Collection::from_rows(vec![
            row! { id: 1, v: 2 },
            row! { id: 2, v: "4" },
            row! { id: 3, v: 6.0 },
        ]);
        assert_eq!(collection.average("v").unwrap(), 4.0);
    }

    // =========================================================================
    // indexed access & iteration
    // =========================================================================

    #[test]
    fn get_set_exists_remove_round_trip() {
        let mut collection = Collection::new();
        collection.set("label", Value::from("tools")).set(0usize, Value::from(1));

        assert!(collection.exists("label"));
        assert!(collection.exists(0usize));
        assert!(!collection.exists("missing"));
        assert_eq!(collection.get("label"), Some(&Value::from("tools")));
        assert_eq!(collection.get("missing"), None);

        let removed = collection.remove("label");
        assert_eq!(removed, Some(Value::from("tools")));
        assert_eq!(collection.remove("label"), None);
    }

    #[test]
    fn remove_keeps_count_and_order_consistent() {
        let mut collection =
            Collection::from_values(vec![Value::from(0), Value::from(1), Value::from(2)]);
        collection.remove(1usize);

        assert_eq!(collection.num_rows(), 2);
        assert_eq!(collection.num_rows(), collection.iter().count());
        let remaining = collection.values().cloned().collect::<Vec<_>>();
        assert_eq!(remaining, vec![Value::I32(0), Value::I32(2)]);
    }

    #[test]
    fn index_operator_reads() {
        let collection = numbers();
        assert_eq!(collection[0usize], Value::Row(row! { id: 1, v: 5 }));
    }

    #[test]
    #[should_panic(expected = "no entry found for key")]
    fn index_operator_panics_on_absent_key() {
        let collection = Collection::new();
        let _ = &collection["missing"];
    }

    #[test]
    fn iteration_yields_pairs_in_order_and_restarts() {
        let collection =
            Collection::from_values(vec![Value::from(10), Value::from(20)]);

        let first_pass = collection.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>();
        assert_eq!(first_pass, vec![Key::Index(0), Key::Index(1)]);

        // a fresh iterator starts over
        let second_pass = collection.iter().count();
        assert_eq!(second_pass, 2);

        for (key, value) in &collection {
            assert!(key.as_index().is_some());
            assert!(value.is_number());
        }
    }

    #[test]
    fn collections_compare_by_content_and_order() {
        let a = Collection::from_values(vec![Value::from(1), Value::from(2)]);
        let b = Collection::from_values(vec![Value::from(1), Value::from(2)]);
        let c = Collection::from_values(vec![Value::from(2), Value::from(1)]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_renders_a_json_like_listing() {
        let collection = Collection::from_values(vec![Value::from(1)]);
        let rendered = collection.to_string();
        assert!(rendered.starts_with('['));
        assert!(rendered.contains('1'));
    }
}
