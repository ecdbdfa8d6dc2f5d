use im::OrdMap;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::common::Value;
use crate::errors::{ErrorKind, RowsetError, RowsetResult};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

type ColumnVec = SmallVec<[String; 8]>;

/// A single record inside a [Collection](crate::collection::Collection).
///
/// A row is an ordered mapping from column name to [Value]. Columns are
/// untyped; any row can carry any mix of scalars, nested rows, and nested
/// collections. Rows are the unit that [merge](crate::collection::Collection::merge),
/// [sort](crate::collection::Collection::sort), and the aggregation
/// operations address by column name.
///
/// Reading an absent column yields [Value::Null] rather than an error, so
/// heterogeneous row sets can be sorted and aggregated without schema
/// bookkeeping.
///
/// Uses `im::OrdMap` internally: cloning a row is O(1) via structural
/// sharing, and mutation never disturbs previously taken clones.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Row {
    data: OrdMap<String, Value>,
}

impl Row {
    /// Creates a new empty row.
    pub fn new() -> Self {
        Row { data: OrdMap::new() }
    }

    /// Checks if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of columns in the row.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified [Value] with the specified column.
    ///
    /// An existing column is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the column name is empty.
    pub fn put<T: Into<Value>>(&mut self, column: impl Into<String>, value: T) -> RowsetResult<()> {
        let column = column.into();
        if column.is_empty() {
            log::error!("Row does not support an empty column name");
            return Err(RowsetError::new(
                "Row does not support an empty column name",
                ErrorKind::InvalidColumnName,
            ));
        }

        self.data = self.data.update(column, value.into());
        Ok(())
    }

    /// Returns the [Value] stored at the column, or [Value::Null] if the row
    /// has no such column.
    pub fn get(&self, column: &str) -> Value {
        match self.data.get(column) {
            Some(value) => value.clone(),
            None => Value::Null,
        }
    }

    /// Checks if the column exists in the row.
    pub fn contains_column(&self, column: &str) -> bool {
        self.data.contains_key(column)
    }

    /// Removes the column and its value. Removing an absent column is a
    /// no-op.
    pub fn remove(&mut self, column: &str) {
        self.data = self.data.without(column);
    }

    /// Returns the column names of the row in their stored order.
    pub fn columns(&self) -> ColumnVec {
        self.data.keys().cloned().collect()
    }

    /// Gets an iterator over the `(column, value)` pairs of this row.
    pub fn iter(&self) -> RowIter {
        RowIter {
            columns: self.data.keys().cloned().collect(),
            data: self.clone(),
            index: 0,
        }
    }

    /// Converts this row to a [BTreeMap].
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let body = self
            .data
            .iter()
            .map(|(column, value)| {
                format!(
                    "{}\"{}\": {}",
                    indent_str,
                    column,
                    value.to_pretty_json(indent + 2)
                )
            })
            .join(",\n");
        format!("{{\n{}\n{}}}", body, " ".repeat(indent))
    }

    pub(crate) fn to_debug_string(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let body = self
            .data
            .iter()
            .map(|(column, value)| {
                format!(
                    "{}\"{}\": {}",
                    indent_str,
                    column,
                    value.to_debug_string(indent + 2)
                )
            })
            .join(",\n");
        format!("{{\n{}\n{}}}", body, " ".repeat(indent))
    }
}

impl Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string(0))
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

pub struct RowIter {
    columns: Vec<String>,
    data: Row,
    index: usize,
}

impl Iterator for RowIter {
    type Item = (String, Value);

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.columns.len() {
            let column = &self.columns[self.index];
            self.index += 1;
            if let Some(value) = self.data.data.get(column) {
                return Some((column.clone(), value.clone()));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.columns.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Row] with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use rowset::row;
///
/// // Empty row
/// let empty = row!{};
///
/// // Simple columns
/// let simple = row!{
///     name: "Alice",
///     age: 30
/// };
///
/// // Nested rows and collections
/// let complex = row!{
///     user: {
///         name: "Charlie",
///         tags: ["admin", "user"]
///     },
///     scores: [1, 2, 3]
/// };
/// ```
#[macro_export]
macro_rules! row {
    // match an empty row (with braces)
    ({}) => {
        $crate::collection::Row::new()
    };

    // match an empty row
    () => {
        $crate::collection::Row::new()
    };

    // match a row with outer braces
    ({ $($column:tt : $value:tt),* $(,)? }) => {
        $crate::row!($($column : $value),*)
    };

    // match a row with column value pairs
    ($($column:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::row_value;

            let mut row = $crate::collection::Row::new();
            $(
                row.put($crate::collection::normalize(stringify!($column)), $crate::row_value!($value))
                    .expect(&format!("Failed to put value {} in row", stringify!($value)));
            )*
            row
        }
    };
}

/// Helper macro to convert values for the row! macro.
/// Handles nested rows, bracketed collections, and expressions.
#[macro_export]
macro_rules! row_value {
    // match a nested row
    ({ $($column:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Row($crate::row!{ $($column : $value),* })
    };

    // match a bracketed list, which becomes a nested collection
    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::from($crate::collection::Collection::from_values(
            vec![$($crate::row_value!($value)),*],
        ))
    };

    // match an expression (variable, function call, literal, etc.)
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
