use crate::collection::{Collection, Row, SharedCollection};
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

/// Compare two integers represented as i128.
#[inline]
fn num_cmp_int(a: i128, b: i128) -> Ordering {
    a.cmp(&b)
}

/// Compare two floats for equality with proper NaN handling.
#[inline]
fn num_eq_float(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        true
    } else {
        a == b
    }
}

/// Compare two floats with proper NaN and total ordering.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    // Handle NaN: treat NaN as greater than all other values
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// A single cell value inside a [Collection](crate::collection::Collection).
///
/// A value is either a scalar ([Value::Bool], the numeric variants,
/// [Value::String]), a nested record ([Value::Row]), or another collection
/// ([Value::Collection]) held through a shared handle so that in-place
/// mutation stays observable through every holder.
///
/// # Characteristics
/// - **Comparable**: implements `Ord`; integers compare across widths,
///   mixed integer/decimal comparison happens in `f64`, strings compare
///   lexicographically, and unrelated types fall back to comparing their
///   rendered form. `Null` orders below everything else.
/// - **Convertible**: `From` impls cover the native Rust types, rows,
///   collections, `Option` and `Vec` (a `Vec` becomes a nested collection).
///
/// Create values using the `From` trait or the [val!](crate::val) macro:
/// ```text
/// let v1: Value = 42.into();
/// let v2 = Value::from("hello");
/// let v3 = val!(true);
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents a signed 32-bit integer value.
    I32(i32),
    /// Represents a signed 64-bit integer value.
    I64(i64),
    /// Represents an unsigned 64-bit integer value.
    U64(u64),
    /// Represents a 32-bit floating point value.
    F32(f32),
    /// Represents a 64-bit floating point value.
    F64(f64),
    /// Represents a string value.
    String(String),
    /// Represents a nested record value.
    Row(Row),
    /// Represents a nested collection, shared by handle.
    Collection(SharedCollection),
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string(0))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.is_integer() && other.is_integer() {
            if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
                return a == b;
            }
        }

        if self.is_number() && other.is_number() {
            if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
                return num_eq_float(a, b);
            }
        }

        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => *a == *b,
            (Value::String(a), Value::String(b)) => *a == *b,
            (Value::Row(a), Value::Row(b)) => *a == *b,
            (Value::Collection(a), Value::Collection(b)) => *a == *b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.is_integer() && other.is_integer() {
            if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
                return num_cmp_int(a, b);
            }
        }

        if self.is_number() && other.is_number() {
            if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
                return num_cmp_float(a, b);
            }
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()), // fallback to string comparison
        }
    }
}

impl Value {
    /// Creates a new [Value] from the given value that implements [`Into<Value>`].
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    /// Returns the boolean value if the [Value] is [Value::Bool].
    #[inline]
    pub fn as_bool(&self) -> Option<&bool> {
        match self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the i32 value if the [Value] is [Value::I32].
    #[inline]
    pub fn as_i32(&self) -> Option<&i32> {
        match self {
            Value::I32(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the i64 value if the [Value] is [Value::I64].
    #[inline]
    pub fn as_i64(&self) -> Option<&i64> {
        match self {
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the u64 value if the [Value] is [Value::U64].
    #[inline]
    pub fn as_u64(&self) -> Option<&u64> {
        match self {
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the f32 value if the [Value] is [Value::F32].
    #[inline]
    pub fn as_f32(&self) -> Option<&f32> {
        match self {
            Value::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the f64 value if the [Value] is [Value::F64].
    #[inline]
    pub fn as_f64(&self) -> Option<&f64> {
        match self {
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the string value if the [Value] is [Value::String].
    #[inline]
    pub fn as_string(&self) -> Option<&String> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the row value if the [Value] is [Value::Row].
    #[inline]
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Value::Row(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the mutable row value if the [Value] is [Value::Row].
    #[inline]
    pub fn as_row_mut(&mut self) -> Option<&mut Row> {
        match self {
            Value::Row(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the shared collection handle if the [Value] is [Value::Collection].
    #[inline]
    pub fn as_collection(&self) -> Option<&SharedCollection> {
        match self {
            Value::Collection(v) => Some(v),
            _ => None,
        }
    }

    /// Widens any integer variant to i128 for cross-width comparison.
    #[inline]
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::I32(v) => Some(*v as i128),
            Value::I64(v) => Some(*v as i128),
            Value::U64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Widens any decimal variant to f64.
    #[inline]
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Widens any numeric variant to f64.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        if let Some(int) = self.as_integer() {
            return Some(int as f64);
        }
        self.as_decimal()
    }

    /// Checks if the [Value] is [Value::Null].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Checks if the [Value] is [Value::Bool].
    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Checks if the [Value] is [Value::String].
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Checks if the [Value] is [Value::Row].
    #[inline]
    pub fn is_row(&self) -> bool {
        matches!(self, Value::Row(_))
    }

    /// Checks if the [Value] is [Value::Collection].
    #[inline]
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Collection(_))
    }

    /// Checks if the [Value] is an integer type.
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::I32(_) | Value::I64(_) | Value::U64(_))
    }

    /// Checks if the [Value] is a decimal type.
    #[inline]
    pub fn is_decimal(&self) -> bool {
        matches!(self, Value::F32(_) | Value::F64(_))
    }

    /// Checks if the [Value] is a number type.
    #[inline]
    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_decimal()
    }

    /// Loose equality used by merge matching: numbers compare across
    /// integer/decimal variants, and numeric text compares against numbers
    /// by its parsed value. Everything else falls back to strict equality.
    pub fn loosely_eq(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        match (self.as_loose_number(), other.as_loose_number()) {
            (Some(a), Some(b)) => num_eq_float(a, b),
            _ => false,
        }
    }

    #[inline]
    fn as_loose_number(&self) -> Option<f64> {
        match self {
            Value::String(text) => text.trim().parse().ok(),
            _ => self.as_number(),
        }
    }

    /// Renders a scalar value as plain text for pattern matching.
    ///
    /// Returns `None` for [Value::Null], [Value::Row], and
    /// [Value::Collection]; those never participate in pattern search.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Bool(v) => Some(v.to_string()),
            Value::I32(v) => Some(v.to_string()),
            Value::I64(v) => Some(v.to_string()),
            Value::U64(v) => Some(v.to_string()),
            Value::F32(v) => Some(v.to_string()),
            Value::F64(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Null | Value::Row(_) | Value::Collection(_) => None,
        }
    }

    /// Coerces the value to f64 for summation.
    ///
    /// Numbers widen, booleans count as 0/1, numeric text parses, and
    /// everything else coerces to 0.0.
    pub fn coerce_f64(&self) -> f64 {
        match self {
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::I32(v) => *v as f64,
            Value::I64(v) => *v as f64,
            Value::U64(v) => *v as f64,
            Value::F32(v) => *v as f64,
            Value::F64(v) => *v,
            Value::String(v) => v.trim().parse().unwrap_or(0.0),
            Value::Null | Value::Row(_) | Value::Collection(_) => 0.0,
        }
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::String(v) => format!("\"{}\"", v),
            Value::Row(v) => v.to_pretty_json(indent),
            Value::Collection(v) => v.read_with(|c| c.to_pretty_json(indent)),
        }
    }

    pub(crate) fn to_debug_string(&self, indent: usize) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(v) => format!("bool({})", v),
            Value::I32(v) => format!("i32({})", v),
            Value::I64(v) => format!("i64({})", v),
            Value::U64(v) => format!("u64({})", v),
            Value::F32(v) => format!("f32({})", v),
            Value::F64(v) => format!("f64({})", v),
            Value::String(v) => format!("string(\"{}\")", v),
            Value::Row(v) => format!("row({})", v.to_debug_string(indent)),
            Value::Collection(v) => {
                format!("collection({})", v.read_with(|c| c.to_debug_string(indent)))
            }
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<u64> for Value {
    #[inline]
    fn from(value: u64) -> Self {
        Value::U64(value)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Row> for Value {
    fn from(value: Row) -> Self {
        Value::Row(value)
    }
}

impl From<Collection> for Value {
    fn from(value: Collection) -> Self {
        Value::Collection(SharedCollection::new(value))
    }
}

impl From<SharedCollection> for Value {
    fn from(value: SharedCollection) -> Self {
        Value::Collection(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Value::from(Collection::from_values(value.into_iter().map(Into::into)))
    }
}

/// A macro to create a `Value` from a given expression.
///
/// # Examples
///
/// ```rust
/// use rowset::common::Value;
/// use rowset::val;
///
/// let int_value = val!(42);
/// assert_eq!(int_value, Value::I32(42));
///
/// let string_value = val!("hello");
/// assert_eq!(string_value, Value::String("hello".to_string()));
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
