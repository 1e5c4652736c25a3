//! Runtime values records expose for filtering and ordering.
//!
//! A [`Value`] is what an attribute of a record looks like to the engine:
//! strings, numbers, timestamps, enum discriminants, booleans, or an
//! attribute that exists but holds nothing ([`Value::None`]).
//!
//! Field types become values through [`ToValue`], which the `Record` derive
//! calls for every exposed field.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

/// Runtime value of a record attribute, borrowed from the record.
///
/// # Example
///
/// ```
/// use ordo::{Number, Value};
///
/// let v = Value::Number(Number::I64(3));
/// assert!(v.is_number());
/// assert_eq!(v.kind(), "number");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Timestamp value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Enum discriminant value.
    Enum(u32),
    /// Boolean value.
    Bool(bool),
    /// The attribute exists but is empty (an unset `Option`, a JSON `null`).
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `None` value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns `true` if this is a `String` value.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns `true` if this is a `Number` value.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns `true` if this is a `Timestamp` value.
    pub fn is_timestamp(&self) -> bool {
        matches!(self, Value::Timestamp(_))
    }

    /// Returns `true` if this is an `Enum` value.
    pub fn is_enum(&self) -> bool {
        matches!(self, Value::Enum(_))
    }

    /// Returns `true` if this is a `Bool` value.
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the timestamp value, if present.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Extracts the enum discriminant, if present.
    pub fn as_enum(&self) -> Option<u32> {
        match self {
            Value::Enum(d) => Some(*d),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the variant, used in comparison error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Timestamp(_) => "timestamp",
            Value::Enum(_) => "enum",
            Value::Bool(_) => "bool",
            Value::None => "none",
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Comparisons between different numeric variants go through `f64`, so an
/// `I64(2)` and an `F64(1.5)` order the way one would expect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    ///
    /// Returns `None` when either side is NaN.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            (Number::I64(a), Number::U64(b)) => Some(exact_cmp(a, b)),
            (Number::U64(a), Number::I64(b)) => Some(exact_cmp(b, a).reverse()),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Total ordering used while sorting: like [`Number::compare`], but NaN
    /// falls back to `f64::total_cmp` instead of being incomparable.
    pub fn total_cmp(self, other: Number) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.to_f64().total_cmp(&other.to_f64()))
    }
}

fn exact_cmp(signed: i64, unsigned: u64) -> Ordering {
    match u64::try_from(signed) {
        Ok(signed) => signed.cmp(&unsigned),
        Err(_) => Ordering::Less,
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(n: $t) -> Self {
                    Number::$variant(n as $target)
                }
            }
        )*
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// ```
/// use ordo::Timestamp;
///
/// assert!(Timestamp(1000) < Timestamp(2000));
/// assert_eq!(Timestamp::from_secs(2).as_millis(), 2000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a new timestamp from seconds since Unix epoch.
    ///
    /// Saturates at the bounds of `i64` milliseconds.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch.
    pub fn as_secs(self) -> i64 {
        self.0 / 1000
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl From<NaiveDateTime> for Timestamp {
    /// Naive datetimes are read as UTC.
    fn from(dt: NaiveDateTime) -> Self {
        Timestamp(dt.and_utc().timestamp_millis())
    }
}

/// Conversion from a field type into the [`Value`] the engine orders by.
///
/// Implemented for strings, numeric primitives, `bool`, [`Timestamp`],
/// chrono date types, and `Option<T>`. An unset `Option` becomes
/// [`Value::None`]: the attribute is still *present*, which matters for
/// ordering defaults (see [`crate::Query::default_value`]).
///
/// Implement it for your own types to make them usable as record fields:
///
/// ```
/// use ordo::{ToValue, Value};
///
/// enum Status { Open, Closed }
///
/// impl ToValue for Status {
///     fn to_value(&self) -> Value<'_> {
///         match self {
///             Status::Open => Value::Enum(0),
///             Status::Closed => Value::Enum(1),
///         }
///     }
/// }
///
/// assert_eq!(Status::Closed.to_value(), Value::Enum(1));
/// ```
pub trait ToValue {
    /// Returns this field as a [`Value`].
    fn to_value(&self) -> Value<'_>;
}

impl ToValue for String {
    fn to_value(&self) -> Value<'_> {
        Value::String(self.as_str())
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value<'_> {
        Value::String(self)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl ToValue for Number {
    fn to_value(&self) -> Value<'_> {
        Value::Number(*self)
    }
}

impl ToValue for Timestamp {
    fn to_value(&self) -> Value<'_> {
        Value::Timestamp(*self)
    }
}

impl ToValue for Value<'_> {
    fn to_value(&self) -> Value<'_> {
        self.clone()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value<'_> {
        match self {
            Some(v) => v.to_value(),
            None => Value::None,
        }
    }
}

impl<Tz: TimeZone> ToValue for DateTime<Tz> {
    fn to_value(&self) -> Value<'_> {
        Value::Timestamp(Timestamp(self.timestamp_millis()))
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value<'_> {
        Value::Timestamp(Timestamp::from(*self))
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value<'_> {
        match self.and_hms_opt(0, 0, 0) {
            Some(midnight) => Value::Timestamp(Timestamp::from(midnight)),
            None => Value::None,
        }
    }
}

macro_rules! number_to_value {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value<'_> {
                    Value::Number(Number::from(*self))
                }
            }

            impl From<$t> for Value<'static> {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

number_to_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

// Owned conversions, mostly for ordering defaults.

impl From<Number> for Value<'static> {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Timestamp> for Value<'static> {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<bool> for Value<'static> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&'static str> for Value<'static> {
    fn from(s: &'static str) -> Self {
        Value::String(s)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value<'static> {
    fn from(dt: DateTime<Tz>) -> Self {
        Value::Timestamp(Timestamp::from(dt))
    }
}

impl From<NaiveDateTime> for Value<'static> {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Timestamp(Timestamp::from(dt))
    }
}

impl<T: Into<Value<'static>>> From<Option<T>> for Value<'static> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn value_type_checks() {
        assert!(Value::String("test").is_string());
        assert!(Value::Number(Number::I64(42)).is_number());
        assert!(Value::Timestamp(Timestamp(0)).is_timestamp());
        assert!(Value::Enum(1).is_enum());
        assert!(Value::Bool(true).is_bool());
        assert!(Value::None.is_none());
    }

    #[test]
    fn value_extractors() {
        assert_eq!(Value::String("hello").as_str(), Some("hello"));
        assert_eq!(
            Value::Number(Number::I64(42)).as_number(),
            Some(Number::I64(42))
        );
        assert_eq!(
            Value::Timestamp(Timestamp(1000)).as_timestamp(),
            Some(Timestamp(1000))
        );
        assert_eq!(Value::Enum(5).as_enum(), Some(5));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));

        assert_eq!(Value::String("test").as_number(), None);
        assert_eq!(Value::Number(Number::I64(1)).as_str(), None);
    }

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(
            Number::I64(5).compare(Number::U64(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I64(5).compare(Number::F64(5.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Number::U64(10).compare(Number::F64(5.5)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn number_nan_is_incomparable_but_totally_ordered() {
        assert_eq!(Number::F64(f64::NAN).compare(Number::F64(1.0)), None);
        assert_eq!(
            Number::F64(f64::NAN).total_cmp(Number::F64(1.0)),
            Ordering::Greater
        );
        assert_eq!(Number::I64(1).total_cmp(Number::F64(1.5)), Ordering::Less);
    }

    #[test]
    fn mixed_integers_compare_exactly() {
        let big = 9_007_199_254_740_992u64;
        assert_eq!(
            Number::I64(big as i64 + 1).compare(Number::U64(big)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Number::U64(big).compare(Number::I64(big as i64 + 1)),
            Some(Ordering::Less)
        );
        assert_eq!(Number::I64(-1).compare(Number::U64(0)), Some(Ordering::Less));
        assert_eq!(Number::U64(u64::MAX).compare(Number::I64(i64::MAX)), Some(Ordering::Greater));
        assert_eq!(Number::I64(7).compare(Number::U64(7)), Some(Ordering::Equal));
    }

    #[test]
    fn from_secs_saturates() {
        assert_eq!(Timestamp::from_secs(i64::MAX), Timestamp(i64::MAX));
        assert_eq!(Timestamp::from_secs(i64::MIN), Timestamp(i64::MIN));
        assert_eq!(Timestamp::from_secs(-2).as_millis(), -2000);
    }

    #[test]
    fn option_fields_are_present_but_empty() {
        let unset: Option<i64> = None;
        assert_eq!(unset.to_value(), Value::None);
        assert_eq!(Some(3i64).to_value(), Value::Number(Number::I64(3)));
    }

    #[test]
    fn chrono_types_become_timestamps() {
        let dt = Utc.with_ymd_and_hms(2009, 5, 10, 4, 10, 1).unwrap();
        assert_eq!(dt.to_value(), Value::Timestamp(Timestamp(dt.timestamp_millis())));
        assert_eq!(dt.naive_utc().to_value(), dt.to_value());

        let day = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(day.to_value(), Value::Timestamp(Timestamp::from_secs(86_400)));
    }

    #[test]
    fn kind_names() {
        assert_eq!(Value::String("a").kind(), "string");
        assert_eq!(Value::Timestamp(Timestamp(0)).kind(), "timestamp");
        assert_eq!(Value::None.kind(), "none");
    }
}
