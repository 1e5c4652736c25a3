//! Order functions: how an entry maps to the value it is sorted by.
//!
//! An [`OrderFn`] returns `None` when it cannot place an entry; such entries
//! end up unsortable (or dropped) before the sort runs. [`OrderFactory`]
//! derives order functions from a sample entry, and [`order_value_fn`]
//! memoizes one derived function per [`ShapeKey`] for mixed streams.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::QueryError;
use crate::fallible::Entry;
use crate::locate::{attribute_fn, ValuePredicate};
use crate::record::{Record, ShapeKey};
use crate::value::Value;

/// Function from an entry to the value it is ordered by.
///
/// `None` means "could not determine an order value" and is never itself a
/// valid order value.
pub type OrderFn<'q, R, E> = Rc<dyn Fn(&Entry<R, E>) -> Option<Value<'_>> + 'q>;

/// Wraps a closure as an [`OrderFn`].
///
/// Going through this function lets the compiler infer the closure's
/// higher-ranked signature.
pub fn order_fn<'q, R, E, F>(f: F) -> OrderFn<'q, R, E>
where
    F: Fn(&Entry<R, E>) -> Option<Value<'_>> + 'q,
{
    Rc::new(f)
}

/// Order function reading `key` from records.
///
/// Records without the key, and error entries, yield `default`. A key that
/// is present but empty (`Value::None`) yields no order value at all, and
/// the default is not substituted for it.
pub(crate) fn key_extractor<'q, R, E>(
    key: String,
    default: Option<Value<'static>>,
) -> OrderFn<'q, R, E>
where
    R: Record + 'q,
    E: 'q,
{
    order_fn(move |entry: &Entry<R, E>| match entry {
        Entry::Ok(record) => match record.get(&key) {
            Some(Value::None) => None,
            Some(value) => Some(value),
            None => default.clone(),
        },
        Entry::Err(_) => default.clone(),
        Entry::Unsortable(_) => None,
    })
}

fn constant<'q, R, E>(value: Option<Value<'static>>) -> OrderFn<'q, R, E>
where
    R: 'q,
    E: 'q,
{
    order_fn(move |_: &Entry<R, E>| value.clone())
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Returns the direction for a `reverse` flag.
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse {
            Dir::Desc
        } else {
            Dir::Asc
        }
    }

    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compares two values of the same type.
///
/// Returns `None` if the types don't match or comparison is not possible
/// (NaN). `Value::None` compares with anything and sorts last; it only
/// reaches the sort through a caller-supplied order function.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),

        (Value::None, Value::None) => Some(Ordering::Equal),
        (Value::None, _) => Some(Ordering::Greater),
        (_, Value::None) => Some(Ordering::Less),

        _ => None,
    }
}

/// Ordering used by the sort once [`check_comparable`] has passed.
fn sort_cmp(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.total_cmp(*b),
        _ => compare_values(a, b).unwrap_or(Ordering::Equal),
    }
}

/// Checks that every order value can be compared with every other one.
///
/// Absent values and mixed kinds fail. A single item never needs a
/// comparison, so it always passes.
fn check_comparable<E>(keys: &[Option<Value<'_>>]) -> Result<(), QueryError<E>> {
    if keys.len() < 2 {
        return Ok(());
    }

    let mut kind: Option<&'static str> = None;
    for key in keys {
        let value = match key {
            Some(value) => value,
            None => {
                let other = keys
                    .iter()
                    .flatten()
                    .map(Value::kind)
                    .next()
                    .unwrap_or("absent");
                return Err(QueryError::Incomparable {
                    left: "absent",
                    right: other,
                });
            }
        };
        if value.is_none() {
            continue;
        }
        match kind {
            None => kind = Some(value.kind()),
            Some(seen) if seen != value.kind() => {
                return Err(QueryError::Incomparable {
                    left: seen,
                    right: value.kind(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Stable sort of `entries` by `order`.
///
/// Equal order values keep their input order in both directions.
pub fn sort_entries<R, E>(
    entries: Vec<Entry<R, E>>,
    order: &OrderFn<'_, R, E>,
    dir: Dir,
) -> Result<Vec<Entry<R, E>>, QueryError<E>> {
    let permutation = {
        let keys: Vec<Option<Value<'_>>> = entries.iter().map(|entry| order(entry)).collect();
        check_comparable::<E>(&keys)?;

        let mut indices: Vec<usize> = (0..keys.len()).collect();
        indices.sort_by(|&a, &b| match (&keys[a], &keys[b]) {
            (Some(a), Some(b)) => dir.apply(sort_cmp(a, b)),
            _ => Ordering::Equal,
        });
        indices
    };

    let mut slots: Vec<Option<Entry<R, E>>> = entries.into_iter().map(Some).collect();
    Ok(permutation
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect())
}

/// Derives order functions from a sample entry.
///
/// The strategies are tried in order: explicit key, value predicate,
/// constant default, and (with `force_total`) a function that never places
/// anything.
///
/// # Example
///
/// ```
/// use ordo::{Diagnostics, Entry, OrderFactory, Value};
/// use serde_json::json;
///
/// let sample: Entry<serde_json::Value, String> = Entry::Ok(json!({"at": 3}));
/// let order = OrderFactory::new()
///     .key("at")
///     .build(&sample, &Diagnostics::log())
///     .unwrap();
/// assert_eq!(order(&sample), Some(Value::Number(3i64.into())));
/// ```
#[derive(Default)]
pub struct OrderFactory<'p> {
    key: Option<String>,
    predicate: Option<&'p ValuePredicate<'p>>,
    default: Option<Value<'static>>,
    force_total: bool,
}

impl<'p> OrderFactory<'p> {
    /// Creates a factory with no strategy set.
    pub fn new() -> Self {
        OrderFactory::default()
    }

    /// Orders by a named key or attribute.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Orders by the first attribute whose value satisfies `predicate`.
    pub fn predicate(mut self, predicate: &'p ValuePredicate<'p>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Value used for errors and for records missing the attribute.
    pub fn default_value(mut self, default: Option<Value<'static>>) -> Self {
        self.default = default;
        self
    }

    /// Always produce a function, even if no strategy matched.
    pub fn force_total(mut self, force_total: bool) -> Self {
        self.force_total = force_total;
        self
    }

    /// Builds an order function from `sample`.
    ///
    /// Returns `None` only when nothing matched, no default is set and
    /// `force_total` is off. A sample that is an error never fails: without
    /// a default it yields a function that places nothing, and a
    /// [`Diagnostic::Degraded`] is emitted.
    pub fn build<'q, R, E>(
        &self,
        sample: &Entry<R, E>,
        diagnostics: &Diagnostics<'_, E>,
    ) -> Option<OrderFn<'q, R, E>>
    where
        R: Record + 'q,
        E: fmt::Display + 'q,
    {
        let record = match sample.resolve() {
            Ok(record) => record,
            Err(error) => {
                if let Some(default) = &self.default {
                    return Some(constant(Some(default.clone())));
                }
                diagnostics.emit(Diagnostic::Degraded(format!(
                    "while creating order function, encountered error '{error}'; \
                     value to order by unknown, provide a default, filter errors \
                     out or drop them"
                )));
                return Some(constant(None));
            }
        };

        if let Some(key) = &self.key {
            // existence decides, not the value
            if record.get(key).is_some() {
                return Some(key_extractor(key.clone(), self.default.clone()));
            }
        }

        if let Some(predicate) = self.predicate {
            if let Some(f) = attribute_fn(record, predicate, self.default.clone()) {
                return Some(f);
            }
        }

        match &self.default {
            Some(default) => Some(constant(Some(default.clone()))),
            None if self.force_total => Some(constant(None)),
            None => None,
        }
    }
}

impl fmt::Debug for OrderFactory<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderFactory")
            .field("key", &self.key)
            .field("predicate", &self.predicate.is_some())
            .field("default", &self.default)
            .field("force_total", &self.force_total)
            .finish()
    }
}

/// Builds one order function per distinct shape in `entries` and returns a
/// function dispatching on each entry's shape.
///
/// The shape cache lives inside the returned function and is dropped with it.
/// `factory` should have `force_total` set so every shape gets a function.
pub fn order_value_fn<'q, R, E>(
    entries: &[Entry<R, E>],
    factory: &OrderFactory<'_>,
    diagnostics: &Diagnostics<'_, E>,
) -> OrderFn<'q, R, E>
where
    R: Record + 'q,
    E: fmt::Display + 'q,
{
    let mut lookup: HashMap<ShapeKey, OrderFn<'q, R, E>> = HashMap::new();
    // markers pass through unordered, so they need no function
    for entry in entries.iter().filter(|entry| !entry.is_unsortable()) {
        let shape = entry.shape();
        if lookup.contains_key(&shape) {
            continue;
        }
        if let Some(f) = factory.build(entry, diagnostics) {
            log::debug!(target: "ordo", "derived order function for shape {shape}");
            lookup.insert(shape, f);
        }
    }

    order_fn(move |entry: &Entry<R, E>| {
        lookup.get(&entry.shape()).and_then(|f| f(entry))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Number, Timestamp};
    use serde_json::json;
    use std::cell::RefCell;

    type J = Entry<serde_json::Value, String>;

    fn num(n: i64) -> Value<'static> {
        Value::Number(Number::I64(n))
    }

    #[test]
    fn dir_apply() {
        assert_eq!(Dir::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Dir::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Dir::Desc.apply(Ordering::Equal), Ordering::Equal);
        assert_eq!(Dir::from_reverse(true), Dir::Desc);
        assert_eq!(Dir::Asc.to_string(), "asc");
    }

    #[test]
    fn compare_none_values_last() {
        let none = Value::None;
        let some = Value::String("test");
        assert_eq!(compare_values(&none, &some), Some(Ordering::Greater));
        assert_eq!(compare_values(&some, &none), Some(Ordering::Less));
        assert_eq!(compare_values(&none, &none), Some(Ordering::Equal));
    }

    #[test]
    fn compare_type_mismatch() {
        assert_eq!(compare_values(&Value::String("a"), &num(1)), None);
    }

    #[test]
    fn key_requires_presence_not_truthiness() {
        let sample: J = Entry::Ok(json!({"at": null}));
        let order = OrderFactory::new()
            .key("at")
            .default_value(Some(num(0)))
            .build(&sample, &Diagnostics::log())
            .unwrap();
        // present but empty: no order value, and no default either
        assert_eq!(order(&sample), None);
        // missing on another shape falls back to the default
        assert_eq!(order(&Entry::Ok(json!({"other": 1}))), Some(num(0)));
    }

    #[test]
    fn missing_key_without_fallback_is_absent() {
        let sample: J = Entry::Ok(json!({"a": 1}));
        assert!(OrderFactory::new()
            .key("b")
            .build(&sample, &Diagnostics::log())
            .is_none());
    }

    #[test]
    fn missing_key_falls_through_to_predicate() {
        let sample: J = Entry::Ok(json!({"a": "x", "b": 2}));
        let predicate = |v: &Value<'_>| v.is_number();
        let order = OrderFactory::new()
            .key("missing")
            .predicate(&predicate)
            .build(&sample, &Diagnostics::log())
            .unwrap();
        assert_eq!(order(&sample), Some(num(2)));
    }

    #[test]
    fn force_total_and_default() {
        let sample: J = Entry::Ok(json!({"a": "x"}));
        let predicate = |v: &Value<'_>| v.is_timestamp();

        let forced = OrderFactory::new()
            .predicate(&predicate)
            .force_total(true)
            .build(&sample, &Diagnostics::log())
            .unwrap();
        assert_eq!(forced(&sample), None);

        let defaulted = OrderFactory::new()
            .predicate(&predicate)
            .default_value(Some(Value::Timestamp(Timestamp(0))))
            .build(&sample, &Diagnostics::log())
            .unwrap();
        assert_eq!(defaulted(&sample), Some(Value::Timestamp(Timestamp(0))));

        assert!(OrderFactory::new()
            .predicate(&predicate)
            .build(&sample, &Diagnostics::log())
            .is_none());
    }

    #[test]
    fn error_sample_degrades_with_one_diagnostic() {
        let seen = RefCell::new(Vec::new());
        let diagnostics = Diagnostics::with(|d: Diagnostic<'_, String>| {
            seen.borrow_mut().push(d.to_string())
        });
        let sample: J = Entry::Err("Unhandled error!".into());

        let order = OrderFactory::new()
            .key("x")
            .build(&sample, &diagnostics)
            .unwrap();
        assert_eq!(order(&sample), None);
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].contains("Unhandled error!"));

        let with_default = OrderFactory::new()
            .key("x")
            .default_value(Some(num(7)))
            .build(&sample, &diagnostics)
            .unwrap();
        assert_eq!(with_default(&sample), Some(num(7)));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn order_value_dispatches_per_shape() {
        let entries: Vec<J> = vec![
            Entry::Ok(json!({"x": "a", "n": 5})),
            Entry::Ok(json!({"m": 2})),
            Entry::Ok(json!({"x": "b", "n": 1})),
            Entry::Ok(json!({"s": "no numbers"})),
        ];
        let predicate = |v: &Value<'_>| v.is_number();
        let factory = OrderFactory::new().predicate(&predicate).force_total(true);
        let order = order_value_fn(&entries, &factory, &Diagnostics::log());

        let values: Vec<_> = entries.iter().map(|e| order(e)).collect();
        assert_eq!(values, vec![Some(num(5)), Some(num(2)), Some(num(1)), None]);
    }

    #[test]
    fn order_value_skips_existing_markers() {
        let seen = RefCell::new(0);
        let diagnostics = Diagnostics::with(|_: Diagnostic<'_, String>| *seen.borrow_mut() += 1);
        let entries: Vec<J> = vec![
            Entry::Ok(json!({"n": 1})),
            Entry::Err("boom".to_string()).into_unsortable(),
        ];
        let predicate = |v: &Value<'_>| v.is_number();
        let factory = OrderFactory::new().predicate(&predicate).force_total(true);
        let order = order_value_fn(&entries, &factory, &diagnostics);

        assert_eq!(order(&entries[0]), Some(num(1)));
        assert_eq!(order(&entries[1]), None);
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let entries: Vec<J> = vec![
            Entry::Ok(json!({"k": 1, "id": "a"})),
            Entry::Ok(json!({"k": 0, "id": "b"})),
            Entry::Ok(json!({"k": 1, "id": "c"})),
        ];
        let order: OrderFn<'_, _, _> = key_extractor("k".into(), None);
        let ids = |sorted: Vec<J>| -> Vec<String> {
            sorted
                .iter()
                .map(|e| e.record().unwrap()["id"].as_str().unwrap().to_string())
                .collect()
        };

        let asc = sort_entries(entries.clone(), &order, Dir::Asc).unwrap();
        assert_eq!(ids(asc), vec!["b", "a", "c"]);

        let desc = sort_entries(entries, &order, Dir::Desc).unwrap();
        assert_eq!(ids(desc), vec!["a", "c", "b"]);
    }

    #[test]
    fn sort_rejects_mixed_kinds() {
        let entries: Vec<J> = vec![
            Entry::Ok(json!({"k": 1})),
            Entry::Ok(json!({"k": "one"})),
        ];
        let order: OrderFn<'_, _, _> = key_extractor("k".into(), None);
        let err = sort_entries(entries, &order, Dir::Asc).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Incomparable {
                left: "number",
                right: "string"
            }
        ));
    }

    #[test]
    fn sort_rejects_absent_values() {
        let entries: Vec<J> = vec![Entry::Ok(json!({"k": 1})), Entry::Ok(json!({}))];
        let order: OrderFn<'_, _, _> = key_extractor("k".into(), None);
        let err = sort_entries(entries, &order, Dir::Asc).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Incomparable {
                left: "absent",
                right: "number"
            }
        ));
    }

    #[test]
    fn sort_single_absent_value_is_fine() {
        let entries: Vec<J> = vec![Entry::Ok(json!({}))];
        let order: OrderFn<'_, _, _> = key_extractor("k".into(), None);
        assert_eq!(sort_entries(entries, &order, Dir::Asc).unwrap().len(), 1);
    }
}
