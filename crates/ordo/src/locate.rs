//! Attribute locator: find the attribute whose value satisfies a predicate.
//!
//! The scan order depends on the record's [`Layout`]:
//!
//! - **Mapping**: entries in insertion order.
//! - **Struct**: declared fields in declaration order, then every readable
//!   member (computed ones included) sorted by name.
//! - **Opaque**: members only.

use crate::fallible::Entry;
use crate::order::{key_extractor, OrderFn};
use crate::record::{Layout, Record};
use crate::value::Value;

/// Predicate over attribute values.
pub type ValuePredicate<'p> = dyn Fn(&Value<'_>) -> bool + 'p;

/// Returns the first attribute of `record` whose value satisfies `predicate`.
pub fn find_attribute<'r, R>(
    record: &'r R,
    predicate: &ValuePredicate<'_>,
) -> Option<(&'r str, Value<'r>)>
where
    R: Record + ?Sized,
{
    let scan = |attrs: Vec<(&'r str, Value<'r>)>| attrs.into_iter().find(|(_, v)| predicate(v));

    match record.layout() {
        Layout::Mapping => scan(record.fields()),
        Layout::Struct => scan(record.fields()).or_else(|| scan(record.members())),
        Layout::Opaque => scan(record.members()),
    }
}

/// Builds an order function reading the attribute `predicate` matches on
/// `record`.
///
/// The returned function looks the attribute up by name, so it can be
/// applied to records of any shape: where the name is missing it yields
/// `default` (or absence), never an error.
pub fn attribute_fn<'q, R, E>(
    record: &R,
    predicate: &ValuePredicate<'_>,
    default: Option<Value<'static>>,
) -> Option<OrderFn<'q, R, E>>
where
    R: Record + 'q,
    E: 'q,
{
    let (name, _) = find_attribute(record, predicate)?;
    Some(key_extractor(name.to_owned(), default))
}

/// Convenience for applying a located function to an entry outside a query.
pub fn locate_value<'a, R, E>(
    entry: &'a Entry<R, E>,
    predicate: &ValuePredicate<'_>,
) -> Option<Value<'a>>
where
    R: Record,
{
    match entry {
        Entry::Ok(record) => find_attribute(record, predicate).map(|(_, v)| v),
        _ => None,
    }
}
