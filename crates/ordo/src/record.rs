//! The [`Record`] trait: how the engine looks inside a stream item.
//!
//! Records come in different representations, and the engine never assumes
//! a common base type. Each record reports a [`Layout`] tag that tells the
//! attribute locator how to scan it, and a [`ShapeKey`] that groups records
//! which are probably ordered the same way.
//!
//! Implementations ship for `serde_json` objects (mapping layout) and
//! `BTreeMap<String, V>`. Structs get one from `#[derive(Record)]`.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value as Json};

use crate::value::{Number, ToValue, Value};

/// How a record exposes its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Key/value mapping; [`Record::fields`] yields entries in insertion order.
    Mapping,
    /// Fixed named fields; [`Record::fields`] yields them in declaration
    /// order and [`Record::members`] adds computed attributes.
    Struct,
    /// No declared fields; only [`Record::members`] is meaningful.
    Opaque,
}

/// Structural proxy used to decide that two records are probably ordered the
/// same way.
///
/// This is a heuristic: two records with equal keys are assumed to support
/// the same order-function derivation, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeKey {
    /// Nominal type of the record.
    Type(&'static str),
    /// Ordered key list of a mapping record.
    Keys(Vec<String>),
    /// Any error item.
    Error,
    /// An item already wrapped as unsortable.
    Unsortable,
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKey::Type(name) => f.write_str(name),
            ShapeKey::Keys(keys) => write!(f, "{{{}}}", keys.join(", ")),
            ShapeKey::Error => f.write_str("error"),
            ShapeKey::Unsortable => f.write_str("unsortable"),
        }
    }
}

/// A value the engine can filter and order without knowing its type.
///
/// # Presence versus emptiness
///
/// [`Record::get`] distinguishes an attribute that does not exist (`None`)
/// from one that exists but is empty (`Some(Value::None)`). Ordering by a
/// missing attribute falls back to the query's default. An empty attribute
/// never gets the default; it has no order value and ends up unsortable.
///
/// # Manual Implementation
///
/// ```
/// use ordo::{Layout, Record, ToValue, Value};
///
/// struct Visit {
///     url: String,
///     secs: i64,
/// }
///
/// impl Record for Visit {
///     fn layout(&self) -> Layout {
///         Layout::Struct
///     }
///
///     fn get(&self, name: &str) -> Option<Value<'_>> {
///         match name {
///             "url" => Some(self.url.to_value()),
///             "secs" => Some(self.secs.to_value()),
///             _ => None,
///         }
///     }
///
///     fn fields(&self) -> Vec<(&str, Value<'_>)> {
///         vec![("url", self.url.to_value()), ("secs", self.secs.to_value())]
///     }
/// }
///
/// let v = Visit { url: "https://example.org".into(), secs: 30 };
/// assert_eq!(v.get("secs"), Some(Value::Number(30i64.into())));
/// assert_eq!(v.get("missing"), None);
/// ```
pub trait Record {
    /// Returns the shape key of this record.
    ///
    /// Defaults to the nominal type name. Mappings override this with
    /// their key list.
    fn shape(&self) -> ShapeKey {
        ShapeKey::Type(std::any::type_name::<Self>())
    }

    /// Returns the layout tag the attribute locator dispatches on.
    fn layout(&self) -> Layout {
        Layout::Struct
    }

    /// Looks up an attribute by name.
    ///
    /// Returns `None` if the attribute doesn't exist, and `Some(Value::None)`
    /// if it exists but is empty.
    fn get(&self, name: &str) -> Option<Value<'_>>;

    /// Returns declared fields (or mapping entries) in order.
    fn fields(&self) -> Vec<(&str, Value<'_>)>;

    /// Returns every readable attribute, computed ones included, sorted by
    /// name.
    fn members(&self) -> Vec<(&str, Value<'_>)> {
        let mut members = self.fields();
        members.sort_by(|a, b| a.0.cmp(b.0));
        members
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn shape(&self) -> ShapeKey {
        (**self).shape()
    }

    fn layout(&self) -> Layout {
        (**self).layout()
    }

    fn get(&self, name: &str) -> Option<Value<'_>> {
        (**self).get(name)
    }

    fn fields(&self) -> Vec<(&str, Value<'_>)> {
        (**self).fields()
    }

    fn members(&self) -> Vec<(&str, Value<'_>)> {
        (**self).members()
    }
}

impl<T: Record + ?Sized> Record for &T {
    fn shape(&self) -> ShapeKey {
        (**self).shape()
    }

    fn layout(&self) -> Layout {
        (**self).layout()
    }

    fn get(&self, name: &str) -> Option<Value<'_>> {
        (**self).get(name)
    }

    fn fields(&self) -> Vec<(&str, Value<'_>)> {
        (**self).fields()
    }

    fn members(&self) -> Vec<(&str, Value<'_>)> {
        (**self).members()
    }
}

/// Converts a JSON scalar into a [`Value`].
///
/// Arrays and objects have no orderable value and are not exposed.
fn json_value(json: &Json) -> Option<Value<'_>> {
    match json {
        Json::Null => Some(Value::None),
        Json::Bool(b) => Some(Value::Bool(*b)),
        Json::String(s) => Some(Value::String(s)),
        Json::Number(n) => {
            let number = if let Some(i) = n.as_i64() {
                Number::I64(i)
            } else if let Some(u) = n.as_u64() {
                Number::U64(u)
            } else {
                Number::F64(n.as_f64()?)
            };
            Some(Value::Number(number))
        }
        Json::Array(_) | Json::Object(_) => None,
    }
}

impl Record for Map<String, Json> {
    fn shape(&self) -> ShapeKey {
        ShapeKey::Keys(self.keys().cloned().collect())
    }

    fn layout(&self) -> Layout {
        Layout::Mapping
    }

    fn get(&self, name: &str) -> Option<Value<'_>> {
        Map::get(self, name).and_then(json_value)
    }

    fn fields(&self) -> Vec<(&str, Value<'_>)> {
        self.iter()
            .filter_map(|(k, v)| json_value(v).map(|v| (k.as_str(), v)))
            .collect()
    }
}

impl Record for Json {
    fn shape(&self) -> ShapeKey {
        match self {
            Json::Object(map) => map.shape(),
            Json::Null => ShapeKey::Type("json null"),
            Json::Bool(_) => ShapeKey::Type("json bool"),
            Json::Number(_) => ShapeKey::Type("json number"),
            Json::String(_) => ShapeKey::Type("json string"),
            Json::Array(_) => ShapeKey::Type("json array"),
        }
    }

    fn layout(&self) -> Layout {
        match self {
            Json::Object(_) => Layout::Mapping,
            _ => Layout::Opaque,
        }
    }

    fn get(&self, name: &str) -> Option<Value<'_>> {
        match self {
            Json::Object(map) => Record::get(map, name),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(&str, Value<'_>)> {
        match self {
            Json::Object(map) => map.fields(),
            _ => Vec::new(),
        }
    }
}

impl<V: ToValue> Record for BTreeMap<String, V> {
    fn shape(&self) -> ShapeKey {
        ShapeKey::Keys(self.keys().cloned().collect())
    }

    fn layout(&self) -> Layout {
        Layout::Mapping
    }

    fn get(&self, name: &str) -> Option<Value<'_>> {
        BTreeMap::get(self, name).map(ToValue::to_value)
    }

    fn fields(&self) -> Vec<(&str, Value<'_>)> {
        self.iter().map(|(k, v)| (k.as_str(), v.to_value())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Timestamp;
    use serde_json::json;

    struct Event {
        name: String,
        at: Option<Timestamp>,
    }

    impl Record for Event {
        fn get(&self, name: &str) -> Option<Value<'_>> {
            match name {
                "name" => Some(self.name.to_value()),
                "at" => Some(self.at.to_value()),
                _ => None,
            }
        }

        fn fields(&self) -> Vec<(&str, Value<'_>)> {
            vec![("name", self.name.to_value()), ("at", self.at.to_value())]
        }
    }

    #[test]
    fn struct_shape_is_type_name() {
        let e = Event {
            name: "x".into(),
            at: None,
        };
        assert_eq!(e.shape(), ShapeKey::Type(std::any::type_name::<Event>()));
        assert_eq!(e.layout(), Layout::Struct);
    }

    #[test]
    fn boxed_trait_object_keeps_concrete_shape() {
        let e: Box<dyn Record> = Box::new(Event {
            name: "x".into(),
            at: Some(Timestamp(5)),
        });
        assert_eq!(e.shape(), ShapeKey::Type(std::any::type_name::<Event>()));
        assert_eq!(e.get("at"), Some(Value::Timestamp(Timestamp(5))));
    }

    #[test]
    fn unset_option_is_present_but_empty() {
        let e = Event {
            name: "x".into(),
            at: None,
        };
        assert_eq!(e.get("at"), Some(Value::None));
        assert_eq!(e.get("nope"), None);
    }

    #[test]
    fn default_members_are_sorted_fields() {
        let e = Event {
            name: "x".into(),
            at: None,
        };
        let names: Vec<&str> = e.members().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["at", "name"]);
    }

    #[test]
    fn json_object_keeps_insertion_order() {
        let v = json!({"z": 1, "a": "two", "m": null, "nested": [1, 2]});
        assert_eq!(v.layout(), Layout::Mapping);
        assert_eq!(
            v.shape(),
            ShapeKey::Keys(vec![
                "z".into(),
                "a".into(),
                "m".into(),
                "nested".into()
            ])
        );

        let names: Vec<&str> = v.fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
        assert_eq!(Record::get(&v, "m"), Some(Value::None));
        assert_eq!(Record::get(&v, "nested"), None);
    }

    #[test]
    fn json_scalars_are_opaque() {
        let v = json!(42);
        assert_eq!(v.layout(), Layout::Opaque);
        assert_eq!(v.shape(), ShapeKey::Type("json number"));
        assert!(v.fields().is_empty());
    }

    #[test]
    fn json_numbers_keep_their_variant() {
        let v = json!({"i": -3, "u": u64::MAX, "f": 1.5});
        assert_eq!(Record::get(&v, "i"), Some(Value::Number(Number::I64(-3))));
        assert_eq!(
            Record::get(&v, "u"),
            Some(Value::Number(Number::U64(u64::MAX)))
        );
        assert_eq!(Record::get(&v, "f"), Some(Value::Number(Number::F64(1.5))));
    }

    #[test]
    fn btreemap_records() {
        let mut m = BTreeMap::new();
        m.insert("b".to_string(), 2i64);
        m.insert("a".to_string(), 1i64);
        assert_eq!(m.shape(), ShapeKey::Keys(vec!["a".into(), "b".into()]));
        assert_eq!(Record::get(&m, "b"), Some(Value::Number(Number::I64(2))));
    }

    #[test]
    fn shape_display() {
        assert_eq!(
            ShapeKey::Keys(vec!["a".into(), "b".into()]).to_string(),
            "{a, b}"
        );
        assert_eq!(ShapeKey::Error.to_string(), "error");
    }
}
