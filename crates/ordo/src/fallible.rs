//! Stream elements: records, captured errors, and unsortable markers.
//!
//! Sources yield `Result<R, E>` (a fallible item). Inside the pipeline and
//! in its output every element is an [`Entry`], which adds a third variant
//! for items the active order function could not place.
//!
//! [`Unsortable`] stores a plain `Result<R, E>`, so a marker can never wrap
//! another marker.

use crate::record::{Record, ShapeKey};

/// A value that is either a successful record or a captured error.
///
/// The error is kept verbatim, never stringified.
pub type Fallible<R, E> = Result<R, E>;

/// Wrapper for an item whose order value could not be determined.
#[derive(Debug, Clone, PartialEq)]
pub struct Unsortable<R, E> {
    item: Fallible<R, E>,
}

impl<R, E> Unsortable<R, E> {
    /// Wraps an item.
    pub fn new(item: Fallible<R, E>) -> Self {
        Unsortable { item }
    }

    /// Returns the wrapped item.
    pub fn item(&self) -> &Fallible<R, E> {
        &self.item
    }

    /// Unwraps the marker.
    pub fn into_inner(self) -> Fallible<R, E> {
        self.item
    }
}

/// One element of a `select` stream.
///
/// `Result<R, E>` converts into `Entry`, so sources can yield raw results or
/// the output of an earlier `select`.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<R, E> {
    /// A record.
    Ok(R),
    /// A captured error.
    Err(E),
    /// An item the order function could not place.
    Unsortable(Unsortable<R, E>),
}

impl<R, E> Entry<R, E> {
    /// Returns `true` for a record.
    pub fn is_ok(&self) -> bool {
        matches!(self, Entry::Ok(_))
    }

    /// Returns `true` for a captured error.
    pub fn is_err(&self) -> bool {
        matches!(self, Entry::Err(_))
    }

    /// Returns `true` for an unsortable marker.
    pub fn is_unsortable(&self) -> bool {
        matches!(self, Entry::Unsortable(_))
    }

    /// Returns the record, if this is `Ok`.
    pub fn record(&self) -> Option<&R> {
        match self {
            Entry::Ok(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the error, if this is `Err`.
    pub fn error(&self) -> Option<&E> {
        match self {
            Entry::Err(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the marker, if this is `Unsortable`.
    pub fn unsortable(&self) -> Option<&Unsortable<R, E>> {
        match self {
            Entry::Unsortable(marker) => Some(marker),
            _ => None,
        }
    }

    /// Returns the underlying item, looking through an unsortable marker.
    pub fn resolve(&self) -> Result<&R, &E> {
        match self {
            Entry::Ok(record) => Ok(record),
            Entry::Err(error) => Err(error),
            Entry::Unsortable(marker) => marker.item().as_ref(),
        }
    }

    /// Wraps this entry as unsortable. Already wrapped entries are returned
    /// unchanged.
    pub fn into_unsortable(self) -> Self {
        match self {
            Entry::Ok(record) => Entry::Unsortable(Unsortable::new(Ok(record))),
            Entry::Err(error) => Entry::Unsortable(Unsortable::new(Err(error))),
            marker @ Entry::Unsortable(_) => marker,
        }
    }

    /// Converts back into a fallible item, unwrapping any marker.
    pub fn into_fallible(self) -> Fallible<R, E> {
        match self {
            Entry::Ok(record) => Ok(record),
            Entry::Err(error) => Err(error),
            Entry::Unsortable(marker) => marker.into_inner(),
        }
    }
}

impl<R: Record, E> Entry<R, E> {
    /// Returns the shape key used to group entries for order-function
    /// derivation.
    pub fn shape(&self) -> ShapeKey {
        match self {
            Entry::Ok(record) => record.shape(),
            Entry::Err(_) => ShapeKey::Error,
            Entry::Unsortable(_) => ShapeKey::Unsortable,
        }
    }
}

impl<R, E> From<Fallible<R, E>> for Entry<R, E> {
    fn from(item: Fallible<R, E>) -> Self {
        match item {
            Ok(record) => Entry::Ok(record),
            Err(error) => Entry::Err(error),
        }
    }
}

impl<R, E> From<Unsortable<R, E>> for Entry<R, E> {
    fn from(marker: Unsortable<R, E>) -> Self {
        Entry::Unsortable(marker)
    }
}

/// Anything a source may yield: a fallible item or an existing entry.
pub trait IntoEntry {
    /// Record type.
    type Record;
    /// Error type.
    type Error;

    /// Converts into an [`Entry`].
    fn into_entry(self) -> Entry<Self::Record, Self::Error>;
}

impl<R, E> IntoEntry for Fallible<R, E> {
    type Record = R;
    type Error = E;

    fn into_entry(self) -> Entry<R, E> {
        Entry::from(self)
    }
}

impl<R, E> IntoEntry for Entry<R, E> {
    type Record = R;
    type Error = E;

    fn into_entry(self) -> Entry<R, E> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type E = Entry<i32, String>;

    #[test]
    fn wrapping_is_idempotent() {
        let once = E::Ok(1).into_unsortable();
        let twice = once.clone().into_unsortable();
        assert_eq!(once, twice);
        assert_eq!(twice.unsortable().map(|m| m.item()), Some(&Ok(1)));
    }

    #[test]
    fn errors_are_kept_verbatim() {
        let wrapped = E::Err("boom".to_string()).into_unsortable();
        assert_eq!(wrapped.into_fallible(), Err("boom".to_string()));
    }

    #[test]
    fn resolve_looks_through_markers() {
        assert_eq!(E::Ok(3).resolve(), Ok(&3));
        assert_eq!(E::Ok(3).into_unsortable().resolve(), Ok(&3));
        assert_eq!(E::Err("x".into()).resolve(), Err(&"x".to_string()));
    }

    #[test]
    fn conversions() {
        let from_result: E = Ok::<i32, String>(4).into_entry();
        assert!(from_result.is_ok());
        assert_eq!(from_result.record(), Some(&4));

        let from_err: E = Entry::from(Err::<i32, String>("e".into()));
        assert!(from_err.is_err());
        assert_eq!(from_err.error().map(String::as_str), Some("e"));

        let marker: E = Unsortable::new(Ok(1)).into();
        assert!(marker.is_unsortable());
        assert_eq!(marker.clone().into_entry(), marker);
    }
}
