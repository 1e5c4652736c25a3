//! Inputs to `select`.
//!
//! A source is either something iterable whose items convert into an
//! [`Entry`], or a zero-argument producer returning such a thing. Producers
//! are invoked once, when the query runs.

use std::fmt;
use std::iter::Map;

use crate::error::QueryError;
use crate::fallible::{Entry, IntoEntry};

type EntryOf<T> = Entry<<T as IntoEntry>::Record, <T as IntoEntry>::Error>;

/// Converts an iterable of fallible items into an entry iterator.
pub type Entries<I> = Map<
    <I as IntoIterator>::IntoIter,
    fn(<I as IntoIterator>::Item) -> EntryOf<<I as IntoIterator>::Item>,
>;

/// Anything `select` can read from.
pub trait Source {
    /// Record type of the stream.
    type Record;
    /// Error type of the stream.
    type Error;
    /// Iterator the source normalizes to.
    type Iter: Iterator<Item = Entry<Self::Record, Self::Error>>;

    /// Normalizes the source into a single-pass entry iterator.
    fn into_entries(self) -> Result<Self::Iter, QueryError<Self::Error>>;
}

fn entries<I>(items: I) -> Entries<I>
where
    I: IntoIterator,
    I::Item: IntoEntry,
{
    items
        .into_iter()
        .map(IntoEntry::into_entry as fn(I::Item) -> EntryOf<I::Item>)
}

impl<I> Source for I
where
    I: IntoIterator,
    I::Item: IntoEntry,
{
    type Record = <I::Item as IntoEntry>::Record;
    type Error = <I::Item as IntoEntry>::Error;
    type Iter = Entries<I>;

    fn into_entries(self) -> Result<Self::Iter, QueryError<Self::Error>> {
        Ok(entries(self))
    }
}

/// A zero-argument producer, see [`from_fn`].
pub struct Producer<F> {
    produce: F,
}

/// Wraps a zero-argument producer as a source.
///
/// ```
/// use ordo::{source, Query};
/// use serde_json::json;
///
/// let load = || (1..=3).map(|n| Ok::<_, String>(json!({ "n": n })));
/// let out: Vec<_> = Query::new()
///     .reverse(true)
///     .select(source::from_fn(load))
///     .unwrap()
///     .entries()
///     .unwrap();
/// assert_eq!(out.len(), 3);
/// ```
pub fn from_fn<F, I>(produce: F) -> Producer<F>
where
    F: FnOnce() -> I,
    I: IntoIterator,
    I::Item: IntoEntry,
{
    Producer { produce }
}

impl<F, I> IntoIterator for Producer<F>
where
    F: FnOnce() -> I,
    I: IntoIterator,
{
    type Item = I::Item;
    type IntoIter = I::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        (self.produce)().into_iter()
    }
}

impl<F> fmt::Debug for Producer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

/// A producer that may fail to produce anything, see [`try_from_fn`].
pub struct TryProducer<F> {
    produce: F,
}

/// Wraps a fallible producer as a source.
///
/// If the producer fails, `select` fails with
/// [`QueryError::InvalidSource`] carrying the failure's message.
pub fn try_from_fn<F, I, X>(produce: F) -> TryProducer<F>
where
    F: FnOnce() -> Result<I, X>,
    I: IntoIterator,
    I::Item: IntoEntry,
    X: fmt::Display,
{
    TryProducer { produce }
}

impl<F, I, X> Source for TryProducer<F>
where
    F: FnOnce() -> Result<I, X>,
    I: IntoIterator,
    I::Item: IntoEntry,
    X: fmt::Display,
{
    type Record = <I::Item as IntoEntry>::Record;
    type Error = <I::Item as IntoEntry>::Error;
    type Iter = Entries<I>;

    fn into_entries(self) -> Result<Self::Iter, QueryError<Self::Error>> {
        match (self.produce)() {
            Ok(items) => Ok(entries(items)),
            Err(failure) => Err(QueryError::InvalidSource(failure.to_string())),
        }
    }
}

impl<F> fmt::Debug for TryProducer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryProducer").finish_non_exhaustive()
    }
}
