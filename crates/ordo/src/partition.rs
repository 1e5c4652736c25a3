//! Separating entries the order function can place from those it can't.
//!
//! Three modes, chosen from the `drop_unsorted` / `wrap_unsorted` flags with
//! drop taking precedence:
//!
//! - [`UnsortedMode::Drop`] filters unplaceable entries out lazily.
//! - [`UnsortedMode::Wrap`] consumes the stream and returns two lists: the
//!   unplaceable entries wrapped as unsortable, and the rest untouched.
//! - [`UnsortedMode::Keep`] passes the stream through; the sort then fails
//!   on absent order values.

use crate::error::QueryError;
use crate::fallible::Entry;
use crate::order::OrderFn;

/// Stream item inside the pipeline and in a `Selection`.
pub type SelectItem<R, E> = Result<Entry<R, E>, QueryError<E>>;

/// What to do with entries the order function can't place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsortedMode {
    /// Remove them.
    Drop,
    /// Wrap them as unsortable and keep them apart from the sort.
    #[default]
    Wrap,
    /// Leave them in the stream.
    Keep,
}

impl UnsortedMode {
    /// Resolves the two flags; `drop` wins when both are set.
    pub fn from_flags(drop: bool, wrap: bool) -> Self {
        if drop {
            UnsortedMode::Drop
        } else if wrap {
            UnsortedMode::Wrap
        } else {
            UnsortedMode::Keep
        }
    }
}

/// Result of a wrap-mode partition.
#[derive(Debug)]
pub struct Partition<R, E> {
    /// Entries the order function couldn't place, each wrapped once.
    pub unsortable: Vec<Entry<R, E>>,
    /// Everything else, in input order.
    pub sortable: Vec<Entry<R, E>>,
}

/// Lazily drops entries that are already unsortable or that `order` can't
/// place. Raised errors pass through.
pub fn drop_unsorted<'q, I, R, E>(
    items: I,
    order: OrderFn<'q, R, E>,
) -> impl Iterator<Item = SelectItem<R, E>> + 'q
where
    I: Iterator<Item = SelectItem<R, E>> + 'q,
    R: 'q,
    E: 'q,
{
    items.filter(move |item| match item {
        Ok(Entry::Unsortable(_)) => false,
        Ok(entry) => order(entry).is_some(),
        Err(_) => true,
    })
}

/// Consumes `items` and splits them into unsortable and sortable lists.
///
/// Entries that are already wrapped are kept as they are. A raised error
/// aborts the partition.
pub fn wrap_unsorted<I, R, E>(
    items: I,
    order: &OrderFn<'_, R, E>,
) -> Result<Partition<R, E>, QueryError<E>>
where
    I: Iterator<Item = SelectItem<R, E>>,
{
    let mut partition = Partition {
        unsortable: Vec::new(),
        sortable: Vec::new(),
    };

    for item in items {
        match item? {
            entry @ Entry::Unsortable(_) => partition.unsortable.push(entry),
            entry if order(&entry).is_none() => partition.unsortable.push(entry.into_unsortable()),
            entry => partition.sortable.push(entry),
        }
    }

    Ok(partition)
}
