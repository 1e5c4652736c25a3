//! Query builder and the `select` pipeline.
//!
//! The [`Query`] struct collects the options of one `select` call through a
//! fluent builder. Running it walks these stages in order:
//!
//! 1. normalize the source into an entry stream
//! 2. error policy: raise, then drop, then warn
//! 3. filter
//! 4. pick an order function (`order_by`, `order_key` or `order_value`)
//! 5. partition out entries the order function can't place
//! 6. stable sort
//! 7. reattach unsortable entries (front when ascending, back when reversed)
//! 8. limit
//!
//! Stages 1-3 and 8 are lazy. Ordering materializes the stream.

use std::fmt;
use std::iter;
use std::rc::Rc;

use crate::config::SelectConfig;
use crate::diagnostics::{Diagnostic, Diagnostics, Sink};
use crate::error::QueryError;
use crate::fallible::Entry;
use crate::locate::ValuePredicate;
use crate::order::{order_fn, order_value_fn, sort_entries, Dir, OrderFactory, OrderFn};
use crate::partition::{drop_unsorted, wrap_unsorted, Partition, SelectItem, UnsortedMode};
use crate::record::{Record, ShapeKey};
use crate::source::Source;
use crate::value::Value;

type Stream<'q, R, E> = Box<dyn Iterator<Item = SelectItem<R, E>> + 'q>;
type EntryPredicate<'q, R, E> = Box<dyn Fn(&Entry<R, E>) -> bool + 'q>;

/// How the caller asked for the stream to be ordered.
enum OrderSpec<'q, R, E> {
    By(OrderFn<'q, R, E>),
    Key(String),
    Value(Box<ValuePredicate<'q>>),
}

impl<R, E> OrderSpec<'_, R, E> {
    fn name(&self) -> &'static str {
        match self {
            OrderSpec::By(_) => "order_by",
            OrderSpec::Key(_) => "order_key",
            OrderSpec::Value(_) => "order_value",
        }
    }
}

/// Options for one `select` call.
///
/// # Example
///
/// ```
/// use ordo::{Entry, Query};
/// use serde_json::json;
///
/// let rows = vec![
///     Ok::<_, String>(json!({"x": 3})),
///     Ok(json!({"x": 1})),
///     Ok(json!({"x": 2})),
/// ];
///
/// let out = Query::new()
///     .filter(|e: &Entry<serde_json::Value, String>| {
///         e.record().is_some_and(|r| r["x"] != 2)
///     })
///     .order_key("x")
///     .reverse(true)
///     .select(rows)
///     .unwrap()
///     .entries()
///     .unwrap();
///
/// assert_eq!(out, vec![Entry::Ok(json!({"x": 3})), Entry::Ok(json!({"x": 1}))]);
/// ```
pub struct Query<'q, R, E> {
    filter: Option<EntryPredicate<'q, R, E>>,
    orders: Vec<OrderSpec<'q, R, E>>,
    default: Option<Value<'static>>,
    reverse: bool,
    limit: Option<usize>,
    drop_unsorted: bool,
    wrap_unsorted: bool,
    drop_exceptions: bool,
    raise_exceptions: bool,
    warn_exceptions: bool,
    warn_with: Option<Sink<'q, E>>,
}

impl<R, E> Default for Query<'_, R, E> {
    fn default() -> Self {
        Query {
            filter: None,
            orders: Vec::new(),
            default: None,
            reverse: false,
            limit: None,
            drop_unsorted: false,
            wrap_unsorted: true,
            drop_exceptions: false,
            raise_exceptions: false,
            warn_exceptions: false,
            warn_with: None,
        }
    }
}

impl<'q, R, E> Query<'q, R, E> {
    /// Creates a query that passes everything through in source order.
    pub fn new() -> Self {
        Query::default()
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// Keeps only entries satisfying `predicate`.
    ///
    /// The predicate sees every entry, error entries included unless
    /// `drop_exceptions` removed them first.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Entry<R, E>) -> bool + 'q,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Orders by a caller-supplied function.
    ///
    /// Returning `None` marks the entry as unsortable.
    pub fn order_by<F>(mut self, order: F) -> Self
    where
        F: Fn(&Entry<R, E>) -> Option<Value<'_>> + 'q,
    {
        self.orders.push(OrderSpec::By(order_fn(order)));
        self
    }

    /// Orders by a named key or attribute.
    ///
    /// The function is derived from the first entry of the filtered stream
    /// and applied to every entry, so this suits streams of one shape.
    pub fn order_key(mut self, key: impl Into<String>) -> Self {
        self.orders.push(OrderSpec::Key(key.into()));
        self
    }

    /// Orders by the first attribute whose value satisfies `predicate`.
    ///
    /// One function is derived per distinct [`ShapeKey`], so mixed streams
    /// work. The whole stream is materialized to do this.
    pub fn order_value<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value<'_>) -> bool + 'q,
    {
        self.orders.push(OrderSpec::Value(Box::new(predicate)));
        self
    }

    /// Order value for error entries and for records missing the attribute.
    ///
    /// A record whose attribute exists but is empty (`Value::None`) does not
    /// get the default: it has no order value, so it is wrapped as
    /// unsortable (or dropped with `drop_unsorted`).
    pub fn default_value(mut self, default: impl Into<Value<'static>>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Emits results in descending order.
    ///
    /// Without an ordering, the filtered stream is emitted back to front.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Sets the maximum number of results to return.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    // ========================================================================
    // Unsortable handling
    // ========================================================================

    /// Drops entries the order function can't place. Takes precedence over
    /// `wrap_unsorted`.
    pub fn drop_unsorted(mut self, drop: bool) -> Self {
        self.drop_unsorted = drop;
        self
    }

    /// Wraps entries the order function can't place as unsortable. On by
    /// default.
    pub fn wrap_unsorted(mut self, wrap: bool) -> Self {
        self.wrap_unsorted = wrap;
        self
    }

    // ========================================================================
    // Error policy
    // ========================================================================

    /// Removes error entries from the stream.
    pub fn drop_exceptions(mut self, drop: bool) -> Self {
        self.drop_exceptions = drop;
        self
    }

    /// Fails with [`QueryError::Raised`] on the first error entry.
    pub fn raise_exceptions(mut self, raise: bool) -> Self {
        self.raise_exceptions = raise;
        self
    }

    /// Emits a [`Diagnostic::Error`] for each error entry and keeps it.
    pub fn warn_exceptions(mut self, warn: bool) -> Self {
        self.warn_exceptions = warn;
        self
    }

    /// Sends diagnostics to `sink` instead of the `log` facade.
    pub fn warn_with<F>(mut self, sink: F) -> Self
    where
        F: Fn(Diagnostic<'_, E>) + 'q,
    {
        self.warn_with = Some(Box::new(sink));
        self
    }

    /// Applies the options in `config`.
    ///
    /// `order_key` is added to any ordering already set.
    pub fn with_config(mut self, config: &SelectConfig) -> Self {
        if let Some(key) = &config.order_key {
            self = self.order_key(key.clone());
        }
        if let Some(limit) = config.limit {
            self = self.limit(limit);
        }
        self.reverse = config.reverse;
        self.drop_unsorted = config.drop_unsorted;
        self.wrap_unsorted = config.wrap_unsorted;
        self.drop_exceptions = config.drop_exceptions;
        self.raise_exceptions = config.raise_exceptions;
        self.warn_exceptions = config.warn_exceptions;
        self
    }

    /// Finalizes the query.
    ///
    /// Fails with [`QueryError::AmbiguousOrder`] when more than one ordering
    /// was set.
    pub fn build(self) -> Result<Self, QueryError<E>> {
        if self.orders.len() > 1 {
            return Err(QueryError::AmbiguousOrder {
                count: self.orders.len(),
            });
        }
        Ok(self)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the limit, if set.
    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the default order value, if set.
    pub fn get_default(&self) -> Option<&Value<'static>> {
        self.default.as_ref()
    }

    /// Returns `true` if results are emitted in descending order.
    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    /// Returns how unsortable entries are handled.
    pub fn unsorted_mode(&self) -> UnsortedMode {
        UnsortedMode::from_flags(self.drop_unsorted, self.wrap_unsorted)
    }

    /// Returns `true` if an ordering was requested.
    pub fn is_ordered(&self) -> bool {
        !self.orders.is_empty()
    }
}

impl<'q, R, E> Query<'q, R, E>
where
    R: Record + 'q,
    E: fmt::Display + 'q,
{
    /// Runs the query against `source`.
    ///
    /// Construction errors are returned here. A raised error comes back here
    /// when an eager stage met it, or as the last item of the [`Selection`]
    /// otherwise.
    pub fn select<S>(self, source: S) -> Result<Selection<'q, R, E>, QueryError<E>>
    where
        S: Source<Record = R, Error = E>,
        S::Iter: 'q,
    {
        let Query {
            filter,
            orders,
            default,
            reverse,
            limit,
            drop_unsorted,
            wrap_unsorted,
            drop_exceptions,
            raise_exceptions,
            warn_exceptions,
            warn_with,
        } = self.build()?;

        let diagnostics = Rc::new(Diagnostics::from_sink(warn_with));
        let mut stream: Stream<'q, R, E> = Box::new(source.into_entries()?.map(Ok));

        if raise_exceptions {
            stream = Box::new(RaiseErrors {
                inner: stream,
                raised: false,
            });
        }
        if drop_exceptions {
            stream = Box::new(stream.filter(|item| !matches!(item, Ok(Entry::Err(_)))));
        }
        if warn_exceptions {
            let diagnostics = Rc::clone(&diagnostics);
            stream = Box::new(stream.inspect(move |item| {
                if let Ok(Entry::Err(error)) = item {
                    diagnostics.emit(Diagnostic::Error(error));
                }
            }));
        }
        if let Some(predicate) = filter {
            stream = Box::new(stream.filter(move |item| match item {
                Ok(entry) => predicate(entry),
                Err(_) => true,
            }));
        }

        let mut stream: Stream<'q, R, E> = match orders.into_iter().next() {
            Some(spec) => {
                let stage = OrderStage {
                    default,
                    dir: Dir::from_reverse(reverse),
                    mode: UnsortedMode::from_flags(drop_unsorted, wrap_unsorted),
                    diagnostics: &diagnostics,
                };
                stage.apply(stream, spec)?
            }
            None if reverse => {
                log::debug!(target: "ordo", "no ordering requested, reversing source order");
                let mut entries = stream.collect::<Result<Vec<_>, _>>()?;
                entries.reverse();
                Box::new(entries.into_iter().map(Ok))
            }
            None => stream,
        };

        if let Some(n) = limit {
            stream = Box::new(stream.take(n));
        }

        Ok(Selection { inner: stream })
    }
}

impl<R, E> fmt::Debug for Query<'_, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let orders: Vec<&str> = self.orders.iter().map(OrderSpec::name).collect();
        f.debug_struct("Query")
            .field("filter", &self.filter.is_some())
            .field("orders", &orders)
            .field("default", &self.default)
            .field("reverse", &self.reverse)
            .field("limit", &self.limit)
            .field("unsorted", &self.unsorted_mode())
            .field("drop_exceptions", &self.drop_exceptions)
            .field("raise_exceptions", &self.raise_exceptions)
            .field("warn_exceptions", &self.warn_exceptions)
            .field("warn_with", &self.warn_with.is_some())
            .finish()
    }
}

/// Runs `query` against `source`. Same as [`Query::select`].
pub fn select<'q, S>(
    source: S,
    query: Query<'q, S::Record, S::Error>,
) -> Result<Selection<'q, S::Record, S::Error>, QueryError<S::Error>>
where
    S: Source,
    S::Iter: 'q,
    S::Record: Record + 'q,
    S::Error: fmt::Display + 'q,
{
    query.select(source)
}

/// Lazy result of a `select` call.
///
/// Yields entries in their final order. An `Err` item only appears when
/// `raise_exceptions` met an error lazily; nothing follows it.
pub struct Selection<'q, R, E> {
    inner: Stream<'q, R, E>,
}

impl<R, E> Selection<'_, R, E> {
    /// Collects every entry, stopping at a raised error.
    pub fn entries(self) -> Result<Vec<Entry<R, E>>, QueryError<E>> {
        self.collect()
    }
}

impl<R, E> Iterator for Selection<'_, R, E> {
    type Item = SelectItem<R, E>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<R, E> fmt::Debug for Selection<'_, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection").finish_non_exhaustive()
    }
}

/// Turns the first error entry into a raised error and ends the stream.
struct RaiseErrors<'q, R, E> {
    inner: Stream<'q, R, E>,
    raised: bool,
}

impl<R, E> Iterator for RaiseErrors<'_, R, E> {
    type Item = SelectItem<R, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.raised {
            return None;
        }
        match self.inner.next()? {
            Ok(Entry::Err(error)) => {
                self.raised = true;
                Some(Err(QueryError::Raised(error)))
            }
            item => Some(item),
        }
    }
}

/// Stages 4-7 of the pipeline.
struct OrderStage<'d, 'q, E> {
    default: Option<Value<'static>>,
    dir: Dir,
    mode: UnsortedMode,
    diagnostics: &'d Diagnostics<'q, E>,
}

impl<'q, E> OrderStage<'_, 'q, E>
where
    E: fmt::Display + 'q,
{
    fn apply<R>(
        self,
        stream: Stream<'q, R, E>,
        spec: OrderSpec<'q, R, E>,
    ) -> Result<Stream<'q, R, E>, QueryError<E>>
    where
        R: Record + 'q,
    {
        let (order, stream) = match spec {
            OrderSpec::By(order) => {
                log::debug!(target: "ordo", "ordering by caller function");
                (order, stream)
            }
            OrderSpec::Key(key) => match self.key_order(stream, key)? {
                Some(found) => found,
                None => return Ok(Box::new(iter::empty())),
            },
            OrderSpec::Value(predicate) => {
                let entries = stream.collect::<Result<Vec<_>, _>>()?;
                if entries.is_empty() {
                    return Ok(Box::new(iter::empty()));
                }
                let factory = OrderFactory::new()
                    .predicate(&*predicate)
                    .default_value(self.default.clone())
                    .force_total(true);
                let order = order_value_fn(&entries, &factory, self.diagnostics);
                log::debug!(target: "ordo", "ordering {} entries by value", entries.len());
                (order, Box::new(entries.into_iter().map(Ok)) as Stream<'q, R, E>)
            }
        };

        self.sort(stream, order)
    }

    /// Derives the order function from the first entry. Returns `None` when
    /// the stream is empty.
    #[allow(clippy::type_complexity)]
    fn key_order<R>(
        &self,
        mut stream: Stream<'q, R, E>,
        key: String,
    ) -> Result<Option<(OrderFn<'q, R, E>, Stream<'q, R, E>)>, QueryError<E>>
    where
        R: Record + 'q,
    {
        let first = match stream.next() {
            Some(item) => item?,
            None => return Ok(None),
        };

        let order = OrderFactory::new()
            .key(key.clone())
            .default_value(self.default.clone())
            .build(&first, self.diagnostics)
            .ok_or_else(|| QueryError::KeyNotFound {
                key: key.clone(),
                shape: describe(&first),
            })?;
        log::debug!(target: "ordo", "ordering by key '{key}'");

        let stream: Stream<'q, R, E> = Box::new(iter::once(Ok(first)).chain(stream));
        Ok(Some((order, stream)))
    }

    fn sort<R>(
        &self,
        stream: Stream<'q, R, E>,
        order: OrderFn<'q, R, E>,
    ) -> Result<Stream<'q, R, E>, QueryError<E>>
    where
        R: 'q,
    {
        let (unsortable, sortable) = match self.mode {
            UnsortedMode::Drop => {
                let kept = drop_unsorted(stream, Rc::clone(&order)).collect::<Result<Vec<_>, _>>()?;
                (Vec::new(), kept)
            }
            UnsortedMode::Wrap => {
                let Partition {
                    unsortable,
                    sortable,
                } = wrap_unsorted(stream, &order)?;
                (unsortable, sortable)
            }
            UnsortedMode::Keep => (Vec::new(), stream.collect::<Result<Vec<_>, _>>()?),
        };

        log::debug!(
            target: "ordo",
            "sorting {} entries {}, {} unsortable",
            sortable.len(),
            self.dir,
            unsortable.len()
        );
        let sorted = sort_entries(sortable, &order, self.dir)?;

        let out: Vec<Entry<R, E>> = match self.dir {
            Dir::Asc => unsortable.into_iter().chain(sorted).collect(),
            Dir::Desc => sorted.into_iter().chain(unsortable).collect(),
        };
        Ok(Box::new(out.into_iter().map(Ok)))
    }
}

fn describe<R: Record, E>(entry: &Entry<R, E>) -> String {
    match entry.resolve() {
        Ok(record) => record.shape().to_string(),
        Err(_) => ShapeKey::Error.to_string(),
    }
}
