//! Ordo - query, order and filter streams of heterogeneous, fallible records.
//!
//! Ordo takes a stream whose items may come from unrelated data shapes (JSON
//! objects with different keys, different struct types) and may individually
//! be errors, and lets you ask for "these items in time order" without a
//! shared schema. It supports:
//!
//! - Filtering with an arbitrary predicate
//! - Ordering by a caller function, a named key, or the first attribute whose
//!   value satisfies a predicate (per record shape)
//! - Graceful degradation: items that can't be ordered are wrapped as
//!   unsortable (or dropped) instead of failing the query
//! - Error items as first-class stream elements, with raise/drop/warn policies
//! - Lazy evaluation wherever ordering doesn't force materialization
//!
//! # Quick Start
//!
//! ```rust
//! use ordo::{Query, Value};
//! use serde_json::json;
//!
//! // Two sources, each with its own shape, plus a failed read.
//! let items = vec![
//!     Ok(json!({"title": "commit", "at": 30})),
//!     Ok(json!({"url": "https://example.org", "visited": 10})),
//!     Err("could not parse line 7".to_string()),
//!     Ok(json!({"title": "commit", "at": 20})),
//! ];
//!
//! let out = Query::new()
//!     .order_value(|v: &Value<'_>| v.is_number())
//!     .select(items)
//!     .unwrap()
//!     .entries()
//!     .unwrap();
//!
//! // The error couldn't be ordered, so it surfaces first, wrapped.
//! assert!(out[0].is_unsortable());
//! assert_eq!(out[1].record().unwrap()["visited"], 10);
//! assert_eq!(out[2].record().unwrap()["at"], 20);
//! assert_eq!(out[3].record().unwrap()["at"], 30);
//! ```
//!
//! # Pipeline
//!
//! ```text
//! source -> raise -> drop -> warn -> filter -> order fn -> partition -> sort -> reattach -> limit
//! ```
//!
//! Unsortable entries go in front of the sorted ones in ascending order and
//! behind them when reversed. Without `drop_exceptions` or `drop_unsorted`,
//! every input item shows up exactly once in the output.
//!
//! # Records
//!
//! The engine reads items through the [`Record`] trait. It ships for
//! `serde_json` objects and `BTreeMap<String, V>`; structs derive it:
//!
//! ```rust
//! # #[cfg(feature = "derive")] {
//! use ordo::{Query, Record, Timestamp, Value};
//!
//! #[derive(Record)]
//! struct Visit {
//!     url: String,
//!     at: Timestamp,
//! }
//!
//! let visits = vec![
//!     Ok::<_, String>(Visit { url: "b".into(), at: Timestamp(2) }),
//!     Ok(Visit { url: "a".into(), at: Timestamp(1) }),
//! ];
//! let out = Query::new()
//!     .order_value(|v: &Value<'_>| v.is_timestamp())
//!     .select(visits)
//!     .unwrap()
//!     .entries()
//!     .unwrap();
//! assert_eq!(out[0].record().unwrap().url, "a");
//! # }
//! ```

mod config;
mod diagnostics;
mod error;
mod fallible;
mod locate;
mod order;
mod partition;
mod query;
mod record;
pub mod source;
mod value;

// Re-export public API
pub use config::SelectConfig;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{QueryError, Result};
pub use fallible::{Entry, Fallible, IntoEntry, Unsortable};
pub use locate::{attribute_fn, find_attribute, locate_value, ValuePredicate};
pub use order::{
    compare_values, order_fn, order_value_fn, sort_entries, Dir, OrderFactory, OrderFn,
};
pub use partition::{drop_unsorted, wrap_unsorted, Partition, SelectItem, UnsortedMode};
pub use query::{select, Query, Selection};
pub use record::{Layout, Record, ShapeKey};
pub use source::Source;
pub use value::{Number, Timestamp, ToValue, Value};

#[cfg(feature = "derive")]
pub use ordo_macros::Record;
