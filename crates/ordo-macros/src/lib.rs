//! Proc macros for Ordo.
//!
//! # Derive Macros
//!
//! - [`Record`] - Expose a struct's named fields (and computed members) to
//!   the ordo query engine
//!
//! The generated code refers to `::ordo`, so use the macro through the
//! `ordo` crate's `derive` feature rather than depending on this crate
//! directly.

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Record` trait for structs with named fields.
///
/// Every field is exposed under its name, in declaration order, through
/// `Record::fields`. Field types must implement `ordo::ToValue`.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Don't expose this field |
/// | `rename = "..."` | Expose the field under another name |
///
/// # Container Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `computed(method, ...)` | Expose zero-argument methods as computed members |
///
/// Computed members show up in `Record::get` and `Record::members`, not in
/// `Record::fields`. Their return type must convert into `ordo::Value`.
///
/// # Generated Code
///
/// 1. Name constants for exposed fields (e.g., `Visit::URL`, `Visit::AT`)
/// 2. An implementation of `ordo::Record` with the `Struct` layout
///
/// # Example
///
/// ```ignore
/// use ordo::{Query, Record, Timestamp, Value};
///
/// #[derive(Record)]
/// #[record(computed(end))]
/// struct Span {
///     label: String,
///     start: Timestamp,
///     #[record(rename = "ms")]
///     millis: i64,
///     #[record(skip)]
///     raw: Vec<u8>,
/// }
///
/// impl Span {
///     fn end(&self) -> Timestamp {
///         Timestamp(self.start.0 + self.millis)
///     }
/// }
///
/// let spans = vec![Ok::<_, String>(Span { label: "a".into(), start: Timestamp(5), millis: 1, raw: vec![] })];
/// let out = Query::new().order_key(Span::START).select(spans).unwrap();
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
