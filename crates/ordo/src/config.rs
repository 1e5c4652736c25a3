//! Plain-data query options.
//!
//! [`SelectConfig`] carries every `select` option that isn't a closure, so
//! a reporting layer can load it from a config file and apply it with
//! [`Query::with_config`](crate::Query::with_config).

use serde::{Deserialize, Serialize};

/// Serializable subset of the `select` options.
///
/// Missing fields take the same defaults as [`Query::new`](crate::Query::new):
/// `wrap_unsorted` is on, everything else is off.
///
/// ```
/// use ordo::SelectConfig;
///
/// let config: SelectConfig = serde_json::from_str(r#"{"order_key": "at", "limit": 10}"#).unwrap();
/// assert_eq!(config.order_key.as_deref(), Some("at"));
/// assert!(config.wrap_unsorted);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    /// Key or attribute to order by.
    pub order_key: Option<String>,
    /// Emit results in descending order.
    pub reverse: bool,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Drop items that can't be ordered.
    pub drop_unsorted: bool,
    /// Wrap items that can't be ordered and keep them apart from the sort.
    pub wrap_unsorted: bool,
    /// Remove error items from the stream.
    pub drop_exceptions: bool,
    /// Fail on the first error item.
    pub raise_exceptions: bool,
    /// Emit a diagnostic for each error item.
    pub warn_exceptions: bool,
}

impl Default for SelectConfig {
    fn default() -> Self {
        SelectConfig {
            order_key: None,
            reverse: false,
            limit: None,
            drop_unsorted: false,
            wrap_unsorted: true,
            drop_exceptions: false,
            raise_exceptions: false,
            warn_exceptions: false,
        }
    }
}
