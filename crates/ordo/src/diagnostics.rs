//! Advisory diagnostics emitted while a query runs.
//!
//! Diagnostics never block or fail the pipeline. They go to a caller-supplied
//! callback, or to the `log` facade under the `ordo` target when none is set.

use std::fmt;

/// Something the pipeline wants the caller to know about.
#[derive(Debug)]
pub enum Diagnostic<'a, E> {
    /// An error item seen by the `warn_exceptions` policy.
    Error(&'a E),
    /// Order determination fell back to a weaker strategy.
    Degraded(String),
}

impl<E: fmt::Display> fmt::Display for Diagnostic<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Error(error) => write!(f, "encountered error in source: {error}"),
            Diagnostic::Degraded(reason) => f.write_str(reason),
        }
    }
}

pub(crate) type Sink<'q, E> = Box<dyn Fn(Diagnostic<'_, E>) + 'q>;

/// Where diagnostics go.
pub struct Diagnostics<'q, E> {
    sink: Option<Sink<'q, E>>,
}

impl<'q, E> Diagnostics<'q, E> {
    /// Sends diagnostics to the `log` facade.
    pub fn log() -> Self {
        Diagnostics { sink: None }
    }

    /// Sends diagnostics to `f`.
    pub fn with<F>(f: F) -> Self
    where
        F: Fn(Diagnostic<'_, E>) + 'q,
    {
        Diagnostics {
            sink: Some(Box::new(f)),
        }
    }

    pub(crate) fn from_sink(sink: Option<Sink<'q, E>>) -> Self {
        Diagnostics { sink }
    }

    /// Emits one diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic<'_, E>)
    where
        E: fmt::Display,
    {
        match &self.sink {
            Some(sink) => sink(diagnostic),
            None => log::warn!(target: "ordo", "{diagnostic}"),
        }
    }
}

impl<E> fmt::Debug for Diagnostics<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("custom_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn callback_receives_diagnostics() {
        let seen = RefCell::new(Vec::new());
        let diagnostics = Diagnostics::with(|d: Diagnostic<'_, String>| {
            seen.borrow_mut().push(d.to_string())
        });

        diagnostics.emit(Diagnostic::Error(&"boom".to_string()));
        diagnostics.emit(Diagnostic::Degraded("fell back".into()));

        assert_eq!(
            *seen.borrow(),
            vec!["encountered error in source: boom", "fell back"]
        );
    }

    #[test]
    fn default_sink_does_not_panic() {
        let diagnostics: Diagnostics<'_, String> = Diagnostics::log();
        diagnostics.emit(Diagnostic::Degraded("nobody listening".into()));
    }
}
