//! Structured diagnostics returned alongside computed results.
//!
//! Nothing in the engine aborts mid-computation. Conditions that degrade a
//! result (an undefined terminal value, a missing baseline) are recorded as
//! [`Diagnostic`]s and travel with the output so the caller can decide what
//! to do with them.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Input could not be interpreted as given.
    #[display("validation")]
    Validation,

    /// A computation fell back to a degraded value.
    #[display("computation")]
    Computation,

    /// Historical or baseline data was sparse or absent.
    #[display("data gap")]
    DataGap,
}

/// A single warning produced by one of the engine components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Diagnostic category.
    pub kind: DiagnosticKind,

    /// Component that raised the diagnostic (e.g. `valuation_engine`).
    pub component: String,

    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(kind: DiagnosticKind, component: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            component: component.to_string(),
            message: message.into(),
        }
    }

    /// Create a validation diagnostic.
    pub fn validation(component: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Validation, component, message)
    }

    /// Create a computation warning.
    pub fn computation(component: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Computation, component, message)
    }

    /// Create a data-gap warning.
    pub fn data_gap(component: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::DataGap, component, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.component, self.kind, self.message)
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty collection.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a diagnostic and emit it as a `tracing` warning.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            component = %diagnostic.component,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.0.push(diagnostic);
    }

    /// Append every diagnostic from another collection without re-logging.
    pub fn merge(&mut self, other: &Self) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Iterate over the diagnostics in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Iterate over diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.kind == kind)
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no diagnostics were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the collection.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_filter() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::computation("valuation_engine", "WACC below growth"));
        diagnostics.push(Diagnostic::data_gap("model_engine", "no revenue baseline"));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::DataGap).count(), 1);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::Validation).count(), 0);
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut first: Diagnostics = vec![Diagnostic::validation("a", "one")].into_iter().collect();
        let second: Diagnostics = vec![Diagnostic::validation("b", "two")].into_iter().collect();

        first.merge(&second);
        let messages: Vec<_> = first.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::data_gap("input_processor", "no historical data");
        assert_eq!(
            diagnostic.to_string(),
            "[input_processor] data gap: no historical data"
        );
    }

    #[test]
    fn test_serializes_as_list() {
        let diagnostics: Diagnostics =
            vec![Diagnostic::computation("valuation_engine", "zero TV")].into_iter().collect();
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["kind"], "computation");
    }
}
