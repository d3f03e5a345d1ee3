//! Model generation modes.

use crate::diagnostics::Diagnostic;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Audience a model is generated for.
///
/// The mode selects the validation schema. Founder inputs all carry
/// defaults; investor inputs must mostly be supplied explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Simplified assumptions with a default for every field.
    #[default]
    #[display("founder")]
    Founder,

    /// Detailed assumptions, most fields required.
    #[display("investor")]
    Investor,
}

/// Error returned when a mode string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown mode '{0}', expected 'founder' or 'investor'")]
pub struct UnknownModeError(pub String);

impl FromStr for Mode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("founder") {
            Ok(Self::Founder)
        } else if trimmed.eq_ignore_ascii_case("investor") {
            Ok(Self::Investor)
        } else {
            Err(UnknownModeError(s.to_string()))
        }
    }
}

impl Mode {
    /// Returns all modes.
    pub const fn all() -> [Self; 2] {
        [Self::Founder, Self::Investor]
    }

    /// Returns the wire name of the mode.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Founder => "founder",
            Self::Investor => "investor",
        }
    }

    /// Resolve a mode string, falling back to [`Mode::Founder`].
    ///
    /// An unrecognised value is not an error for the engine: the founder
    /// schema is used and a diagnostic is returned for the caller to surface.
    pub fn resolve(value: &str) -> (Self, Option<Diagnostic>) {
        match value.parse() {
            Ok(mode) => (mode, None),
            Err(err) => (
                Self::Founder,
                Some(Diagnostic::validation(
                    "input_processor",
                    format!("{err}; using founder defaults"),
                )),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use rstest::rstest;

    #[rstest]
    #[case("founder", Mode::Founder)]
    #[case("investor", Mode::Investor)]
    #[case("  Investor ", Mode::Investor)]
    #[case("FOUNDER", Mode::Founder)]
    fn test_parse_mode(#[case] input: &str, #[case] expected: Mode) {
        assert_eq!(input.parse::<Mode>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_mode() {
        let err = "analyst".parse::<Mode>().unwrap_err();
        assert!(err.to_string().contains("analyst"));
    }

    #[test]
    fn test_resolve_falls_back_to_founder() {
        let (mode, diagnostic) = Mode::resolve("venture");
        assert_eq!(mode, Mode::Founder);
        let diagnostic = diagnostic.unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::Validation);
        assert!(diagnostic.message.contains("venture"));

        let (mode, diagnostic) = Mode::resolve("investor");
        assert_eq!(mode, Mode::Investor);
        assert!(diagnostic.is_none());
    }

    #[test]
    fn test_mode_display_and_serde() {
        assert_eq!(Mode::Investor.to_string(), "investor");
        assert_eq!(Mode::Founder.as_str(), "founder");
        assert_eq!(serde_json::to_string(&Mode::Investor).unwrap(), "\"investor\"");
    }
}
