use codespan_reporting::diagnostic::Label;
use thiserror::Error;

use crate::util::Location;

/// Whether a failure could go away by extending the input rather than
/// rewriting it. Only an unterminated list is recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Recoverable,
    Nonrecoverable,
}

// An error that will be raised if there was a problem in the source text,
// either while parsing or while checking the shape of the program. Both
// stages report failures in this one shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {message}")]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, location: Location, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            severity,
            location,
            message: message.into(),
        }
    }

    pub fn nonrecoverable(location: Location, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(Severity::Nonrecoverable, location, message)
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity == Severity::Recoverable
    }

    /// Builds a diagnostic for `codespan-reporting`, labelling the location
    /// within `source`.
    pub fn to_codespan(&self, source: &str) -> codespan_reporting::diagnostic::Diagnostic<()> {
        let notes = match self.severity {
            Severity::Recoverable => vec!["this input may be completed by extending it".to_string()],
            Severity::Nonrecoverable => vec![],
        };

        codespan_reporting::diagnostic::Diagnostic::error()
            .with_message(&self.message)
            .with_labels(vec![Label::primary((), self.location.byte_range(source))])
            .with_notes(notes)
    }
}
