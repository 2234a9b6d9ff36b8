//! Diagnostics produced by the content validation pass.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// 1-based line/column location inside a content document.
///
/// Reconciliation diagnostics are not tied to a single element and use
/// [`Position::UNKNOWN`] (`0:0`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub column: usize,
}

impl Position {
    /// Document-level position used when no element location applies.
    pub const UNKNOWN: Position = Position { line: 0, column: 0 };

    /// Create a position from a line/column pair.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Severity level for a validation diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValidationSeverity {
    /// Non-fatal issue worth surfacing.
    Warning,
    /// Conformance violation.
    Error,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Stable diagnostic codes.
pub mod codes {
    /// `epub:type` token uses a prefix that was never declared.
    pub const UNDECLARED_PREFIX: &str = "OPS_UNDECLARED_PREFIX";
    /// Malformed entry in the root `epub:prefix` attribute.
    pub const INVALID_PREFIX: &str = "OPS_INVALID_PREFIX";
    /// `epub:type` token outside the built-in vocabulary.
    pub const UNDEFINED_TYPE: &str = "OPS_UNDEFINED_TYPE";
    /// `src`-style attribute present but blank.
    pub const EMPTY_SRC: &str = "OPS_EMPTY_SRC";
    /// Video poster is not a core media image.
    pub const POSTER_TYPE: &str = "OPS_POSTER_TYPE";
    /// Object `type` disagrees with the manifest media type.
    pub const OBJECT_TYPE_MISMATCH: &str = "OPS_OBJECT_TYPE_MISMATCH";
    /// Object/audio/video without fallback content.
    pub const MISSING_FALLBACK: &str = "OPS_MISSING_FALLBACK";
    /// Pass ended inside an `object`, `audio` or `video` that never closed.
    pub const UNCLOSED_CONTEXT: &str = "OPS_UNCLOSED_CONTEXT";
    /// Inferred property missing from the manifest declaration.
    pub const PROPERTY_UNDECLARED: &str = "OPF_PROPERTY_UNDECLARED";
    /// Manifest declares properties the document does not exhibit.
    pub const PROPERTY_UNUSED: &str = "OPF_PROPERTY_UNUSED";
}

/// One reported conformance issue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    /// Severity classification.
    pub severity: ValidationSeverity,
    /// Stable machine-readable code (see [`codes`]).
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Path of the document the issue was found in.
    pub path: String,
    /// Location inside the document.
    pub position: Position,
}

impl ValidationDiagnostic {
    /// Build an error-severity diagnostic.
    pub fn error(
        code: &'static str,
        message: impl Into<String>,
        path: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            severity: ValidationSeverity::Error,
            code,
            message: message.into(),
            path: path.into(),
            position,
        }
    }

    /// Build a warning-severity diagnostic.
    pub fn warning(
        code: &'static str,
        message: impl Into<String>,
        path: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            severity: ValidationSeverity::Warning,
            ..Self::error(code, message, path, position)
        }
    }
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: [{}] {}",
            self.path, self.position, self.severity, self.code, self.message
        )
    }
}

/// Receiver for diagnostics emitted during a validation pass.
pub trait DiagnosticSink {
    /// Accept one diagnostic.
    fn report(&mut self, diagnostic: ValidationDiagnostic);
}

impl DiagnosticSink for Vec<ValidationDiagnostic> {
    fn report(&mut self, diagnostic: ValidationDiagnostic) {
        self.push(diagnostic);
    }
}

/// Collected diagnostics for one or more documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    diagnostics: Vec<ValidationDiagnostic>,
    max_diagnostics: usize,
    dropped: usize,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// Create an unbounded report.
    pub fn new() -> Self {
        Self::with_max_diagnostics(usize::MAX)
    }

    /// Create a report that stores at most `max_diagnostics` entries.
    ///
    /// Diagnostics past the cap are counted in [`Self::dropped_count`] but
    /// not stored.
    pub fn with_max_diagnostics(max_diagnostics: usize) -> Self {
        Self {
            diagnostics: Vec::with_capacity(8),
            max_diagnostics,
            dropped: 0,
        }
    }

    /// All stored diagnostics in report order.
    pub fn diagnostics(&self) -> &[ValidationDiagnostic] {
        &self.diagnostics
    }

    /// Consume the report and return the stored diagnostics.
    pub fn into_diagnostics(self) -> Vec<ValidationDiagnostic> {
        self.diagnostics
    }

    /// Number of diagnostics discarded because the cap was reached.
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    /// Number of error-severity diagnostics stored.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == ValidationSeverity::Error)
            .count()
    }

    /// True when no error-severity diagnostic was reported.
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0 && self.dropped == 0
    }

    /// True when any stored diagnostic carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    /// Messages of all stored diagnostics, in report order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().map(|d| d.message.as_str())
    }
}

impl DiagnosticSink for ValidationReport {
    fn report(&mut self, diagnostic: ValidationDiagnostic) {
        if self.diagnostics.len() >= self.max_diagnostics {
            if self.dropped == 0 {
                log::warn!(
                    "Diagnostic cap reached ({}); dropping further diagnostics",
                    self.max_diagnostics
                );
            }
            self.dropped += 1;
            return;
        }
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: &'static str) -> ValidationDiagnostic {
        ValidationDiagnostic::error(code, "msg", "OEBPS/ch1.xhtml", Position::new(3, 7))
    }

    #[test]
    fn report_counts_errors() {
        let mut report = ValidationReport::new();
        assert!(report.is_valid());
        report.report(sample(codes::EMPTY_SRC));
        assert_eq!(report.error_count(), 1);
        assert!(!report.is_valid());
        assert!(report.has_code(codes::EMPTY_SRC));
        assert!(!report.has_code(codes::POSTER_TYPE));
    }

    #[test]
    fn report_cap_drops_excess_diagnostics() {
        let mut report = ValidationReport::with_max_diagnostics(2);
        for _ in 0..5 {
            report.report(sample(codes::MISSING_FALLBACK));
        }
        assert_eq!(report.diagnostics().len(), 2);
        assert_eq!(report.dropped_count(), 3);
        assert!(!report.is_valid());
    }

    #[test]
    fn diagnostic_display_is_single_line() {
        let text = alloc::format!("{}", sample(codes::EMPTY_SRC));
        assert_eq!(text, "OEBPS/ch1.xhtml:3:7: error: [OPS_EMPTY_SRC] msg");
    }
}
