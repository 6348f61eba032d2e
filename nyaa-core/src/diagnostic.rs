//! User-facing diagnostics.
//!
//! A [`Diagnostic`] is a value: the library never prints. Front ends decide
//! where diagnostics go and use [`Diagnostic::render`] to point at the
//! offending byte of the formula.

use std::fmt;

use crate::error::CoreError;
use crate::span::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, location: impl Into<SourceLocation>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            location: location.into(),
        }
    }

    pub fn warning(message: impl Into<String>, location: impl Into<SourceLocation>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message, location)
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Convert a compiler error, assigning its stable code.
    pub fn from_error(error: &CoreError) -> Self {
        let location = error
            .position()
            .map_or(SourceLocation::Synthetic, SourceLocation::At);
        let (code, message) = match error {
            CoreError::LexError { message, .. } => ("E0001", message.clone()),
            CoreError::ParseError { message, .. } => ("E0002", message.clone()),
            CoreError::SemanticError { message, .. } => ("E0003", message.clone()),
            CoreError::InvalidNode { .. } => ("E0004", error.to_string()),
            CoreError::ScannerMisuse => ("E0005", error.to_string()),
            CoreError::Internal(_) => ("E0006", error.to_string()),
            CoreError::SourceIo(_) | CoreError::UnsupportedFormat(_) => {
                ("E0007", error.to_string())
            }
        };
        Diagnostic::error(message, location).with_code(code)
    }

    /// Render against `source` with a caret under the reported byte:
    ///
    /// ```text
    /// error[E0002]: unexpected end of formula
    ///   1 +
    ///      ^
    /// ```
    pub fn render(&self, source: &str) -> String {
        let mut out = self.to_string();
        if let Some(offset) = self.location.offset() {
            let line_start = source[..offset.min(source.len())]
                .rfind('\n')
                .map_or(0, |index| index + 1);
            let safe = offset.min(source.len());
            let line_end = source[safe..]
                .find('\n')
                .map_or(source.len(), |index| safe + index);
            let column = source
                .get(line_start..safe)
                .map_or(0, |prefix| prefix.chars().count());
            out.push_str(&format!(
                "\n  {}\n  {}^",
                &source[line_start..line_end],
                " ".repeat(column)
            ));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{code}]: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

impl From<&CoreError> for Diagnostic {
    fn from(error: &CoreError) -> Self {
        Diagnostic::from_error(error)
    }
}
