//! Source locations for tokens, tree nodes and emitted code.

use std::fmt;

/// Where a piece of the compiled formula came from.
///
/// Offsets are byte positions into the formula text. Nodes and
/// instructions that the compiler inserts on its own (implicit type
/// conversions) carry [`SourceLocation::Synthetic`] so diagnostics can
/// tell them apart from code that maps directly onto the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLocation {
    At(usize),
    Synthetic,
}

impl SourceLocation {
    pub fn offset(self) -> Option<usize> {
        match self {
            SourceLocation::At(offset) => Some(offset),
            SourceLocation::Synthetic => None,
        }
    }

    pub fn is_synthetic(self) -> bool {
        matches!(self, SourceLocation::Synthetic)
    }
}

impl From<usize> for SourceLocation {
    fn from(offset: usize) -> Self {
        SourceLocation::At(offset)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::At(offset) => write!(f, "@{offset}"),
            SourceLocation::Synthetic => f.write_str("@-"),
        }
    }
}
