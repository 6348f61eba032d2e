use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("unsupported emit format: {0}")]
    UnsupportedFormat(String),
    #[error("lex error at byte {position}: {message}")]
    LexError { position: usize, message: String },
    #[error("parse error at byte {position}: {message}")]
    ParseError { position: usize, message: String },
    #[error("semantic error at byte {position}: {message}")]
    SemanticError { position: usize, message: String },
    #[error("invalid {node}: {message}")]
    InvalidNode { node: &'static str, message: String },
    #[error("can't unget two tokens in a row")]
    ScannerMisuse,
    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        CoreError::ParseError {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn semantic(position: usize, message: impl Into<String>) -> Self {
        CoreError::SemanticError {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_node(node: &'static str, message: impl Into<String>) -> Self {
        CoreError::InvalidNode {
            node,
            message: message.into(),
        }
    }

    /// Byte offset into the formula the error points at, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            CoreError::LexError { position, .. }
            | CoreError::ParseError { position, .. }
            | CoreError::SemanticError { position, .. } => Some(*position),
            _ => None,
        }
    }
}
