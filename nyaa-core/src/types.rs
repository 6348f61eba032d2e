//! Static value types of formula expressions.
//!
//! Every tree node has exactly one of these four types. Function
//! descriptors whose result depends on their arguments declare their
//! return type as `None` instead (see [`crate::builtins::Function`]).

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Boolean,
    Integer,
    Float,
    String,
}

impl NodeType {
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Boolean => "BOOLEAN",
            NodeType::Integer => "INT",
            NodeType::Float => "FLOAT",
            NodeType::String => "STRING",
        }
    }

    /// Integer and Float values, the operands numeric comparison widens.
    pub fn is_numeric(self) -> bool {
        matches!(self, NodeType::Integer | NodeType::Float)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Ok(NodeType::Boolean),
            "integer" | "int" => Ok(NodeType::Integer),
            "float" => Ok(NodeType::Float),
            "string" => Ok(NodeType::String),
            other => Err(format!("unknown value type '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_names_case_insensitively() {
        assert_eq!("Integer".parse::<NodeType>(), Ok(NodeType::Integer));
        assert_eq!(" FLOAT ".parse::<NodeType>(), Ok(NodeType::Float));
        assert_eq!("bool".parse::<NodeType>(), Ok(NodeType::Boolean));
        assert!("date".parse::<NodeType>().is_err());
    }
}
