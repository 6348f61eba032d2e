//! Typed syntax tree for Nyaa formulas.
//!
//! A [`Node`] can only be built through its constructors, which check the
//! typing rules up front: once a tree exists it is well typed and can be
//! lowered without further checks. Nodes own their children and are
//! immutable after construction.

use std::fmt;
use std::sync::Arc;

use crate::builtins::Function;
use crate::error::CoreError;
use crate::span::SourceLocation;
use crate::token::{Token, TokenKind};
use crate::types::NodeType;

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    ty: NodeType,
    location: SourceLocation,
}

/// The closed set of node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    BinaryOp {
        operator: Token,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    UnaryOp {
        operator: Token,
        operand: Box<Node>,
    },
    BooleanConstant(bool),
    FloatConstant(f64),
    StringConstant(String),
    /// Attribute reference with an optional default for missing values.
    Identifier {
        name: String,
        default: Option<Box<Node>>,
    },
    FunctionCall {
        function: Arc<dyn Function>,
        args: Vec<Node>,
    },
    ConvertToString(Box<Node>),
    ConvertToFloat(Box<Node>),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::BinaryOp { .. } => "BinaryOp",
            NodeKind::UnaryOp { .. } => "UnaryOp",
            NodeKind::BooleanConstant(_) => "BooleanConstant",
            NodeKind::FloatConstant(_) => "FloatConstant",
            NodeKind::StringConstant(_) => "StringConstant",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::FunctionCall { .. } => "FunctionCall",
            NodeKind::ConvertToString(_) => "ConvertToString",
            NodeKind::ConvertToFloat(_) => "ConvertToFloat",
        }
    }
}

impl Node {
    /// `lhs <operator> rhs`. Both operands must already have the same type;
    /// this constructor never inserts conversions.
    pub fn binary_op(
        location: usize,
        operator: Token,
        lhs: Node,
        rhs: Node,
    ) -> Result<Node, CoreError> {
        if !(operator.is_arithmetic() || operator.is_comparison() || operator.is_string_op()) {
            return Err(CoreError::invalid_node(
                "BinaryOp",
                format!("unknown operator '{operator}'"),
            ));
        }
        if lhs.ty != rhs.ty {
            return Err(CoreError::invalid_node(
                "BinaryOp",
                format!(
                    "left and right operands must be of the same type, got {} and {}",
                    lhs.ty, rhs.ty
                ),
            ));
        }

        let ty = if operator.is_comparison() {
            NodeType::Boolean
        } else {
            lhs.ty
        };
        Ok(Node {
            kind: NodeKind::BinaryOp {
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            location: SourceLocation::At(location),
        })
    }

    /// Unary `+` or `-`.
    pub fn unary_op(location: usize, operator: Token, operand: Node) -> Result<Node, CoreError> {
        if !matches!(operator.kind(), TokenKind::Plus | TokenKind::Minus) {
            return Err(CoreError::invalid_node(
                "UnaryOp",
                format!("invalid unary operation '{operator}'"),
            ));
        }
        let ty = operand.ty;
        Ok(Node {
            kind: NodeKind::UnaryOp {
                operator,
                operand: Box::new(operand),
            },
            ty,
            location: SourceLocation::At(location),
        })
    }

    pub fn boolean_constant(location: usize, value: bool) -> Node {
        Node::leaf(NodeKind::BooleanConstant(value), NodeType::Boolean, location)
    }

    pub fn float_constant(location: usize, value: f64) -> Node {
        Node::leaf(NodeKind::FloatConstant(value), NodeType::Float, location)
    }

    pub fn string_constant(location: usize, value: impl Into<String>) -> Node {
        Node::leaf(NodeKind::StringConstant(value.into()), NodeType::String, location)
    }

    /// Reference to attribute `name` of type `ty`. A default, if given,
    /// must have the same type.
    pub fn identifier(
        location: usize,
        name: impl Into<String>,
        default: Option<Node>,
        ty: NodeType,
    ) -> Result<Node, CoreError> {
        if let Some(default) = &default {
            if default.ty != ty {
                return Err(CoreError::invalid_node(
                    "Identifier",
                    format!("default value of type {} must match type {ty}", default.ty),
                ));
            }
        }
        Ok(Node {
            kind: NodeKind::Identifier {
                name: name.into(),
                default: default.map(Box::new),
            },
            ty,
            location: SourceLocation::At(location),
        })
    }

    /// Call of `function` with `args`, statically typed as `return_type`.
    ///
    /// `return_type` must be what the function's validator reports for
    /// the argument types.
    pub fn function_call(
        location: usize,
        function: Arc<dyn Function>,
        return_type: NodeType,
        args: Vec<Node>,
    ) -> Result<Node, CoreError> {
        let arg_types: Vec<NodeType> = args.iter().map(Node::ty).collect();
        match function.validate_arg_types(&arg_types) {
            Some(ty) if ty == return_type => {}
            Some(ty) => {
                return Err(CoreError::invalid_node(
                    "FunctionCall",
                    format!(
                        "{} returns {ty} for these arguments, not {return_type}",
                        function.name()
                    ),
                ));
            }
            None => {
                return Err(CoreError::invalid_node(
                    "FunctionCall",
                    format!("arguments do not match the signature of {}", function.name()),
                ));
            }
        }
        Ok(Node {
            kind: NodeKind::FunctionCall { function, args },
            ty: return_type,
            location: SourceLocation::At(location),
        })
    }

    /// Compiler-inserted conversion of a Float, Integer or Boolean to String.
    pub fn convert_to_string(convertee: Node) -> Result<Node, CoreError> {
        if !matches!(
            convertee.ty,
            NodeType::Float | NodeType::Integer | NodeType::Boolean
        ) {
            return Err(CoreError::invalid_node(
                "ConvertToString",
                format!(
                    "convertee must be of type FLOAT, INT or BOOLEAN, got {}",
                    convertee.ty
                ),
            ));
        }
        Ok(Node {
            kind: NodeKind::ConvertToString(Box::new(convertee)),
            ty: NodeType::String,
            location: SourceLocation::Synthetic,
        })
    }

    /// Compiler-inserted conversion of an Integer, Boolean or String to Float.
    pub fn convert_to_float(convertee: Node) -> Result<Node, CoreError> {
        if !matches!(
            convertee.ty,
            NodeType::Integer | NodeType::Boolean | NodeType::String
        ) {
            return Err(CoreError::invalid_node(
                "ConvertToFloat",
                format!(
                    "convertee must be of type INT, BOOLEAN or STRING, got {}",
                    convertee.ty
                ),
            ));
        }
        Ok(Node {
            kind: NodeKind::ConvertToFloat(Box::new(convertee)),
            ty: NodeType::Float,
            location: SourceLocation::Synthetic,
        })
    }

    fn leaf(kind: NodeKind, ty: NodeType, location: usize) -> Node {
        Node {
            kind,
            ty,
            location: SourceLocation::At(location),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Static type of the value this node's code leaves on the stack.
    pub fn ty(&self) -> NodeType {
        self.ty
    }

    pub fn source_location(&self) -> SourceLocation {
        self.location
    }

    /// Left operand of a binary operation, or the single child of a unary
    /// operation or conversion.
    pub fn left(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::BinaryOp { lhs, .. } => Some(lhs),
            NodeKind::UnaryOp { operand, .. } => Some(operand),
            NodeKind::ConvertToString(inner) | NodeKind::ConvertToFloat(inner) => Some(inner),
            _ => None,
        }
    }

    /// Right operand of a binary operation.
    pub fn right(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::BinaryOp { rhs, .. } => Some(rhs),
            _ => None,
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize, label: &str) -> fmt::Result {
        write!(f, "{:indent$}{label}{}", "", self.kind.name(), indent = depth * 2)?;
        match &self.kind {
            NodeKind::BinaryOp { operator, .. } | NodeKind::UnaryOp { operator, .. } => {
                write!(f, " '{operator}'")?
            }
            NodeKind::BooleanConstant(value) => write!(f, " {value}")?,
            NodeKind::FloatConstant(value) => write!(f, " {value}")?,
            NodeKind::StringConstant(value) => write!(f, " {value:?}")?,
            NodeKind::Identifier { name, .. } => write!(f, " {name:?}")?,
            NodeKind::FunctionCall { function, args } => {
                write!(f, " {} with {} args", function.name(), args.len())?
            }
            NodeKind::ConvertToString(_) | NodeKind::ConvertToFloat(_) => {}
        }
        writeln!(f, " : {} {}", self.ty, self.location)?;

        match &self.kind {
            NodeKind::Identifier {
                default: Some(default),
                ..
            } => default.fmt_tree(f, depth + 1, "default: "),
            NodeKind::FunctionCall { args, .. } => {
                for arg in args {
                    arg.fmt_tree(f, depth + 1, "")?;
                }
                Ok(())
            }
            _ => {
                if let Some(left) = self.left() {
                    left.fmt_tree(f, depth + 1, "")?;
                }
                if let Some(right) = self.right() {
                    right.fmt_tree(f, depth + 1, "")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::FunctionRegistry;

    fn int_attr(name: &str) -> Node {
        Node::identifier(0, name, None, NodeType::Integer).expect("identifier")
    }

    #[test]
    fn binary_op_requires_equal_operand_types() {
        let err = Node::binary_op(
            1,
            Token::PLUS,
            Node::float_constant(0, 1.0),
            Node::string_constant(2, "x"),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNode { node: "BinaryOp", .. }));

        let node = Node::binary_op(1, Token::PLUS, int_attr("a"), int_attr("b")).expect("ints");
        assert_eq!(node.ty(), NodeType::Integer);
    }

    #[test]
    fn comparison_is_boolean_regardless_of_operands() {
        for (lhs, rhs) in [
            (Node::float_constant(0, 1.0), Node::float_constant(4, 2.0)),
            (Node::string_constant(0, "a"), Node::string_constant(4, "b")),
            (int_attr("a"), int_attr("b")),
        ] {
            let node = Node::binary_op(2, Token::LESS_OR_EQUAL, lhs, rhs).expect("comparison");
            assert_eq!(node.ty(), NodeType::Boolean);
        }
    }

    #[test]
    fn binary_op_rejects_non_operators() {
        let err = Node::binary_op(
            1,
            Token::COMMA,
            Node::float_constant(0, 1.0),
            Node::float_constant(2, 2.0),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNode { node: "BinaryOp", .. }));
    }

    #[test]
    fn unary_op_accepts_only_plus_and_minus() {
        let node = Node::unary_op(0, Token::MINUS, Node::float_constant(1, 2.0)).expect("minus");
        assert_eq!(node.ty(), NodeType::Float);
        assert!(node.left().is_some());
        assert!(node.right().is_none());

        let err = Node::unary_op(0, Token::STAR, Node::float_constant(1, 2.0)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidNode { node: "UnaryOp", .. }));
    }

    #[test]
    fn identifier_default_must_match_type() {
        let err = Node::identifier(
            0,
            "qty",
            Some(Node::string_constant(5, "none")),
            NodeType::Integer,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNode { node: "Identifier", .. }));

        let node = Node::identifier(
            0,
            "label",
            Some(Node::string_constant(7, "none")),
            NodeType::String,
        )
        .expect("matching default");
        assert!(node.left().is_none(), "defaults are not structural children");
    }

    #[test]
    fn conversions_check_their_domain_and_are_synthetic() {
        let to_string = Node::convert_to_string(int_attr("n")).expect("int to string");
        assert_eq!(to_string.ty(), NodeType::String);
        assert!(to_string.source_location().is_synthetic());

        let err = Node::convert_to_string(Node::string_constant(0, "s")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidNode { node: "ConvertToString", .. }));

        let to_float = Node::convert_to_float(Node::boolean_constant(0, true)).expect("bool");
        assert_eq!(to_float.ty(), NodeType::Float);

        let err = Node::convert_to_float(Node::float_constant(0, 1.0)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidNode { node: "ConvertToFloat", .. }));
    }

    #[test]
    fn function_call_type_must_match_validator() {
        let registry = FunctionRegistry::with_builtins();
        let len = registry.lookup("LEN").expect("LEN").clone();

        let call = Node::function_call(
            0,
            len.clone(),
            NodeType::Integer,
            vec![Node::string_constant(4, "abc")],
        )
        .expect("valid call");
        assert_eq!(call.ty(), NodeType::Integer);
        assert!(call.left().is_none());

        let err = Node::function_call(
            0,
            len.clone(),
            NodeType::String,
            vec![Node::string_constant(4, "abc")],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNode { node: "FunctionCall", .. }));

        let err = Node::function_call(0, len, NodeType::Integer, vec![]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidNode { node: "FunctionCall", .. }));
    }

    #[test]
    fn displays_tree() {
        let node = Node::binary_op(
            4,
            Token::AMPERSAND,
            Node::string_constant(0, "2"),
            Node::convert_to_string(Node::identifier(6, "X", None, NodeType::Integer).expect("X"))
                .expect("convert"),
        )
        .expect("concat");
        let text = node.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "BinaryOp '&' : STRING @4");
        assert_eq!(lines[1], "  StringConstant \"2\" : STRING @0");
        assert_eq!(lines[2], "  ConvertToString : STRING @-");
        assert_eq!(lines[3], "    Identifier \"X\" : INT @6");
    }
}
