//! Type reconciliation for the parser.
//!
//! [`Node`] constructors only verify types; they never coerce. The
//! helpers here run first and wrap operands in conversion nodes so that
//! the constructors' rules hold:
//!
//! - arithmetic (`+ - * / ^`, unary `+ -`) works on Float only, so any
//!   other operand is wrapped in `ConvertToFloat`;
//! - `&` works on String only, so any other operand is wrapped in
//!   `ConvertToString`;
//! - comparisons need equal types; Integer against Float widens the
//!   Integer side, every other mismatch is an error;
//! - an attribute default takes the attribute's type, converting to
//!   String or Float when that is possible.

use std::sync::Arc;

use crate::ast::Node;
use crate::builtins::Function;
use crate::error::CoreError;
use crate::token::Token;
use crate::types::NodeType;

/// Wrap `node` in `ConvertToFloat` unless it already is a Float.
pub fn coerce_to_float(node: Node) -> Result<Node, CoreError> {
    match node.ty() {
        NodeType::Float => Ok(node),
        _ => Node::convert_to_float(node),
    }
}

/// Wrap `node` in `ConvertToString` unless it already is a String.
pub fn coerce_to_string(node: Node) -> Result<Node, CoreError> {
    match node.ty() {
        NodeType::String => Ok(node),
        _ => Node::convert_to_string(node),
    }
}

/// Build `lhs <operator> rhs` after reconciling the operand types.
///
/// `position` is the operator's offset in the formula.
pub fn binary(position: usize, operator: Token, lhs: Node, rhs: Node) -> Result<Node, CoreError> {
    let (lhs, rhs) = if operator.is_arithmetic() {
        (coerce_to_float(lhs)?, coerce_to_float(rhs)?)
    } else if operator.is_string_op() {
        (coerce_to_string(lhs)?, coerce_to_string(rhs)?)
    } else if operator.is_comparison() {
        comparison_operands(position, operator, lhs, rhs)?
    } else {
        (lhs, rhs)
    };
    Node::binary_op(position, operator, lhs, rhs)
}

/// Build a unary `+` / `-`, converting the operand to Float.
pub fn unary(position: usize, operator: Token, operand: Node) -> Result<Node, CoreError> {
    Node::unary_op(position, operator, coerce_to_float(operand)?)
}

fn comparison_operands(
    position: usize,
    operator: Token,
    lhs: Node,
    rhs: Node,
) -> Result<(Node, Node), CoreError> {
    match (lhs.ty(), rhs.ty()) {
        (left, right) if left == right => Ok((lhs, rhs)),
        (NodeType::Integer, NodeType::Float) => Ok((Node::convert_to_float(lhs)?, rhs)),
        (NodeType::Float, NodeType::Integer) => Ok((lhs, Node::convert_to_float(rhs)?)),
        (left, right) => Err(CoreError::semantic(
            position,
            format!("cannot apply '{operator}' to {left} and {right}"),
        )),
    }
}

/// Reconcile the default value of attribute `name` with the attribute type.
pub fn attribute_default(
    position: usize,
    name: &str,
    attribute_type: NodeType,
    default: Node,
) -> Result<Node, CoreError> {
    let default_type = default.ty();
    if default_type == attribute_type {
        return Ok(default);
    }
    match (attribute_type, default_type) {
        (NodeType::String, _) => Node::convert_to_string(default),
        (NodeType::Float, NodeType::Integer | NodeType::Boolean) => Node::convert_to_float(default),
        _ => Err(CoreError::semantic(
            position,
            format!(
                "default value of type {default_type} does not fit \
                 attribute '{name}' of type {attribute_type}"
            ),
        )),
    }
}

/// Build a call of `function`, asking its validator for the result type.
pub fn function_call(
    position: usize,
    function: Arc<dyn Function>,
    args: Vec<Node>,
) -> Result<Node, CoreError> {
    let arg_types: Vec<NodeType> = args.iter().map(Node::ty).collect();
    let Some(return_type) = function.validate_arg_types(&arg_types) else {
        let rendered: Vec<&str> = arg_types.iter().map(|ty| ty.name()).collect();
        return Err(CoreError::semantic(
            position,
            format!(
                "{} cannot be called with ({}). {}",
                function.name(),
                rendered.join(", "),
                function.usage()
            ),
        ));
    };
    Node::function_call(position, function, return_type, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::builtins::FunctionRegistry;

    fn attr(name: &str, ty: NodeType) -> Node {
        Node::identifier(0, name, None, ty).expect("identifier")
    }

    #[test]
    fn arithmetic_converts_non_float_operands() {
        let node = binary(
            3,
            Token::PLUS,
            attr("n", NodeType::Integer),
            Node::float_constant(5, 1.0),
        )
        .expect("sum");
        assert_eq!(node.ty(), NodeType::Float);
        assert!(matches!(node.left().map(Node::kind), Some(NodeKind::ConvertToFloat(_))));
        assert!(matches!(node.right().map(Node::kind), Some(NodeKind::FloatConstant(_))));
    }

    #[test]
    fn concatenation_converts_non_string_operands() {
        let node = binary(
            4,
            Token::AMPERSAND,
            Node::string_constant(0, "2"),
            attr("X", NodeType::Integer),
        )
        .expect("concat");
        assert_eq!(node.ty(), NodeType::String);
        assert!(matches!(node.right().map(Node::kind), Some(NodeKind::ConvertToString(_))));
    }

    #[test]
    fn comparison_widens_integer_against_float() {
        let node = binary(
            2,
            Token::LESS,
            Node::float_constant(0, 1.0),
            attr("n", NodeType::Integer),
        )
        .expect("comparison");
        assert_eq!(node.ty(), NodeType::Boolean);
        assert!(matches!(node.right().map(Node::kind), Some(NodeKind::ConvertToFloat(_))));

        let err = binary(
            2,
            Token::EQUAL,
            Node::string_constant(0, "a"),
            Node::float_constant(4, 1.0),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::SemanticError { position: 2, .. }));
    }

    #[test]
    fn unary_converts_operand() {
        let node = unary(0, Token::MINUS, attr("flag", NodeType::Boolean)).expect("negation");
        assert_eq!(node.ty(), NodeType::Float);
    }

    #[test]
    fn defaults_adapt_to_attribute_type() {
        let converted =
            attribute_default(0, "label", NodeType::String, Node::float_constant(7, 0.0))
                .expect("to string");
        assert_eq!(converted.ty(), NodeType::String);

        let err = attribute_default(0, "qty", NodeType::Integer, Node::float_constant(5, 0.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::SemanticError { .. }));
    }

    #[test]
    fn function_call_uses_validator_result() {
        let registry = FunctionRegistry::with_builtins();
        let cond = registry.lookup("IF").expect("IF").clone();
        let node = function_call(
            0,
            cond.clone(),
            vec![
                Node::boolean_constant(3, true),
                Node::string_constant(9, "a"),
                Node::string_constant(14, "b"),
            ],
        )
        .expect("call");
        assert_eq!(node.ty(), NodeType::String);

        let err = function_call(0, cond, vec![Node::boolean_constant(3, true)]).unwrap_err();
        assert!(matches!(err, CoreError::SemanticError { position: 0, .. }));
    }
}
