//! Lowering of typed trees into engine code.
//!
//! Emission order is part of the engine contract: binary operators emit
//! the right operand before the left one, calls emit their arguments in
//! reverse, and attribute references emit the default value before the
//! attribute name.

use crate::ast::{Node, NodeKind};
use crate::error::CoreError;
use crate::instructions::{Code, Instruction, Program};
use crate::span::SourceLocation;
use crate::token::{Token, TokenKind};
use crate::types::NodeType;

/// Generate the complete program for the formula rooted at `root`.
pub fn generate(root: &Node) -> Result<Program, CoreError> {
    let mut program = Program::new();
    root.generate(&mut program)?;
    Ok(program)
}

impl Node {
    /// Append the code for this subtree to `program`.
    pub fn generate(&self, program: &mut Program) -> Result<(), CoreError> {
        let location = self.source_location();
        match self.kind() {
            NodeKind::BinaryOp { operator, lhs, rhs } => {
                rhs.generate(program)?;
                lhs.generate(program)?;
                let instruction = binary_instruction(*operator, lhs.ty(), location)?;
                program.push(Code::Op(instruction), location);
            }
            NodeKind::UnaryOp { operator, operand } => {
                operand.generate(program)?;
                let instruction = match operator.kind() {
                    TokenKind::Plus => Instruction::FUPLUS,
                    TokenKind::Minus => Instruction::FUMINUS,
                    _ => {
                        return Err(CoreError::Internal(format!(
                            "{location}: invalid unary operation '{operator}'"
                        )));
                    }
                };
                program.push(Code::Op(instruction), location);
            }
            NodeKind::BooleanConstant(value) => program.push(Code::PushBoolean(*value), location),
            NodeKind::FloatConstant(value) => program.push(Code::PushFloat(*value), location),
            NodeKind::StringConstant(value) => {
                program.push(Code::PushString(value.clone()), location)
            }
            NodeKind::Identifier { name, default } => {
                if let Some(default) = default {
                    default.generate(program)?;
                }
                program.push(Code::AttributeName(name.clone()), location);
                let instruction = if default.is_some() {
                    Instruction::AREF2
                } else {
                    Instruction::AREF
                };
                program.push(Code::Op(instruction), location);
            }
            NodeKind::FunctionCall { function, args } => {
                for arg in args.iter().rev() {
                    arg.generate(program)?;
                }
                program.push(Code::ArgCount(args.len()), location);
                program.push(Code::Function(function.name().to_string()), location);
                program.push(Code::Op(Instruction::CALL), location);
            }
            NodeKind::ConvertToString(convertee) => {
                convertee.generate(program)?;
                let instruction = match convertee.ty() {
                    NodeType::Float => Instruction::SCONVF,
                    NodeType::Integer => Instruction::SCONVI,
                    NodeType::Boolean => Instruction::SCONVB,
                    NodeType::String => {
                        return Err(CoreError::Internal(
                            "string conversion of a STRING operand".to_string(),
                        ));
                    }
                };
                program.push(Code::Op(instruction), location);
            }
            NodeKind::ConvertToFloat(convertee) => {
                convertee.generate(program)?;
                let instruction = match convertee.ty() {
                    NodeType::Integer => Instruction::FCONVI,
                    NodeType::Boolean => Instruction::FCONVB,
                    NodeType::String => Instruction::FCONVS,
                    NodeType::Float => {
                        return Err(CoreError::Internal(
                            "float conversion of a FLOAT operand".to_string(),
                        ));
                    }
                };
                program.push(Code::Op(instruction), location);
            }
        }
        Ok(())
    }
}

/// Pick the opcode for a binary operator.
///
/// Arithmetic always uses the float opcodes; comparisons dispatch on the
/// operand type, read from the left operand only. That is sound only
/// because [`Node::binary_op`] rejects operands of different types.
fn binary_instruction(
    operator: Token,
    operand_type: NodeType,
    location: SourceLocation,
) -> Result<Instruction, CoreError> {
    use Instruction::*;

    let by_type = |float, string, boolean, integer| match operand_type {
        NodeType::Float => float,
        NodeType::String => string,
        NodeType::Boolean => boolean,
        NodeType::Integer => integer,
    };

    let instruction = match operator.kind() {
        TokenKind::Caret => FPOW,
        TokenKind::Plus => FADD,
        TokenKind::Minus => FSUB,
        TokenKind::Slash => FDIV,
        TokenKind::Star => FMUL,
        TokenKind::Ampersand => SCONCAT,
        TokenKind::Equal => by_type(BEQLF, BEQLS, BEQLB, BEQLI),
        TokenKind::NotEqual => by_type(BNEQLF, BNEQLS, BNEQLB, BNEQLI),
        TokenKind::Greater => by_type(BGTF, BGTS, BGTB, BGTI),
        TokenKind::Less => by_type(BLTF, BLTS, BLTB, BLTI),
        TokenKind::GreaterOrEqual => by_type(BGTEF, BGTES, BGTEB, BGTEI),
        TokenKind::LessOrEqual => by_type(BLTEF, BLTES, BLTEB, BLTEI),
        _ => {
            return Err(CoreError::Internal(format!(
                "{location}: unknown operator '{operator}'"
            )));
        }
    };
    Ok(instruction)
}
