//! Instruction set shared with the evaluation engine.
//!
//! The declaration order of [`Instruction`] is the engine's opcode
//! numbering and must not be rearranged.

use std::fmt;

use crate::span::SourceLocation;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Instruction {
    FADD,    // addition of two floating-point numbers
    FSUB,    // subtraction of two floating-point numbers
    FMUL,    // multiplication of two floating-point numbers
    FDIV,    // division of two floating-point numbers
    FPOW,    // exponentiation of two floating-point numbers
    SCONCAT, // string concatenation
    BEQLF,   // equality test for two floating-point numbers
    BNEQLF,  // inequality test for two floating-point numbers
    BGTF,    // greater-than test for two floating-point numbers
    BLTF,    // less-than test for two floating-point numbers
    BGTEF,   // greater-than-or-equal test for two floating-point numbers
    BLTEF,   // less-than-or-equal test for two floating-point numbers
    BEQLS,   // equality test for strings
    BNEQLS,  // inequality test for strings
    BGTS,    // lexicographic greater-than test for strings
    BLTS,    // lexicographic less-than test for strings
    BGTES,   // lexicographic greater-than-or-equal test for strings
    BLTES,   // lexicographic less-than-or-equal test for strings
    BGTB,    // greater-than test for booleans
    BLTB,    // less-than test for booleans
    BGTEB,   // greater-than-or-equal test for booleans
    BLTEB,   // less-than-or-equal test for booleans
    BEQLB,   // equality test for booleans
    BNEQLB,  // inequality test for booleans
    BEQLI,   // equality test for integers
    BNEQLI,  // inequality test for integers
    BGTI,    // greater-than test for integers
    BLTI,    // less-than test for integers
    BGTEI,   // greater-than-or-equal test for integers
    BLTEI,   // less-than-or-equal test for integers
    CALL,    // function call
    FUMINUS, // unary minus for a floating-point number
    FUPLUS,  // unary plus for a floating-point number
    AREF,    // attribute reference
    AREF2,   // attribute reference with a default value
    FCONVI,  // integer to floating point
    FCONVB,  // boolean to floating point
    FCONVS,  // string to floating point
    SCONVF,  // floating point to string
    SCONVI,  // integer to string
    SCONVB,  // boolean to string
}

impl Instruction {
    /// Numeric opcode as understood by the engine.
    pub fn opcode(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One item of emitted code: an instruction or an operand for one.
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    Op(Instruction),
    PushFloat(f64),
    PushString(String),
    PushBoolean(bool),
    /// Number of arguments preceding a `CALL`.
    ArgCount(usize),
    /// Name of the function a `CALL` invokes.
    Function(String),
    /// Name of the attribute an `AREF` / `AREF2` looks up.
    AttributeName(String),
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Op(instruction) => write!(f, "{instruction}"),
            Code::PushFloat(value) => write!(f, "PUSH {value}"),
            Code::PushString(value) => write!(f, "PUSH {value:?}"),
            Code::PushBoolean(value) => write!(f, "PUSH {}", if *value { "TRUE" } else { "FALSE" }),
            Code::ArgCount(count) => write!(f, "ARGC {count}"),
            Code::Function(name) => write!(f, "FUNC {name}"),
            Code::AttributeName(name) => write!(f, "ATTR {name:?}"),
        }
    }
}

/// A code item tagged with the source location that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeAndSourceLocation {
    pub code: Code,
    pub location: SourceLocation,
}

impl CodeAndSourceLocation {
    pub fn new(code: Code, location: SourceLocation) -> Self {
        CodeAndSourceLocation { code, location }
    }
}

/// The flat instruction sequence for one formula.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    code: Vec<CodeAndSourceLocation>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn push(&mut self, code: Code, location: SourceLocation) {
        self.code.push(CodeAndSourceLocation::new(code, location));
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CodeAndSourceLocation> {
        self.code.iter()
    }

    /// The code items without their locations, in emission order.
    pub fn codes(&self) -> Vec<&Code> {
        self.code.iter().map(|element| &element.code).collect()
    }

    pub fn into_vec(self) -> Vec<CodeAndSourceLocation> {
        self.code
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a CodeAndSourceLocation;
    type IntoIter = std::slice::Iter<'a, CodeAndSourceLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.code.iter()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, element) in self.code.iter().enumerate() {
            writeln!(f, "{index:04}  {:<24} {}", element.code.to_string(), element.location)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_follow_engine_numbering() {
        assert_eq!(Instruction::FADD.opcode(), 0);
        assert_eq!(Instruction::SCONCAT.opcode(), 5);
        assert_eq!(Instruction::BEQLI.opcode(), 24);
        assert_eq!(Instruction::CALL.opcode(), 30);
        assert_eq!(Instruction::SCONVB.opcode(), 40);
    }

    #[test]
    fn renders_listing() {
        let mut program = Program::new();
        program.push(Code::PushFloat(3.0), SourceLocation::At(4));
        program.push(Code::Op(Instruction::FCONVI), SourceLocation::Synthetic);
        let listing = program.to_string();
        assert!(listing.contains("0000  PUSH 3"));
        assert!(listing.lines().nth(1).is_some_and(|line| line.ends_with("@-")));
    }
}
