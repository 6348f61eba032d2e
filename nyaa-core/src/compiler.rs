//! Compiler orchestration: formula text in, engine program out.

use std::fmt;
use std::str::FromStr;

use crate::ast::Node;
use crate::builtins::FunctionRegistry;
use crate::codegen;
use crate::error::CoreError;
use crate::instructions::Program;
use crate::lexer::tokenize;
use crate::parser::Parser;
use crate::schema::AttributeSchema;

#[derive(Debug, Clone)]
pub struct CompilationArtifact {
    pub tree: Node,
    pub program: Program,
    /// Tokens the parser scanned, including the end-of-source token.
    pub token_count: usize,
}

/// Parse and generate code for `source`.
pub fn compile(
    source: &str,
    schema: &dyn AttributeSchema,
    functions: &FunctionRegistry,
) -> Result<CompilationArtifact, CoreError> {
    let mut parser = Parser::new(source, schema, functions);
    let tree = parser.parse_formula()?;
    let program = codegen::generate(&tree)?;
    Ok(CompilationArtifact {
        tree,
        program,
        token_count: parser.token_count(),
    })
}

/// What a front end prints for a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitFormat {
    #[default]
    Code,
    Tree,
    Tokens,
}

impl FromStr for EmitFormat {
    type Err = CoreError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "code" => Ok(EmitFormat::Code),
            "tree" => Ok(EmitFormat::Tree),
            "tokens" => Ok(EmitFormat::Tokens),
            other => Err(CoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Size of what the stages produced for one formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub tokens: usize,
    /// `None` when the formula was only scanned.
    pub instructions: Option<usize>,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tokens", self.tokens)?;
        match self.instructions {
            Some(count) => write!(f, ", {count} instructions"),
            None => f.write_str(", not compiled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub text: String,
    pub stats: Stats,
}

/// Render `source` in the requested `format`.
///
/// `tokens` only scans, so it succeeds for formulas that fail to parse.
pub fn emit(
    source: &str,
    format: EmitFormat,
    schema: &dyn AttributeSchema,
    functions: &FunctionRegistry,
) -> Result<Emitted, CoreError> {
    if format == EmitFormat::Tokens {
        let tokens = tokenize(source)?;
        return Ok(Emitted {
            text: tokens.iter().map(|token| format!("{token}\n")).collect(),
            stats: Stats {
                tokens: tokens.len(),
                instructions: None,
            },
        });
    }

    let artifact = compile(source, schema, functions)?;
    let text = match format {
        EmitFormat::Tree => artifact.tree.to_string(),
        _ => artifact.program.to_string(),
    };
    Ok(Emitted {
        text,
        stats: Stats {
            tokens: artifact.token_count,
            instructions: Some(artifact.program.len()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::{Code, Instruction};
    use crate::schema::AttributeTable;
    use crate::span::SourceLocation;
    use crate::types::NodeType;

    fn schema() -> AttributeTable {
        AttributeTable::new()
            .with("X", NodeType::Integer)
            .with("price", NodeType::Float)
            .with("label", NodeType::String)
    }

    fn codes(source: &str) -> Vec<Code> {
        let artifact = compile(source, &schema(), &FunctionRegistry::with_builtins())
            .expect("formula should compile");
        artifact
            .program
            .iter()
            .map(|element| element.code.clone())
            .collect()
    }

    #[test]
    fn compiles_sum_right_operand_first() {
        assert_eq!(
            codes("2+3"),
            vec![
                Code::PushFloat(3.0),
                Code::PushFloat(2.0),
                Code::Op(Instruction::FADD),
            ]
        );
    }

    #[test]
    fn compiles_concatenation_with_integer_attribute() {
        let artifact = compile("\"2\" & X", &schema(), &FunctionRegistry::with_builtins())
            .expect("compile");
        let program: Vec<_> = artifact
            .program
            .iter()
            .map(|element| (element.code.clone(), element.location))
            .collect();
        assert_eq!(
            program,
            vec![
                (Code::AttributeName("X".to_string()), SourceLocation::At(6)),
                (Code::Op(Instruction::AREF), SourceLocation::At(6)),
                (Code::Op(Instruction::SCONVI), SourceLocation::Synthetic),
                (Code::PushString("2".to_string()), SourceLocation::At(0)),
                (Code::Op(Instruction::SCONCAT), SourceLocation::At(4)),
            ]
        );
        assert_eq!(artifact.tree.ty(), NodeType::String);
    }

    #[test]
    fn compiles_calls_with_reversed_arguments() {
        assert_eq!(
            codes("MAX(price, 1)"),
            vec![
                Code::PushFloat(1.0),
                Code::AttributeName("price".to_string()),
                Code::Op(Instruction::AREF),
                Code::ArgCount(2),
                Code::Function("MAX".to_string()),
                Code::Op(Instruction::CALL),
            ]
        );
    }

    #[test]
    fn compiles_defaults_before_attribute() {
        assert_eq!(
            codes("{label:\"none\"} & \"!\""),
            vec![
                Code::PushString("!".to_string()),
                Code::PushString("none".to_string()),
                Code::AttributeName("label".to_string()),
                Code::Op(Instruction::AREF2),
                Code::Op(Instruction::SCONCAT),
            ]
        );
    }

    #[test]
    fn compiles_mixed_comparison_with_float_opcode() {
        let program = codes("X >= price");
        assert_eq!(program.last(), Some(&Code::Op(Instruction::BGTEF)));
        assert!(program.contains(&Code::Op(Instruction::FCONVI)));
    }

    #[test]
    fn artifact_counts_the_tokens_tokenize_sees() {
        let registry = FunctionRegistry::with_builtins();
        for source in ["2+3", "IF({X} > 1, \"a\", label)", "-(price ^ 2)"] {
            let artifact = compile(source, &schema(), &registry).expect("compile");
            let tokens = tokenize(source).expect("tokenize");
            assert_eq!(artifact.token_count, tokens.len(), "{source}");
        }
    }

    #[test]
    fn reports_errors_from_each_stage() {
        let registry = FunctionRegistry::with_builtins();
        assert!(matches!(
            compile("1 # 2", &schema(), &registry),
            Err(CoreError::LexError { position: 2, .. })
        ));
        assert!(matches!(
            compile("(1", &schema(), &registry),
            Err(CoreError::ParseError { .. })
        ));
        assert!(matches!(
            compile("nope", &schema(), &registry),
            Err(CoreError::SemanticError { .. })
        ));
        assert!(matches!(
            compile("ABS(1)", &schema(), &FunctionRegistry::new()),
            Err(CoreError::SemanticError { .. })
        ));
    }

    #[test]
    fn parses_emit_formats() {
        assert_eq!("tree".parse::<EmitFormat>().expect("tree"), EmitFormat::Tree);
        assert!(matches!(
            "wasm".parse::<EmitFormat>(),
            Err(CoreError::UnsupportedFormat(name)) if name == "wasm"
        ));
    }

    #[test]
    fn emits_tokens_without_parsing() {
        let text = emit(
            "1 +",
            EmitFormat::Tokens,
            &schema(),
            &FunctionRegistry::with_builtins(),
        )
        .expect("tokens");
        assert_eq!(text.text.lines().count(), 3);
        assert!(text.text.lines().last().is_some_and(|line| line.contains("EndOfSource")));
        assert_eq!(text.stats.to_string(), "3 tokens, not compiled");
    }

    #[test]
    fn emits_listing_and_tree() {
        let registry = FunctionRegistry::with_builtins();
        let listing = emit("2+3", EmitFormat::Code, &schema(), &registry).expect("code");
        assert_eq!(listing.text.lines().count(), 3);
        assert!(listing.text.contains("FADD"));
        assert_eq!(listing.stats.to_string(), "4 tokens, 3 instructions");

        let tree = emit("2+3", EmitFormat::Tree, &schema(), &registry).expect("tree");
        assert!(tree.text.starts_with("BinaryOp '+' : FLOAT @1"));
    }
}
