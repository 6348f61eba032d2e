//! Core of the Nyaa formula compiler.
//!
//! The pipeline is:
//!
//!   formula text
//!     -> lexer     (tokens, one-token pushback)
//!     -> parser    (typed tree, conversions inserted by typecheck)
//!     -> codegen   (flat program for the evaluation engine)
//!
//! Front ends (the CLI, embedding applications) should depend on this
//! crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod token;
pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layers: types, attribute schema, type reconciliation
// ---------------------------------------------------------------------

pub mod types;
pub mod schema;
pub mod typecheck;

// ---------------------------------------------------------------------
// Builtins and formula sources
// ---------------------------------------------------------------------

pub mod builtins;
pub mod sources;

// ---------------------------------------------------------------------
// Back-end: code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod instructions;
pub mod codegen;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use ast::{Node, NodeKind};
pub use builtins::{Function, FunctionRegistry};
pub use compiler::{CompilationArtifact, EmitFormat, Emitted, Stats, compile, emit};
pub use diagnostic::{Diagnostic, Severity};
pub use error::CoreError;
pub use instructions::{Code, CodeAndSourceLocation, Instruction, Program};
pub use lexer::{Scanner, tokenize};
pub use schema::{AttributeSchema, AttributeTable};
pub use span::SourceLocation;
pub use types::NodeType;
