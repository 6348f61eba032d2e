//! Function-call boundary and the built-in function table.
//!
//! The compiler never invokes functions. What it needs from a function
//! is its name (emitted as the `CALL` operand) and a validator that maps
//! the static types of the actual arguments to the call's result type.
//! Invocation is the evaluation engine's business.

use std::fmt;
use std::sync::Arc;

use crate::types::NodeType;

/// A callable function as seen by the compiler.
pub trait Function: fmt::Debug + Send + Sync {
    /// Name used in formulas; matched case-insensitively.
    fn name(&self) -> &str;

    /// Informal description, e.g. "Calculates the natural logarithm of its argument."
    fn summary(&self) -> &str;

    /// How to call the function, e.g. "Call with LN(number)."
    fn usage(&self) -> &str;

    /// Declared return type. `None` means the result type depends on the
    /// argument types and is only known after [`Function::validate_arg_types`].
    fn return_type(&self) -> Option<NodeType>;

    /// Result type for a call with these argument types, or `None` on an
    /// arity or type mismatch.
    fn validate_arg_types(&self, arg_types: &[NodeType]) -> Option<NodeType>;
}

/// Metadata and signature check for a single builtin.
#[derive(Clone)]
pub struct BuiltinDescriptor {
    pub name: &'static str,
    pub summary: &'static str,
    pub usage: &'static str,
    pub return_type: Option<NodeType>,
    validate: fn(&[NodeType]) -> Option<NodeType>,
}

impl fmt::Debug for BuiltinDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinDescriptor")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .finish()
    }
}

impl Function for BuiltinDescriptor {
    fn name(&self) -> &str {
        self.name
    }

    fn summary(&self) -> &str {
        self.summary
    }

    fn usage(&self) -> &str {
        self.usage
    }

    fn return_type(&self) -> Option<NodeType> {
        self.return_type
    }

    fn validate_arg_types(&self, arg_types: &[NodeType]) -> Option<NodeType> {
        (self.validate)(arg_types)
    }
}

fn numeric_to_float(args: &[NodeType]) -> Option<NodeType> {
    match args {
        [arg] if arg.is_numeric() => Some(NodeType::Float),
        _ => None,
    }
}

fn numeric_to_integer(args: &[NodeType]) -> Option<NodeType> {
    match args {
        [arg] if arg.is_numeric() => Some(NodeType::Integer),
        _ => None,
    }
}

fn string_to_integer(args: &[NodeType]) -> Option<NodeType> {
    match args {
        [NodeType::String] => Some(NodeType::Integer),
        _ => None,
    }
}

fn string_to_string(args: &[NodeType]) -> Option<NodeType> {
    match args {
        [NodeType::String] => Some(NodeType::String),
        _ => None,
    }
}

fn substring(args: &[NodeType]) -> Option<NodeType> {
    match args {
        [NodeType::String, start, length] if start.is_numeric() && length.is_numeric() => {
            Some(NodeType::String)
        }
        _ => None,
    }
}

fn numeric_fold(args: &[NodeType]) -> Option<NodeType> {
    if !args.is_empty() && args.iter().all(|arg| arg.is_numeric()) {
        Some(NodeType::Float)
    } else {
        None
    }
}

fn conditional(args: &[NodeType]) -> Option<NodeType> {
    match args {
        [NodeType::Boolean, then, otherwise] if then == otherwise => Some(*then),
        _ => None,
    }
}

fn any_to_boolean(args: &[NodeType]) -> Option<NodeType> {
    match args {
        [_] => Some(NodeType::Boolean),
        _ => None,
    }
}

/// The builtins every default registry starts with.
pub const BUILTINS: &[BuiltinDescriptor] = &[
    BuiltinDescriptor {
        name: "ABS",
        summary: "Calculates the absolute value of its argument.",
        usage: "Call with ABS(number).",
        return_type: Some(NodeType::Float),
        validate: numeric_to_float,
    },
    BuiltinDescriptor {
        name: "LN",
        summary: "Calculates the natural logarithm of its argument.",
        usage: "Call with LN(number).",
        return_type: Some(NodeType::Float),
        validate: numeric_to_float,
    },
    BuiltinDescriptor {
        name: "EXP",
        summary: "Raises e to the power of its argument.",
        usage: "Call with EXP(number).",
        return_type: Some(NodeType::Float),
        validate: numeric_to_float,
    },
    BuiltinDescriptor {
        name: "SQRT",
        summary: "Calculates the square root of its argument.",
        usage: "Call with SQRT(number).",
        return_type: Some(NodeType::Float),
        validate: numeric_to_float,
    },
    BuiltinDescriptor {
        name: "ROUND",
        summary: "Rounds its argument to the nearest integer.",
        usage: "Call with ROUND(number).",
        return_type: Some(NodeType::Integer),
        validate: numeric_to_integer,
    },
    BuiltinDescriptor {
        name: "LEN",
        summary: "Returns the number of characters in a string.",
        usage: "Call with LEN(string).",
        return_type: Some(NodeType::Integer),
        validate: string_to_integer,
    },
    BuiltinDescriptor {
        name: "UPPER",
        summary: "Converts a string to upper case.",
        usage: "Call with UPPER(string).",
        return_type: Some(NodeType::String),
        validate: string_to_string,
    },
    BuiltinDescriptor {
        name: "LOWER",
        summary: "Converts a string to lower case.",
        usage: "Call with LOWER(string).",
        return_type: Some(NodeType::String),
        validate: string_to_string,
    },
    BuiltinDescriptor {
        name: "SUBSTR",
        summary: "Extracts part of a string.",
        usage: "Call with SUBSTR(string, start, length).",
        return_type: Some(NodeType::String),
        validate: substring,
    },
    BuiltinDescriptor {
        name: "MIN",
        summary: "Returns the smallest of its arguments.",
        usage: "Call with MIN(number, ...).",
        return_type: Some(NodeType::Float),
        validate: numeric_fold,
    },
    BuiltinDescriptor {
        name: "MAX",
        summary: "Returns the largest of its arguments.",
        usage: "Call with MAX(number, ...).",
        return_type: Some(NodeType::Float),
        validate: numeric_fold,
    },
    BuiltinDescriptor {
        name: "IF",
        summary: "Picks one of two values depending on a condition.",
        usage: "Call with IF(condition, value_if_true, value_if_false).",
        return_type: None,
        validate: conditional,
    },
    BuiltinDescriptor {
        name: "ISNUMBER",
        summary: "Tests whether its argument can be read as a number.",
        usage: "Call with ISNUMBER(value).",
        return_type: Some(NodeType::Boolean),
        validate: any_to_boolean,
    },
];

/// The set of functions a formula may call.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<Arc<dyn Function>>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        FunctionRegistry::default()
    }

    /// A registry holding every entry of [`BUILTINS`].
    pub fn with_builtins() -> Self {
        let mut registry = FunctionRegistry::new();
        for builtin in BUILTINS {
            registry.register(Arc::new(builtin.clone()));
        }
        registry
    }

    /// Adds `function`, replacing any function of the same name.
    pub fn register(&mut self, function: Arc<dyn Function>) {
        self.functions
            .retain(|existing| !existing.name().eq_ignore_ascii_case(function.name()));
        self.functions.push(function);
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions
            .iter()
            .find(|function| function.name().eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Function>> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
