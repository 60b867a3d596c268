//! Runtime evaluation errors.
//!
//! Every failure inside an expression surfaces as one of these. They never
//! escape the binding evaluator as panics: each error is attached to the
//! expression string that produced it and the pass carries on.

use thiserror::Error;

use crate::ast::AstNodeType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The callee is neither a registered macro nor on the allowlist for its
    /// receiver.
    #[error("{name} is not a supported function.")]
    UnsupportedFunction { name: String },

    /// An argument's type is not accepted by the callee (e.g. a plain object
    /// passed to a function that does not take objects).
    #[error("Unexpected argument type in {name}().")]
    UnexpectedArgumentType { name: String },

    /// The argument list did not evaluate to an array.
    #[error("Unexpected non-array arguments in {name}().")]
    NonArrayArguments { name: String },

    /// An arrow function appeared somewhere other than a function argument.
    #[error("Arrow functions are only allowed as function arguments.")]
    ArrowFunctionNotAllowed,

    /// A callback-taking method received no arrow function.
    #[error("{name}() expects a function argument.")]
    ExpectedCallback { name: String },

    #[error("Reduce of empty array with no initial value.")]
    ReduceOfEmptyArray,

    #[error("{name}() argument must be between {min} and {max}.")]
    OutOfRange { name: String, min: u32, max: u32 },

    /// A node type the evaluator does not accept at this position.
    #[error("Unexpected AST node type: {kind}.")]
    UnexpectedNode { kind: AstNodeType },

    /// A node is missing children or payload its type requires.
    #[error("Malformed {kind} node.")]
    MalformedNode { kind: AstNodeType },

    #[error("Evaluation depth exceeded maximum of {max_depth}.")]
    StackOverflow { max_depth: usize },
}

impl EvalError {
    pub fn unsupported(name: impl Into<String>) -> Self {
        EvalError::UnsupportedFunction { name: name.into() }
    }

    pub fn argument_type(name: impl Into<String>) -> Self {
        EvalError::UnexpectedArgumentType { name: name.into() }
    }
}
