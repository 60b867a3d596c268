//! The AST node model produced by the parser.
//!
//! Nodes are plain data: a closed [`AstNodeType`] tag, positional children in
//! `args`, and an optional literal `value` (literal payloads, variable names,
//! member names and invocation targets). Children are consumed positionally
//! according to the node type, e.g. `args[0]` and `args[1]` for binary
//! operators.

use core::fmt;
use ecow::EcoString;

/// The closed set of node types understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstNodeType {
    /// Root wrapper around the whole expression: `[expr]`.
    Expression,
    /// Function or method call: `[args]` or `[caller, args]`, name in `value`.
    Invocation,
    /// Argument list: `[]` or `[array]`.
    Args,
    /// `target.member` / `target[member]`: `[target, member]`.
    MemberAccess,
    /// Dot member (name in `value`, no args) or bracket member (`[expr]`).
    Member,
    /// Variable reference, name in `value`.
    Variable,
    /// Literal, payload in `value`.
    Literal,
    /// `[...]`: `[]` or `[array]`.
    ArrayLiteral,
    /// Ordered elements of an array literal or argument list.
    Array,
    /// `{...}`: `[]` or `[object]`.
    ObjectLiteral,
    /// Ordered key-value pairs of an object literal.
    Object,
    /// `[key, value]`.
    KeyValue,
    Not,
    UnaryMinus,
    UnaryPlus,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    LogicalAnd,
    LogicalOr,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
    /// `[condition, then, otherwise]`.
    Ternary,
    /// `[params, body]` where `params` is an `Array` of `Variable` nodes.
    ArrowFunction,
}

impl AstNodeType {
    /// Returns true for the two-operand operators.
    pub fn is_binary(self) -> bool {
        use AstNodeType::*;
        matches!(
            self,
            Plus | Minus
                | Multiply
                | Divide
                | Modulo
                | LogicalAnd
                | LogicalOr
                | Less
                | LessOrEqual
                | Greater
                | GreaterOrEqual
                | Equal
                | NotEqual
        )
    }
}

impl fmt::Display for AstNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Literal payload stored on a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(EcoString),
}

impl Literal {
    /// The payload as a string, for names carried on variable, member and
    /// invocation nodes.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// A single node of a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: AstNodeType,
    pub args: Vec<AstNode>,
    pub value: Option<Literal>,
}

impl AstNode {
    pub fn new(kind: AstNodeType, args: Vec<AstNode>) -> Self {
        Self {
            kind,
            args,
            value: None,
        }
    }

    pub fn with_value(kind: AstNodeType, args: Vec<AstNode>, value: Literal) -> Self {
        Self {
            kind,
            args,
            value: Some(value),
        }
    }

    pub fn literal(value: Literal) -> Self {
        Self::with_value(AstNodeType::Literal, Vec::new(), value)
    }

    /// A node whose `value` is a name (variables, dot members, invocations).
    pub fn named(kind: AstNodeType, args: Vec<AstNode>, name: &str) -> Self {
        Self::with_value(kind, args, Literal::String(name.into()))
    }

    /// The name carried in `value`, if any.
    pub fn name(&self) -> Option<&str> {
        self.value.as_ref().and_then(Literal::as_str)
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        let mut size = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            size += 1;
            pending.extend(&node.args);
        }
        size
    }
}
