//! Tree-walking AST evaluator for binding expressions.
//!
//! The evaluator interprets parsed AST nodes against a [`Scope`] and produces
//! runtime [`Value`]s.
//!
//! ## Design Principles
//!
//! - **Never panic**: every adversarial input surfaces as an [`EvalError`]
//! - **Stack-safe**: depth tracking bounds recursion for deeply nested input
//! - **Sandboxed**: only allowlisted functions and registered macros can be
//!   called, and nothing reachable from the scope is ever mutated
//!
//! ## Example
//!
//! ```ignore
//! use tether_core::{parser, evaluator, scope::Scope};
//!
//! let ast = parser::parse("[1, 2, 3].map(x => x * 2)").unwrap();
//! let result = evaluator::eval(&ast, &Scope::new()).unwrap();
//! assert_eq!(result.to_string(), "[2,4,6]");
//! ```

mod error;
mod eval;
mod lambda;
mod operators;


pub use error::EvalError;
pub use eval::Evaluator;

use crate::{
    api::MacroTable,
    ast::AstNode,
    scope::{Scope, ScopeStack},
    stdlib::FUNCTIONS,
    values::Value,
};

/// Default maximum evaluation depth.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Evaluate a parsed expression with the full allowlist, no macros and the
/// default depth limit.
pub fn eval(ast: &AstNode, scope: &Scope) -> Result<Value, EvalError> {
    eval_with_limits(ast, scope, DEFAULT_MAX_DEPTH)
}

/// Evaluate a parsed expression with a custom depth limit.
pub fn eval_with_limits(ast: &AstNode, scope: &Scope, max_depth: usize) -> Result<Value, EvalError> {
    let macros = MacroTable::default();
    Evaluator::new(&FUNCTIONS, &macros)
        .with_max_depth(max_depth)
        .eval(ast, &ScopeStack::new(scope.clone()))
}
