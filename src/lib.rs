//! Tether - sandboxed evaluation of declarative binding expressions
//!
//! # Overview
//!
//! A document declares bindings: an attribute of some target element is tied
//! to a small JavaScript-like expression. Tether parses those expressions,
//! evaluates them against a JSON-shaped scope and checks every result before
//! it is handed back, so untrusted page state can never produce an unsafe
//! attribute value.
//!
//! - No assignment, no globals, no host access: only allowlisted functions
//!   and registered macros can be called.
//! - Expressions are size-limited after macro expansion.
//! - URL-bearing attributes only accept allowed protocols, and a few
//!   attributes carry denylists.
//!
//! # Quick Start
//!
//! ```ignore
//! use tether::{BindEvaluator, Binding, EngineOptions, MacroDefinition, Scope};
//!
//! let mut evaluator = BindEvaluator::new(EngineOptions::default());
//! evaluator.add_macros(&[MacroDefinition::new("add", ["a", "b"], "a + b")]);
//! evaluator.add_bindings([
//!     Binding::new("P", "text", "add(count, 1)"),
//!     Binding::new("A", "href", "url"),
//! ]);
//!
//! let scope: Scope = serde_json::from_str(r#"{"count": 1, "url": "javascript:alert(1)"}"#)?;
//! let pass = evaluator.evaluate_bindings(&scope);
//! assert_eq!(pass.results["add(count, 1)"], 2.into());
//! assert!(pass.errors.contains_key("url"));
//! ```
//!
//! # One-off Evaluation
//!
//! [`BindEvaluator::evaluate_expression`] compiles, caches and evaluates a
//! single expression without registering a binding. Its result is not
//! validated.

// Re-export public API from tether_core
pub use tether_core::api::{
    BindEvaluator, Binding, CompileOptions, Diagnostic, EngineOptions, Error, ErrorRecord,
    EvaluationResults, Expression, ExpressionResult, Macro, MacroDefinition, MacroTable, Mode,
    Severity,
};

// Re-export commonly used types and values
pub use tether_core::scope::Scope;
pub use tether_core::validator::Validator;
pub use tether_core::values::{self, Object, Value};

// Re-export errors
pub use tether_core::evaluator::EvalError;
pub use tether_core::parser::ParseError;

mod error_renderer;
pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
