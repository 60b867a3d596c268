//! Public API for binding expressions.
//!
//! - [`Expression`]: one parsed, size-checked expression.
//! - [`MacroTable`] / [`Macro`]: named expressions callable from others,
//!   each compiled against the macros registered before it.
//! - [`BindEvaluator`]: the stateful orchestrator that owns bindings,
//!   macros and the expression cache, and runs evaluation passes.
//!
//! # Example
//!
//! ```ignore
//! use tether_core::api::{BindEvaluator, Binding, EngineOptions, MacroDefinition};
//!
//! let mut evaluator = BindEvaluator::new(EngineOptions::default());
//! evaluator.add_macros(&[MacroDefinition::new("add", ["a", "b"], "a + b")]);
//! evaluator.add_bindings([Binding::new("P", "text", "add(x, 2)")]);
//!
//! let scope = serde_json::from_str(r#"{"x": 2}"#)?;
//! let pass = evaluator.evaluate_bindings(&scope);
//! assert_eq!(pass.results["add(x, 2)"].to_string(), "4");
//! ```

pub mod engine;
pub mod error;
pub mod expression;
pub mod macros;
pub mod options;


pub use engine::{BindEvaluator, Binding, EvaluationResults, ExpressionResult};
pub use error::{Diagnostic, Error, ErrorRecord, Severity};
pub use expression::Expression;
pub use macros::{Macro, MacroDefinition, MacroTable};
pub use options::{CompileOptions, EngineOptions, Mode};
