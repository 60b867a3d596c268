//! Sandboxed evaluation of declarative binding expressions.
//!
//! Expressions are parsed into a small AST, checked against a size ceiling
//! and interpreted against a JSON-shaped scope. Only allowlisted functions
//! and registered macros can be called, and every result bound to a
//! sensitive attribute is checked by the [`validator`] before it leaves the
//! engine.

extern crate alloc;

pub mod api;
pub mod ast;
pub mod evaluator;
pub mod parser;
pub mod scope;
pub mod stdlib;
pub mod validator;
pub mod values;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_macro_expansion() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
