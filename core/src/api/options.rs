//! Configuration options for the binding engine.

use serde::{Deserialize, Serialize};

/// Build mode of the host document. Only development builds may exceed the
/// expression size ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Production,
    Development,
    Test,
}

/// Configuration options for compiling expressions and macros.
///
/// # Example
///
/// ```
/// use tether_core::api::{CompileOptions, Mode};
///
/// let options = CompileOptions {
///     max_ast_size: 100,
///     ..CompileOptions::default()
/// };
/// assert_eq!(options.mode, Mode::Production);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Maximum number of AST nodes in one expression, counting macro
    /// invocations by the size of the macro they call.
    ///
    /// Default: 250
    pub max_ast_size: usize,

    /// Maximum bracket nesting accepted by the parser.
    ///
    /// Default: 100
    pub max_depth: usize,

    pub mode: Mode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_ast_size: 250,
            max_depth: crate::parser::DEFAULT_MAX_DEPTH,
            mode: Mode::Production,
        }
    }
}

impl CompileOptions {
    /// Whether the size ceiling applies.
    pub fn enforces_size_limit(&self) -> bool {
        self.mode != Mode::Development
    }

    /// The size no expression may exceed: `max_ast_size`, or only
    /// [`MAX_NODES`](crate::parser::MAX_NODES) in development mode.
    pub fn size_limit(&self) -> usize {
        if self.enforces_size_limit() {
            self.max_ast_size.min(crate::parser::MAX_NODES)
        } else {
            crate::parser::MAX_NODES
        }
    }
}

/// Configuration options for the binding evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Options used for every binding, macro and one-off expression.
    pub compile: CompileOptions,

    /// Whether URL-bearing attributes (`src`, `srcset`, `href`,
    /// `xlink:href`) may be bound.
    ///
    /// Default: true
    pub allow_url_bindings: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            compile: CompileOptions::default(),
            allow_url_bindings: true,
        }
    }
}
