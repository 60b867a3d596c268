//! Compiled expressions.

use crate::{
    api::{CompileOptions, Error, MacroTable},
    ast::{AstNode, AstNodeType},
    evaluator::{EvalError, Evaluator},
    parser,
    scope::{Scope, ScopeStack},
    stdlib::FUNCTIONS,
    values::Value,
};

/// A parsed, size-checked expression.
///
/// Each expression carries the macro table that was visible when it was
/// compiled, and [`evaluate`](Self::evaluate) resolves calls against it. A
/// macro body is only ever evaluated that way, so a macro can never reach
/// itself. Binding expressions are evaluated with
/// [`evaluate_with_macros`](Self::evaluate_with_macros) against the
/// evaluator's current table.
///
/// # Example
///
/// ```ignore
/// use tether_core::api::{CompileOptions, Expression, MacroTable};
/// use tether_core::scope::Scope;
///
/// let expr = Expression::new("[1, 2].map(x => x * 10)", &MacroTable::default(), &CompileOptions::default())?;
/// assert_eq!(expr.evaluate(&Scope::new())?.to_string(), "[10,20]");
/// ```
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    ast: AstNode,
    size: usize,
    macros: MacroTable,
}

impl Expression {
    /// Parses `source` and checks its size against `options.max_ast_size`.
    ///
    /// Sources that cannot fit under the ceiling are rejected before parsing.
    pub fn new(source: &str, macros: &MacroTable, options: &CompileOptions) -> Result<Self, Error> {
        let max = options.size_limit();
        let size = parser::minimum_node_count(source);
        if size > max {
            return Err(Error::SizeExceeded { size, max });
        }
        let ast = parser::parse_with_max_depth(source, options.max_depth)?;
        Self::from_ast(source, ast, macros, options)
    }

    /// Builds an expression from an already parsed tree.
    pub fn from_ast(
        source: &str,
        ast: AstNode,
        macros: &MacroTable,
        options: &CompileOptions,
    ) -> Result<Self, Error> {
        let size = node_count(&ast, macros);
        let max = options.size_limit();
        if size > max {
            return Err(Error::SizeExceeded { size, max });
        }
        if size > options.max_ast_size {
            tracing::warn!(size, max = options.max_ast_size, "expression exceeds size ceiling");
        }

        Ok(Self {
            source: source.to_string(),
            ast,
            size,
            macros: macros.clone(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &AstNode {
        &self.ast
    }

    /// Node count, with macro invocations counted by their expansion.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Evaluates against a caller scope.
    pub fn evaluate(&self, scope: &Scope) -> Result<Value, EvalError> {
        self.evaluate_in(&ScopeStack::new(scope.clone()))
    }

    /// Evaluates against a caller scope, resolving macro calls in `macros`
    /// instead of the table captured at compile time.
    pub fn evaluate_with_macros(&self, scope: &Scope, macros: &MacroTable) -> Result<Value, EvalError> {
        Evaluator::new(&FUNCTIONS, macros).eval(&self.ast, &ScopeStack::new(scope.clone()))
    }

    /// Evaluates against a scope with parameter frames already pushed.
    pub fn evaluate_in(&self, scope: &ScopeStack) -> Result<Value, EvalError> {
        Evaluator::new(&FUNCTIONS, &self.macros).eval(&self.ast, scope)
    }
}

/// Counts nodes. A free invocation of a known macro counts as the macro's
/// own size instead of one node, plus its argument subtrees.
fn node_count(root: &AstNode, macros: &MacroTable) -> usize {
    let mut count = 0;
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        count += match (node.kind, node.name(), node.args.len()) {
            (AstNodeType::Invocation, Some(name), 1) => {
                macros.get(name).map_or(1, |m| m.expression_size())
            }
            _ => 1,
        };
        pending.extend(&node.args);
    }
    count
}
