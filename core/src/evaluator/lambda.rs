use crate::{
    ast::{AstNode, AstNodeType},
    evaluator::{
        EvalError,
        eval::{Evaluator, child, malformed},
    },
    scope::ScopeStack,
    values::{Callable, Value},
};

/// An arrow function argument, closed over the scope it was written in.
pub(super) struct Lambda<'e> {
    evaluator: &'e Evaluator<'e>,
    params: Vec<&'e str>,
    body: &'e AstNode,
    scope: ScopeStack,
}

impl<'e> Lambda<'e> {
    /// Builds a closure from an `ArrowFunction[Array[Variable..], body]` node.
    pub(super) fn new(
        evaluator: &'e Evaluator<'e>,
        node: &'e AstNode,
        scope: ScopeStack,
    ) -> Result<Self, EvalError> {
        let params_node = child(node, 0)?;
        if params_node.kind != AstNodeType::Array {
            return Err(malformed(node));
        }
        let params = params_node
            .args
            .iter()
            .map(|param| match param.kind {
                AstNodeType::Variable => param.name().ok_or_else(|| malformed(param)),
                _ => Err(malformed(node)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Lambda {
            evaluator,
            params,
            body: child(node, 1)?,
            scope,
        })
    }
}

impl Callable for Lambda<'_> {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        let scope = self.scope.with_bindings(self.params.iter().copied(), args);
        self.evaluator.eval(self.body, &scope)
    }
}
