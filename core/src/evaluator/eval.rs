//! Core evaluation logic.

use core::cell::Cell;

use crate::{
    api::MacroTable,
    ast::{AstNode, AstNodeType, Literal},
    evaluator::{
        EvalError,
        lambda::Lambda,
        operators::{eval_binary, eval_unary},
    },
    scope::ScopeStack,
    stdlib::{Function, FunctionTable},
    values::{self, Argument, Value},
};

/// Evaluator for parsed expressions.
///
/// Holds the allowlist and the macros visible to the expression being
/// evaluated. Evaluation never mutates anything reachable from the scope.
pub struct Evaluator<'a> {
    functions: &'a FunctionTable,
    macros: &'a MacroTable,
    max_depth: usize,
    depth: Cell<usize>,
}

/// An invocation argument before it is lent to the callee.
enum Evaluated<'e> {
    Value(Value),
    Lambda(Lambda<'e>),
}

impl<'a> Evaluator<'a> {
    pub fn new(functions: &'a FunctionTable, macros: &'a MacroTable) -> Self {
        Self {
            functions,
            macros,
            max_depth: super::DEFAULT_MAX_DEPTH,
            depth: Cell::new(0),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Evaluate `node` against `scope`.
    pub fn eval(&self, node: &AstNode, scope: &ScopeStack) -> Result<Value, EvalError> {
        // Check depth before recursing
        let depth = self.depth.get();
        if depth >= self.max_depth {
            return Err(EvalError::StackOverflow {
                max_depth: self.max_depth,
            });
        }

        self.depth.set(depth + 1);
        let result = self.eval_inner(node, scope);
        self.depth.set(depth);

        result
    }

    fn eval_inner(&self, node: &AstNode, scope: &ScopeStack) -> Result<Value, EvalError> {
        use AstNodeType::*;

        match node.kind {
            Expression => self.eval(child(node, 0)?, scope),

            Literal => match &node.value {
                Some(literal) => Ok(literal_value(literal)),
                None => Err(malformed(node)),
            },

            Variable => {
                let name = node.name().ok_or_else(|| malformed(node))?;
                Ok(scope.lookup(name).cloned().unwrap_or_default())
            }

            ArrayLiteral => match node.args.as_slice() {
                [] => Ok(Value::array([])),
                [elements] => self.eval(elements, scope),
                _ => Err(malformed(node)),
            },

            Array => {
                let items = node
                    .args
                    .iter()
                    .map(|item| self.eval(item, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::from(items))
            }

            ObjectLiteral => match node.args.as_slice() {
                [] => Ok(Value::from(values::Object::new())),
                [entries] => self.eval(entries, scope),
                _ => Err(malformed(node)),
            },

            Object => {
                let mut map = values::Object::new();
                for entry in &node.args {
                    if entry.kind != KeyValue {
                        return Err(EvalError::UnexpectedNode { kind: entry.kind });
                    }
                    let key_node = child(entry, 0)?;
                    // Bare keys are literals and are used verbatim.
                    let key = match (&key_node.kind, &key_node.value) {
                        (AstNodeType::Literal, Some(literal)) => literal_value(literal),
                        _ => self.eval(key_node, scope)?,
                    };
                    let value = self.eval(child(entry, 1)?, scope)?;
                    map.insert(key.to_js_string(), value);
                }
                Ok(Value::from(map))
            }

            Not | UnaryMinus | UnaryPlus => {
                let operand = self.eval(child(node, 0)?, scope)?;
                eval_unary(node.kind, &operand)
            }

            kind if kind.is_binary() => {
                // Both operands are evaluated, including for `&&` and `||`.
                let left = self.eval(child(node, 0)?, scope)?;
                let right = self.eval(child(node, 1)?, scope)?;
                eval_binary(kind, left, right)
            }

            Ternary => {
                let condition = self.eval(child(node, 0)?, scope)?;
                let branch = if condition.truthy() { 1 } else { 2 };
                self.eval(child(node, branch)?, scope)
            }

            MemberAccess => self.eval_member_access(node, scope),

            Invocation => self.eval_invocation(node, scope),

            ArrowFunction => Err(EvalError::ArrowFunctionNotAllowed),

            kind => Err(EvalError::UnexpectedNode { kind }),
        }
    }

    /// `target.member` and `target[member]`: own properties only, null when
    /// either side is null or the member does not exist.
    fn eval_member_access(&self, node: &AstNode, scope: &ScopeStack) -> Result<Value, EvalError> {
        let target = self.eval(child(node, 0)?, scope)?;
        let member = child(node, 1)?;
        if member.kind != AstNodeType::Member {
            return Err(EvalError::UnexpectedNode { kind: member.kind });
        }
        let key = match member.name() {
            Some(name) => Value::from(name),
            None => self.eval(child(member, 0)?, scope)?,
        };
        if !matches!(key, Value::Str(_) | Value::Number(_)) {
            return Ok(Value::Null);
        }
        Ok(target.get_member(&key).unwrap_or_default())
    }

    fn eval_invocation(&self, node: &AstNode, scope: &ScopeStack) -> Result<Value, EvalError> {
        let name = node.name().ok_or_else(|| malformed(node))?;

        match node.args.as_slice() {
            [args] => {
                if let Some(macro_def) = self.macros.get(name) {
                    let values = self
                        .eval_args(name, args, scope)?
                        .into_iter()
                        .map(|arg| match arg {
                            Evaluated::Value(v) => Ok(v),
                            Evaluated::Lambda(_) => Err(EvalError::ArrowFunctionNotAllowed),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    tracing::trace!(name, "invoking macro");
                    return macro_def.evaluate(scope, &values);
                }
                let function = self
                    .functions
                    .free(name)
                    .ok_or_else(|| EvalError::unsupported(name))?;
                self.call(function, &Value::Null, args, scope)
            }
            [receiver, args] => {
                let receiver = self.eval(receiver, scope)?;
                if receiver.is_null() {
                    tracing::warn!(function = name, "cannot invoke a method on null");
                    return Ok(Value::Null);
                }
                let function = self
                    .functions
                    .method(&receiver, name)
                    .ok_or_else(|| EvalError::unsupported(name))?;
                self.call(function, &receiver, args, scope)
            }
            _ => Err(malformed(node)),
        }
    }

    fn call(
        &self,
        function: &Function,
        receiver: &Value,
        args: &AstNode,
        scope: &ScopeStack,
    ) -> Result<Value, EvalError> {
        let evaluated = self.eval_args(function.name, args, scope)?;
        let arguments: Vec<Argument<'_>> = evaluated
            .iter()
            .map(|arg| match arg {
                Evaluated::Value(v) => Argument::Value(v.clone()),
                Evaluated::Lambda(lambda) => Argument::Function(lambda),
            })
            .collect();

        if !function.accepts_objects
            && arguments
                .iter()
                .any(|arg| matches!(arg, Argument::Value(Value::Object(_))))
        {
            return Err(EvalError::argument_type(function.name));
        }

        function.call(receiver, &arguments)
    }

    /// Evaluates an argument list. Arrow functions become closures over
    /// `scope`; anything that is not an `Args[Array[..]]` list is rejected.
    fn eval_args<'e>(
        &'e self,
        name: &str,
        args: &'e AstNode,
        scope: &ScopeStack,
    ) -> Result<Vec<Evaluated<'e>>, EvalError> {
        let non_array = || EvalError::NonArrayArguments {
            name: name.to_string(),
        };
        if args.kind != AstNodeType::Args {
            return Err(non_array());
        }
        let list = match args.args.as_slice() {
            [] => return Ok(Vec::new()),
            [list] if list.kind == AstNodeType::Array => list,
            _ => return Err(non_array()),
        };

        list.args
            .iter()
            .map(|arg| {
                if arg.kind == AstNodeType::ArrowFunction {
                    Ok(Evaluated::Lambda(Lambda::new(self, arg, scope.clone())?))
                } else {
                    Ok(Evaluated::Value(self.eval(arg, scope)?))
                }
            })
            .collect()
    }
}

pub(super) fn child(node: &AstNode, index: usize) -> Result<&AstNode, EvalError> {
    node.args.get(index).ok_or_else(|| malformed(node))
}

pub(super) fn malformed(node: &AstNode) -> EvalError {
    EvalError::MalformedNode { kind: node.kind }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::Str(s.clone()),
    }
}
