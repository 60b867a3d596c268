//! Callable arguments.
//!
//! Arrow functions are not values: they only exist as invocation arguments,
//! so the stdlib receives them as [`Argument::Function`] and calls back into
//! the evaluator through the [`Callable`] trait.

use core::fmt;

use super::Value;
use crate::evaluator::EvalError;

/// A function that can be called from the stdlib with positional arguments.
pub trait Callable {
    /// Number of declared parameters.
    fn arity(&self) -> usize;

    fn call(&self, args: &[Value]) -> Result<Value, EvalError>;
}

/// One evaluated invocation argument.
pub enum Argument<'a> {
    Value(Value),
    Function(&'a dyn Callable),
}

impl<'a> Argument<'a> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(v) => Some(v),
            Argument::Function(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&'a dyn Callable> {
        match self {
            Argument::Value(_) => None,
            Argument::Function(f) => Some(*f),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Argument::Function(_))
    }
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Value(v) => write!(f, "Value({:?})", v),
            Argument::Function(func) => write!(f, "Function(arity={})", func.arity()),
        }
    }
}
