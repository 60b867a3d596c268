//! Function allowlist.
//!
//! The only functions an expression can call. Methods are looked up by the
//! runtime category of their receiver (array, number or string); free
//! functions cover math, URI encoding and object key/value extraction.
//!
//! - Array: `concat every filter find findIndex includes indexOf join
//!   lastIndexOf map reduce slice some sort splice`
//! - Number: `toExponential toFixed toPrecision toString`
//! - String: `charAt charCodeAt concat indexOf lastIndexOf replace slice split
//!   substr substring toLowerCase toUpperCase`
//! - Free: `abs ceil floor log max min pow random round sign encodeURI
//!   encodeURIComponent keys values`
//!
//! Every entry is a plain Rust function that never mutates its receiver.
//! `sort` and `splice` operate on a copy and return it.
//!
//! The table is built once on first use and is read-only afterwards.

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::evaluator::EvalError;
use crate::values::{Argument, Callable, Value};

pub mod array;
pub mod math;
pub mod number;
pub mod string;

#[cfg(test)]
mod array_test;

/// Signature of every allowlisted function. Free functions receive
/// [`Value::Null`] as their receiver.
pub type NativeFn = fn(&Value, &[Argument<'_>]) -> Result<Value, EvalError>;

/// Receiver categories that carry methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Array,
    Number,
    String,
}

impl Category {
    pub fn of(value: &Value) -> Option<Category> {
        match value {
            Value::Array(_) => Some(Category::Array),
            Value::Number(_) => Some(Category::Number),
            Value::Str(_) => Some(Category::String),
            Value::Null | Value::Bool(_) | Value::Object(_) => None,
        }
    }
}

/// One allowlisted function.
#[derive(Debug, Clone, Copy)]
pub struct Function {
    pub name: &'static str,
    pub func: NativeFn,
    /// Whether plain objects may appear among the arguments.
    pub accepts_objects: bool,
}

impl Function {
    pub fn call(&self, receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
        (self.func)(receiver, args)
    }
}

#[derive(Debug, Error)]
#[error("function `{name}` is registered twice for {table}")]
pub struct DuplicateFunction {
    pub name: &'static str,
    pub table: &'static str,
}

/// The allowlist: one table per receiver category plus free functions.
#[derive(Debug, Default)]
pub struct FunctionTable {
    array: HashMap<&'static str, Function>,
    number: HashMap<&'static str, Function>,
    string: HashMap<&'static str, Function>,
    free: HashMap<&'static str, Function>,
}

impl FunctionTable {
    pub fn builder() -> FunctionTableBuilder {
        FunctionTableBuilder::default()
    }

    /// Method `name` for `receiver`'s category, if allowlisted.
    pub fn method(&self, receiver: &Value, name: &str) -> Option<&Function> {
        match Category::of(receiver)? {
            Category::Array => self.array.get(name),
            Category::Number => self.number.get(name),
            Category::String => self.string.get(name),
        }
    }

    /// Free function `name`, if allowlisted.
    pub fn free(&self, name: &str) -> Option<&Function> {
        self.free.get(name)
    }

    /// Names of the free functions, unordered.
    pub fn free_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.free.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.array.len() + self.number.len() + self.string.len() + self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registers functions, refusing duplicate names within a table.
#[derive(Debug, Default)]
pub struct FunctionTableBuilder {
    table: FunctionTable,
}

impl FunctionTableBuilder {
    pub fn method(
        self,
        category: Category,
        name: &'static str,
        func: NativeFn,
    ) -> Result<Self, DuplicateFunction> {
        self.insert(Some(category), name, func, false)
    }

    /// Like [`method`](Self::method), for methods that take plain objects.
    pub fn method_accepting_objects(
        self,
        category: Category,
        name: &'static str,
        func: NativeFn,
    ) -> Result<Self, DuplicateFunction> {
        self.insert(Some(category), name, func, true)
    }

    pub fn free(self, name: &'static str, func: NativeFn) -> Result<Self, DuplicateFunction> {
        self.insert(None, name, func, false)
    }

    pub fn free_accepting_objects(
        self,
        name: &'static str,
        func: NativeFn,
    ) -> Result<Self, DuplicateFunction> {
        self.insert(None, name, func, true)
    }

    fn insert(
        mut self,
        category: Option<Category>,
        name: &'static str,
        func: NativeFn,
        accepts_objects: bool,
    ) -> Result<Self, DuplicateFunction> {
        let (map, table) = match category {
            Some(Category::Array) => (&mut self.table.array, "arrays"),
            Some(Category::Number) => (&mut self.table.number, "numbers"),
            Some(Category::String) => (&mut self.table.string, "strings"),
            None => (&mut self.table.free, "free functions"),
        };
        let function = Function {
            name,
            func,
            accepts_objects,
        };
        if map.insert(name, function).is_some() {
            return Err(DuplicateFunction { name, table });
        }
        Ok(self)
    }

    pub fn build(self) -> FunctionTable {
        self.table
    }
}

/// Builds the full allowlist.
pub fn build_function_table() -> Result<FunctionTable, DuplicateFunction> {
    let builder = FunctionTable::builder();
    let builder = array::register(builder)?;
    let builder = number::register(builder)?;
    let builder = string::register(builder)?;
    let builder = math::register(builder)?;
    Ok(builder.build())
}

/// The process-wide allowlist.
pub static FUNCTIONS: Lazy<FunctionTable> = Lazy::new(|| {
    let table = build_function_table().unwrap_or_else(|e| panic!("invalid allowlist: {}", e));
    tracing::debug!(functions = table.len(), "built function allowlist");
    table
});

// ============================================================================
// Argument helpers
// ============================================================================

/// The value at `index`, or `None` when absent. Passing an arrow function
/// where a value is expected is an argument type error.
pub(crate) fn value_arg<'v>(
    name: &str,
    args: &'v [Argument<'_>],
    index: usize,
) -> Result<Option<&'v Value>, EvalError> {
    match args.get(index) {
        None => Ok(None),
        Some(Argument::Value(v)) => Ok(Some(v)),
        Some(Argument::Function(_)) => Err(EvalError::argument_type(name)),
    }
}

/// Numeric argument, `NaN` when absent (JavaScript's `undefined`).
pub(crate) fn number_arg(name: &str, args: &[Argument<'_>], index: usize) -> Result<f64, EvalError> {
    Ok(value_arg(name, args, index)?.map_or(f64::NAN, Value::to_number))
}

/// Numeric argument that defaults to `default` when absent or null.
pub(crate) fn number_arg_or(
    name: &str,
    args: &[Argument<'_>],
    index: usize,
    default: f64,
) -> Result<f64, EvalError> {
    Ok(match value_arg(name, args, index)? {
        None => default,
        Some(v) => v.to_number(),
    })
}

/// The arrow function at `index`.
pub(crate) fn callback_arg<'a>(
    name: &str,
    args: &[Argument<'a>],
    index: usize,
) -> Result<&'a dyn Callable, EvalError> {
    args.get(index)
        .and_then(Argument::as_function)
        .ok_or_else(|| EvalError::ExpectedCallback {
            name: name.to_string(),
        })
}

/// All arguments as values, rejecting arrow functions.
pub(crate) fn value_args<'v>(name: &str, args: &'v [Argument<'_>]) -> Result<Vec<&'v Value>, EvalError> {
    args.iter()
        .map(|arg| arg.as_value().ok_or_else(|| EvalError::argument_type(name)))
        .collect()
}
