//! Array methods.
//!
//! Callbacks receive `(element, index, array)`; `reduce` callbacks receive
//! `(accumulator, element, index, array)`.

use core::cmp::Ordering;

use ecow::{EcoString, EcoVec};

use super::{Category, FunctionTableBuilder, DuplicateFunction, callback_arg, value_arg, value_args};
use crate::evaluator::EvalError;
use crate::values::number::relative_index;
use crate::values::{Argument, Callable, Value};

pub fn register(builder: FunctionTableBuilder) -> Result<FunctionTableBuilder, DuplicateFunction> {
    builder
        .method(Category::Array, "concat", array_concat)?
        .method(Category::Array, "every", array_every)?
        .method(Category::Array, "filter", array_filter)?
        .method(Category::Array, "find", array_find)?
        .method(Category::Array, "findIndex", array_find_index)?
        .method(Category::Array, "includes", array_includes)?
        .method(Category::Array, "indexOf", array_index_of)?
        .method(Category::Array, "join", array_join)?
        .method(Category::Array, "lastIndexOf", array_last_index_of)?
        .method(Category::Array, "map", array_map)?
        .method(Category::Array, "reduce", array_reduce)?
        .method(Category::Array, "slice", array_slice)?
        .method(Category::Array, "some", array_some)?
        .method(Category::Array, "sort", array_sort)?
        .method_accepting_objects(Category::Array, "splice", array_splice)
}

fn items<'v>(name: &str, receiver: &'v Value) -> Result<&'v EcoVec<Value>, EvalError> {
    receiver
        .as_array()
        .ok_or_else(|| EvalError::argument_type(name))
}

fn call_with_element(
    callback: &dyn Callable,
    receiver: &Value,
    index: usize,
    element: &Value,
) -> Result<Value, EvalError> {
    callback.call(&[element.clone(), Value::Number(index as f64), receiver.clone()])
}

// ============================================================================
// Iteration
// ============================================================================

fn array_every(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let callback = callback_arg("every", args, 0)?;
    for (i, element) in items("every", receiver)?.iter().enumerate() {
        if !call_with_element(callback, receiver, i, element)?.truthy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn array_some(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let callback = callback_arg("some", args, 0)?;
    for (i, element) in items("some", receiver)?.iter().enumerate() {
        if call_with_element(callback, receiver, i, element)?.truthy() {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn array_filter(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let callback = callback_arg("filter", args, 0)?;
    let mut kept = EcoVec::new();
    for (i, element) in items("filter", receiver)?.iter().enumerate() {
        if call_with_element(callback, receiver, i, element)?.truthy() {
            kept.push(element.clone());
        }
    }
    Ok(Value::Array(kept))
}

fn array_find(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let callback = callback_arg("find", args, 0)?;
    for (i, element) in items("find", receiver)?.iter().enumerate() {
        if call_with_element(callback, receiver, i, element)?.truthy() {
            return Ok(element.clone());
        }
    }
    Ok(Value::Null)
}

fn array_find_index(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let callback = callback_arg("findIndex", args, 0)?;
    for (i, element) in items("findIndex", receiver)?.iter().enumerate() {
        if call_with_element(callback, receiver, i, element)?.truthy() {
            return Ok(Value::Number(i as f64));
        }
    }
    Ok(Value::Number(-1.0))
}

fn array_map(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let callback = callback_arg("map", args, 0)?;
    let mapped = items("map", receiver)?
        .iter()
        .enumerate()
        .map(|(i, element)| call_with_element(callback, receiver, i, element))
        .collect::<Result<EcoVec<_>, _>>()?;
    Ok(Value::Array(mapped))
}

fn array_reduce(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let callback = callback_arg("reduce", args, 0)?;
    let elements = items("reduce", receiver)?;
    let (mut acc, start) = match value_arg("reduce", args, 1)? {
        Some(initial) => (initial.clone(), 0),
        None => match elements.first() {
            Some(first) => (first.clone(), 1),
            None => return Err(EvalError::ReduceOfEmptyArray),
        },
    };
    for (i, element) in elements.iter().enumerate().skip(start) {
        acc = callback.call(&[acc, element.clone(), Value::Number(i as f64), receiver.clone()])?;
    }
    Ok(acc)
}

// ============================================================================
// Search
// ============================================================================

/// `includes` treats NaN as equal to itself, `indexOf` does not.
fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a == b,
    }
}

fn array_includes(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let elements = items("includes", receiver)?;
    let needle = value_arg("includes", args, 0)?.cloned().unwrap_or_default();
    let from = from_index("includes", args, elements.len())?;
    Ok(Value::Bool(
        elements[from..].iter().any(|e| same_value_zero(e, &needle)),
    ))
}

fn array_index_of(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let elements = items("indexOf", receiver)?;
    let needle = value_arg("indexOf", args, 0)?.cloned().unwrap_or_default();
    let from = from_index("indexOf", args, elements.len())?;
    let found = elements[from..].iter().position(|e| *e == needle);
    Ok(Value::Number(found.map_or(-1.0, |i| (i + from) as f64)))
}

fn array_last_index_of(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let elements = items("lastIndexOf", receiver)?;
    if elements.is_empty() {
        return Ok(Value::Number(-1.0));
    }
    let needle = value_arg("lastIndexOf", args, 0)?.cloned().unwrap_or_default();
    let end = match value_arg("lastIndexOf", args, 1)? {
        None => elements.len() - 1,
        Some(v) => {
            let n = crate::values::number::to_integer(v.to_number());
            if n < 0.0 {
                let back = elements.len() as f64 + n;
                if back < 0.0 {
                    return Ok(Value::Number(-1.0));
                }
                back as usize
            } else {
                (n as usize).min(elements.len() - 1)
            }
        }
    };
    let found = elements[..=end].iter().rposition(|e| *e == needle);
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn from_index(name: &str, args: &[Argument<'_>], len: usize) -> Result<usize, EvalError> {
    Ok(value_arg(name, args, 1)?.map_or(0, |v| relative_index(v.to_number(), len)))
}

// ============================================================================
// Construction
// ============================================================================

fn array_concat(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let mut out = items("concat", receiver)?.clone();
    for arg in value_args("concat", args)? {
        match arg {
            Value::Array(more) => out.extend(more.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Ok(Value::Array(out))
}

fn array_join(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let separator = match value_arg("join", args, 0)? {
        None => EcoString::from(","),
        Some(v) => v.to_js_string(),
    };
    let mut out = EcoString::new();
    for (i, element) in items("join", receiver)?.iter().enumerate() {
        if i > 0 {
            out.push_str(&separator);
        }
        if !element.is_null() {
            out.push_str(&element.to_js_string());
        }
    }
    Ok(Value::Str(out))
}

fn array_slice(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let elements = items("slice", receiver)?;
    let len = elements.len();
    let start = value_arg("slice", args, 0)?.map_or(0, |v| relative_index(v.to_number(), len));
    let end = value_arg("slice", args, 1)?.map_or(len, |v| relative_index(v.to_number(), len));
    if start >= end {
        return Ok(Value::Array(EcoVec::new()));
    }
    Ok(Value::Array(elements[start..end].iter().cloned().collect()))
}

// ============================================================================
// Copy-on-write mutators
// ============================================================================

/// Sorts a copy of the receiver. Without a comparator elements are ordered
/// by their string form, with nulls last.
fn array_sort(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let mut sorted: Vec<Value> = items("sort", receiver)?.iter().cloned().collect();
    match args.first() {
        None | Some(Argument::Value(Value::Null)) => sorted.sort_by(default_order),
        Some(Argument::Function(comparator)) => {
            sorted = merge_sort(sorted, |a, b| {
                let n = comparator.call(&[a.clone(), b.clone()])?.to_number();
                Ok(if n > 0.0 {
                    Ordering::Greater
                } else if n < 0.0 {
                    Ordering::Less
                } else {
                    Ordering::Equal
                })
            })?;
        }
        Some(Argument::Value(_)) => return Err(EvalError::argument_type("sort")),
    }
    Ok(Value::from(sorted))
}

/// Stable bottom-up merge sort with a fallible comparator.
///
/// The comparator comes from the expression and need not be a total order
/// (`(a, b) => random() - 0.5`). Any comparator yields a permutation of the
/// input.
fn merge_sort<F>(items: Vec<Value>, mut compare: F) -> Result<Vec<Value>, EvalError>
where
    F: FnMut(&Value, &Value) -> Result<Ordering, EvalError>,
{
    let len = items.len();
    let mut run = items;
    let mut width = 1;
    while width < len {
        let mut merged = Vec::with_capacity(len);
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut left, mut right) = (start, mid);
            while left < mid && right < end {
                if compare(&run[left], &run[right])? == Ordering::Greater {
                    merged.push(run[right].clone());
                    right += 1;
                } else {
                    merged.push(run[left].clone());
                    left += 1;
                }
            }
            merged.extend_from_slice(&run[left..mid]);
            merged.extend_from_slice(&run[right..end]);
            start = end;
        }
        run = merged;
        width *= 2;
    }
    Ok(run)
}

fn default_order(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.to_js_string().as_str().cmp(b.to_js_string().as_str()),
    }
}

/// Splices a copy of the receiver and returns the modified copy.
fn array_splice(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let mut copy: Vec<Value> = items("splice", receiver)?.iter().cloned().collect();
    let len = copy.len();
    let values = value_args("splice", args)?;

    let Some(start) = values.first() else {
        return Ok(Value::from(copy));
    };
    let start = relative_index(start.to_number(), len);
    let delete = match values.get(1) {
        None => len - start,
        Some(count) => {
            let count = crate::values::number::to_integer(count.to_number()).max(0.0);
            (count.min((len - start) as f64)) as usize
        }
    };
    let inserted = values.iter().skip(2).map(|v| (*v).clone());
    copy.splice(start..start + delete, inserted);
    Ok(Value::from(copy))
}
