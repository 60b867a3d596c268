//! String methods. Positions and lengths count Unicode scalar values.

use ecow::EcoString;

use super::{Category, DuplicateFunction, FunctionTableBuilder, number_arg_or, value_arg, value_args};
use crate::evaluator::EvalError;
use crate::values::number::{relative_index, to_integer};
use crate::values::{Argument, Value};

pub fn register(builder: FunctionTableBuilder) -> Result<FunctionTableBuilder, DuplicateFunction> {
    builder
        .method(Category::String, "charAt", string_char_at)?
        .method(Category::String, "charCodeAt", string_char_code_at)?
        .method(Category::String, "concat", string_concat)?
        .method(Category::String, "indexOf", string_index_of)?
        .method(Category::String, "lastIndexOf", string_last_index_of)?
        .method(Category::String, "replace", string_replace)?
        .method(Category::String, "slice", string_slice)?
        .method(Category::String, "split", string_split)?
        .method(Category::String, "substr", string_substr)?
        .method(Category::String, "substring", string_substring)?
        .method(Category::String, "toLowerCase", string_to_lower_case)?
        .method(Category::String, "toUpperCase", string_to_upper_case)
}

fn chars(name: &str, receiver: &Value) -> Result<Vec<char>, EvalError> {
    receiver
        .as_str()
        .map(|s| s.chars().collect())
        .ok_or_else(|| EvalError::argument_type(name))
}

fn collect(chars: &[char]) -> Value {
    Value::Str(chars.iter().collect::<String>().into())
}

/// String argument, `"undefined"` when absent like JavaScript.
fn string_arg(name: &str, args: &[Argument<'_>], index: usize) -> Result<EcoString, EvalError> {
    Ok(value_arg(name, args, index)?.map_or_else(|| "undefined".into(), Value::to_js_string))
}

/// Char index of `needle` in `haystack` at or after `from`.
fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..].starts_with(needle))
}

fn string_char_at(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let chars = chars("charAt", receiver)?;
    let index = to_integer(number_arg_or("charAt", args, 0, 0.0)?);
    if index < 0.0 || index >= chars.len() as f64 {
        return Ok(Value::from(""));
    }
    Ok(collect(&chars[index as usize..=index as usize]))
}

fn string_char_code_at(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let chars = chars("charCodeAt", receiver)?;
    let index = to_integer(number_arg_or("charCodeAt", args, 0, 0.0)?);
    if index < 0.0 || index >= chars.len() as f64 {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(f64::from(u32::from(chars[index as usize]))))
}

fn string_concat(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let mut out = receiver
        .as_str()
        .map(EcoString::from)
        .ok_or_else(|| EvalError::argument_type("concat"))?;
    for arg in value_args("concat", args)? {
        out.push_str(&arg.to_js_string());
    }
    Ok(Value::Str(out))
}

fn string_index_of(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let haystack = chars("indexOf", receiver)?;
    let needle: Vec<char> = string_arg("indexOf", args, 0)?.chars().collect();
    let from = to_integer(number_arg_or("indexOf", args, 1, 0.0)?)
        .clamp(0.0, haystack.len() as f64) as usize;
    let found = find_from(&haystack, &needle, from);
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn string_last_index_of(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let haystack = chars("lastIndexOf", receiver)?;
    let needle: Vec<char> = string_arg("lastIndexOf", args, 0)?.chars().collect();
    let position = number_arg_or("lastIndexOf", args, 1, f64::INFINITY)?;
    let position = if position.is_nan() { f64::INFINITY } else { to_integer(position) };
    if needle.len() > haystack.len() {
        return Ok(Value::Number(-1.0));
    }
    let last_start = haystack.len() - needle.len();
    let upper = position.clamp(0.0, last_start as f64) as usize;
    let found = (0..=upper)
        .rev()
        .find(|&i| haystack[i..].starts_with(&needle));
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

/// Replaces the first literal occurrence of the pattern.
fn string_replace(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let s = receiver
        .as_str()
        .ok_or_else(|| EvalError::argument_type("replace"))?;
    let pattern = string_arg("replace", args, 0)?;
    let replacement = string_arg("replace", args, 1)?;
    Ok(Value::from(s.replacen(pattern.as_str(), &replacement, 1)))
}

fn string_slice(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let chars = chars("slice", receiver)?;
    let len = chars.len();
    let start = value_arg("slice", args, 0)?.map_or(0, |v| relative_index(v.to_number(), len));
    let end = value_arg("slice", args, 1)?.map_or(len, |v| relative_index(v.to_number(), len));
    if start >= end {
        return Ok(Value::from(""));
    }
    Ok(collect(&chars[start..end]))
}

fn string_substring(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let chars = chars("substring", receiver)?;
    let len = chars.len() as f64;
    let clamp = |n: f64| to_integer(n).clamp(0.0, len) as usize;
    let start = clamp(number_arg_or("substring", args, 0, 0.0)?);
    let end = clamp(number_arg_or("substring", args, 1, len)?);
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    Ok(collect(&chars[lo..hi]))
}

fn string_substr(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let chars = chars("substr", receiver)?;
    let len = chars.len();
    let start = value_arg("substr", args, 0)?.map_or(0, |v| relative_index(v.to_number(), len));
    let count = to_integer(number_arg_or("substr", args, 1, f64::INFINITY)?)
        .clamp(0.0, (len - start) as f64) as usize;
    Ok(collect(&chars[start..start + count]))
}

fn string_split(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let s = receiver
        .as_str()
        .ok_or_else(|| EvalError::argument_type("split"))?;
    let limit = match value_arg("split", args, 1)? {
        None => usize::MAX,
        Some(v) => {
            let n = v.to_number();
            if n.is_nan() { 0 } else { n.trunc().rem_euclid(4_294_967_296.0) as usize }
        }
    };

    let parts: Vec<Value> = match value_arg("split", args, 0)? {
        None => vec![Value::from(s)],
        Some(separator) => {
            let separator = separator.to_js_string();
            if separator.is_empty() {
                s.chars().map(|c| Value::from(c.to_string())).collect()
            } else {
                s.split(separator.as_str()).map(Value::from).collect()
            }
        }
    };
    Ok(Value::array(parts.into_iter().take(limit)))
}

fn string_to_lower_case(receiver: &Value, _args: &[Argument<'_>]) -> Result<Value, EvalError> {
    receiver
        .as_str()
        .map(|s| Value::from(s.to_lowercase()))
        .ok_or_else(|| EvalError::argument_type("toLowerCase"))
}

fn string_to_upper_case(receiver: &Value, _args: &[Argument<'_>]) -> Result<Value, EvalError> {
    receiver
        .as_str()
        .map(|s| Value::from(s.to_uppercase()))
        .ok_or_else(|| EvalError::argument_type("toUpperCase"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: super::super::NativeFn, s: &str, args: &[Value]) -> Value {
        let args: Vec<Argument> = args.iter().cloned().map(Argument::Value).collect();
        f(&Value::from(s), &args).unwrap()
    }

    fn n(v: f64) -> Value {
        Value::from(v)
    }

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_char_access() {
        assert_eq!(call(string_char_at, "héllo", &[n(1.0)]), s("é"));
        assert_eq!(call(string_char_at, "abc", &[n(5.0)]), s(""));
        assert_eq!(call(string_char_at, "abc", &[]), s("a"));
        assert_eq!(call(string_char_code_at, "A", &[]), n(65.0));
        assert!(call(string_char_code_at, "A", &[n(3.0)]).as_number().unwrap().is_nan());
    }

    #[test]
    fn test_search() {
        assert_eq!(call(string_index_of, "banana", &[s("an")]), n(1.0));
        assert_eq!(call(string_index_of, "banana", &[s("an"), n(2.0)]), n(3.0));
        assert_eq!(call(string_index_of, "banana", &[s("x")]), n(-1.0));
        assert_eq!(call(string_index_of, "abc", &[s("")]), n(0.0));
        assert_eq!(call(string_last_index_of, "banana", &[s("an")]), n(3.0));
        assert_eq!(call(string_last_index_of, "banana", &[s("an"), n(2.0)]), n(1.0));
        assert_eq!(call(string_last_index_of, "ab", &[s("abc")]), n(-1.0));
    }

    #[test]
    fn test_replace_first_occurrence() {
        assert_eq!(call(string_replace, "a-b-c", &[s("-"), s("+")]), s("a+b-c"));
        assert_eq!(call(string_replace, "abc", &[s("x"), s("y")]), s("abc"));
    }

    #[test]
    fn test_substrings() {
        assert_eq!(call(string_slice, "hello", &[n(1.0), n(-1.0)]), s("ell"));
        assert_eq!(call(string_slice, "hello", &[n(-3.0)]), s("llo"));
        assert_eq!(call(string_substring, "hello", &[n(4.0), n(1.0)]), s("ell"));
        assert_eq!(call(string_substring, "hello", &[n(-2.0)]), s("hello"));
        assert_eq!(call(string_substr, "hello", &[n(1.0), n(3.0)]), s("ell"));
        assert_eq!(call(string_substr, "hello", &[n(-3.0), n(2.0)]), s("ll"));
    }

    #[test]
    fn test_split() {
        assert_eq!(
            call(string_split, "a,b,c", &[s(",")]),
            Value::from(vec![s("a"), s("b"), s("c")])
        );
        assert_eq!(
            call(string_split, "abc", &[s(""), n(2.0)]),
            Value::from(vec![s("a"), s("b")])
        );
        assert_eq!(call(string_split, "abc", &[]), Value::from(vec![s("abc")]));
    }

    #[test]
    fn test_case_and_concat() {
        assert_eq!(call(string_to_upper_case, "abc", &[]), s("ABC"));
        assert_eq!(call(string_to_lower_case, "ÀB", &[]), s("àb"));
        assert_eq!(call(string_concat, "a", &[n(1.0), Value::Null]), s("a1null"));
    }
}
