//! Free functions: math, URI encoding and object inspection.

use super::{DuplicateFunction, FunctionTableBuilder, number_arg, value_arg, value_args};
use crate::evaluator::EvalError;
use crate::values::{Argument, Value};

pub fn register(builder: FunctionTableBuilder) -> Result<FunctionTableBuilder, DuplicateFunction> {
    builder
        .free("abs", math_abs)?
        .free("ceil", math_ceil)?
        .free("floor", math_floor)?
        .free("log", math_log)?
        .free("max", math_max)?
        .free("min", math_min)?
        .free("pow", math_pow)?
        .free("random", math_random)?
        .free("round", math_round)?
        .free("sign", math_sign)?
        .free("encodeURI", encode_uri)?
        .free("encodeURIComponent", encode_uri_component)?
        .free_accepting_objects("keys", object_keys)?
        .free_accepting_objects("values", object_values)
}

// ============================================================================
// Math
// ============================================================================

fn unary(name: &str, args: &[Argument<'_>], f: fn(f64) -> f64) -> Result<Value, EvalError> {
    Ok(Value::Number(f(number_arg(name, args, 0)?)))
}

fn math_abs(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    unary("abs", args, f64::abs)
}

fn math_ceil(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    unary("ceil", args, f64::ceil)
}

fn math_floor(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    unary("floor", args, f64::floor)
}

/// Natural logarithm.
fn math_log(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    unary("log", args, f64::ln)
}

/// Rounds half up, so `round(-2.5)` is `-2`.
fn math_round(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    unary("round", args, |n| {
        if !n.is_finite() {
            return n;
        }
        let floor = n.floor();
        if n - floor >= 0.5 { floor + 1.0 } else { floor }
    })
}

fn math_sign(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    unary("sign", args, |n| {
        if n.is_nan() || n == 0.0 {
            n
        } else {
            n.signum()
        }
    })
}

fn math_pow(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let base = number_arg("pow", args, 0)?;
    let exponent = number_arg("pow", args, 1)?;
    // JavaScript: 1 ** NaN is NaN, Rust says 1.
    if exponent.is_nan() {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(base.powf(exponent)))
}

fn math_max(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    fold_numbers("max", args, f64::NEG_INFINITY, f64::max)
}

fn math_min(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    fold_numbers("min", args, f64::INFINITY, f64::min)
}

/// Folds all arguments; any NaN makes the result NaN.
fn fold_numbers(
    name: &str,
    args: &[Argument<'_>],
    init: f64,
    f: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let mut acc = init;
    for value in value_args(name, args)? {
        let n = value.to_number();
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        acc = f(acc, n);
    }
    Ok(Value::Number(acc))
}

fn math_random(_: &Value, _args: &[Argument<'_>]) -> Result<Value, EvalError> {
    Ok(Value::Number(rand::random::<f64>()))
}

// ============================================================================
// URI encoding
// ============================================================================

const URI_UNRESERVED: &str = "-_.!~*'()";
const URI_RESERVED: &str = ";,/?:@&=+$#";

fn encode(input: &str, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() || keep(c) {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}

fn string_argument(name: &str, args: &[Argument<'_>]) -> Result<String, EvalError> {
    Ok(value_arg(name, args, 0)?
        .map_or_else(|| "undefined".to_string(), |v| v.to_js_string().to_string()))
}

fn encode_uri(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let input = string_argument("encodeURI", args)?;
    Ok(Value::from(encode(&input, |c| {
        URI_UNRESERVED.contains(c) || URI_RESERVED.contains(c)
    })))
}

fn encode_uri_component(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let input = string_argument("encodeURIComponent", args)?;
    Ok(Value::from(encode(&input, |c| URI_UNRESERVED.contains(c))))
}

// ============================================================================
// Object inspection
// ============================================================================

/// Own enumerable keys: sorted object keys, or index strings for arrays and
/// strings. Other primitives have none.
fn object_keys(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let keys = match value_arg("keys", args, 0)? {
        None | Some(Value::Null) => return Err(EvalError::argument_type("keys")),
        Some(Value::Object(map)) => map.keys().map(|k| Value::Str(k.clone())).collect(),
        Some(Value::Array(items)) => index_keys(items.len()),
        Some(Value::Str(s)) => index_keys(s.chars().count()),
        Some(Value::Bool(_) | Value::Number(_)) => Vec::new(),
    };
    Ok(Value::from(keys))
}

fn object_values(_: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let values = match value_arg("values", args, 0)? {
        None | Some(Value::Null) => return Err(EvalError::argument_type("values")),
        Some(Value::Object(map)) => map.values().cloned().collect(),
        Some(Value::Array(items)) => items.iter().cloned().collect(),
        Some(Value::Str(s)) => s.chars().map(|c| Value::from(c.to_string())).collect(),
        Some(Value::Bool(_) | Value::Number(_)) => Vec::new(),
    };
    Ok(Value::from(values))
}

fn index_keys(len: usize) -> Vec<Value> {
    (0..len).map(|i| Value::from(i.to_string())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: super::super::NativeFn, args: &[Value]) -> Result<Value, EvalError> {
        let args: Vec<Argument> = args.iter().cloned().map(Argument::Value).collect();
        f(&Value::Null, &args)
    }

    fn n(v: f64) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_rounding() {
        assert_eq!(call(math_round, &[n(2.5)]).unwrap(), n(3.0));
        assert_eq!(call(math_round, &[n(-2.5)]).unwrap(), n(-2.0));
        assert_eq!(call(math_round, &[n(0.49999999999999994)]).unwrap(), n(0.0));
        assert_eq!(call(math_floor, &[n(-1.5)]).unwrap(), n(-2.0));
        assert_eq!(call(math_ceil, &[Value::from("1.2")]).unwrap(), n(2.0));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(call(math_max, &[n(1.0), n(3.0), n(2.0)]).unwrap(), n(3.0));
        assert_eq!(call(math_min, &[]).unwrap(), n(f64::INFINITY));
        assert!(call(math_max, &[n(1.0), Value::from("x")]).unwrap().as_number().unwrap().is_nan());
    }

    #[test]
    fn test_misc_math() {
        assert_eq!(call(math_abs, &[n(-4.0)]).unwrap(), n(4.0));
        assert_eq!(call(math_pow, &[n(2.0), n(10.0)]).unwrap(), n(1024.0));
        assert!(call(math_pow, &[n(1.0), n(f64::NAN)]).unwrap().as_number().unwrap().is_nan());
        assert_eq!(call(math_sign, &[n(-3.0)]).unwrap(), n(-1.0));
        assert_eq!(call(math_log, &[n(1.0)]).unwrap(), n(0.0));
        assert!(call(math_abs, &[]).unwrap().as_number().unwrap().is_nan());
        let r = call(math_random, &[]).unwrap().as_number().unwrap();
        assert!((0.0..1.0).contains(&r));
    }

    #[test]
    fn test_uri_encoding() {
        assert_eq!(
            call(encode_uri_component, &[Value::from("a b&c/d")]).unwrap(),
            Value::from("a%20b%26c%2Fd")
        );
        assert_eq!(
            call(encode_uri, &[Value::from("http://x.y/a b?q=é")]).unwrap(),
            Value::from("http://x.y/a%20b?q=%C3%A9")
        );
    }

    #[test]
    fn test_keys_and_values() {
        let obj = Value::object([("b".into(), n(2.0)), ("a".into(), n(1.0))]);
        assert_eq!(
            call(object_keys, &[obj.clone()]).unwrap(),
            Value::from(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(
            call(object_values, &[obj]).unwrap(),
            Value::from(vec![n(1.0), n(2.0)])
        );
        assert_eq!(
            call(object_keys, &[Value::from(vec![n(5.0), n(6.0)])]).unwrap(),
            Value::from(vec![Value::from("0"), Value::from("1")])
        );
        assert!(call(object_keys, &[Value::Null]).is_err());
    }
}
