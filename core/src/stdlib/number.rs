//! Number methods.

use super::{Category, DuplicateFunction, FunctionTableBuilder, value_arg};
use crate::evaluator::EvalError;
use crate::values::number::to_integer;
use crate::values::{Argument, Value, format_number};

pub fn register(builder: FunctionTableBuilder) -> Result<FunctionTableBuilder, DuplicateFunction> {
    builder
        .method(Category::Number, "toExponential", number_to_exponential)?
        .method(Category::Number, "toFixed", number_to_fixed)?
        .method(Category::Number, "toPrecision", number_to_precision)?
        .method(Category::Number, "toString", number_to_string)
}

fn receiver_number(name: &str, receiver: &Value) -> Result<f64, EvalError> {
    receiver
        .as_number()
        .ok_or_else(|| EvalError::argument_type(name))
}

/// Integer argument checked against `min..=max`; `None` when absent.
fn digits_arg(
    name: &str,
    args: &[Argument<'_>],
    min: u32,
    max: u32,
) -> Result<Option<usize>, EvalError> {
    let Some(value) = value_arg(name, args, 0)? else {
        return Ok(None);
    };
    let n = to_integer(value.to_number());
    if n < f64::from(min) || n > f64::from(max) {
        return Err(EvalError::OutOfRange {
            name: name.to_string(),
            min,
            max,
        });
    }
    Ok(Some(n as usize))
}

fn non_finite(n: f64) -> Option<Value> {
    (!n.is_finite()).then(|| Value::Str(format_number(n).into()))
}

fn number_to_fixed(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let n = receiver_number("toFixed", receiver)?;
    let digits = digits_arg("toFixed", args, 0, 100)?.unwrap_or(0);
    if let Some(v) = non_finite(n) {
        return Ok(v);
    }
    if n.abs() >= 1e21 {
        return Ok(Value::Str(format_number(n).into()));
    }
    Ok(Value::from(to_fixed(n, digits)))
}

/// Fixed-point formatting where exact ties round away from zero.
fn to_fixed(n: f64, digits: usize) -> String {
    let sign = if n < 0.0 { "-" } else { "" };
    format!("{}{}", sign, to_fixed_abs(n.abs(), digits))
}

fn to_fixed_abs(n: f64, digits: usize) -> String {
    const EXTRA: usize = 30;
    // A tie terminates right after the first dropped digit, which is a 5.
    let extended = format!("{:.*}", digits + EXTRA, n);
    let (head, tail) = extended.split_at(extended.len() - EXTRA);
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return format!("{:.*}", digits, n);
    }
    increment_last_digit(head.strip_suffix('.').unwrap_or(head))
}

/// Adds one unit in the last place of a plain decimal string.
fn increment_last_digit(s: &str) -> String {
    let mut bytes = s.as_bytes().to_vec();
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b'.' => continue,
            b'9' => bytes[i] = b'0',
            d => {
                bytes[i] = d + 1;
                return String::from_utf8(bytes).unwrap_or_default();
            }
        }
    }
    let mut out = String::from("1");
    out.push_str(&String::from_utf8(bytes).unwrap_or_default());
    out
}

fn number_to_exponential(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let n = receiver_number("toExponential", receiver)?;
    let digits = digits_arg("toExponential", args, 0, 100)?;
    if let Some(v) = non_finite(n) {
        return Ok(v);
    }
    let formatted = match digits {
        Some(d) => format!("{:.*e}", d, n),
        None => format!("{:e}", n),
    };
    Ok(Value::from(js_exponent(&formatted)))
}

/// Rewrites Rust's `1.5e2` / `1.5e-2` exponent into JavaScript's `1.5e+2`.
fn js_exponent(formatted: &str) -> String {
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => formatted.to_string(),
    }
}

fn number_to_precision(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let n = receiver_number("toPrecision", receiver)?;
    let precision = digits_arg("toPrecision", args, 1, 100)?;
    let Some(precision) = precision else {
        return Ok(Value::Str(format_number(n).into()));
    };
    if let Some(v) = non_finite(n) {
        return Ok(v);
    }
    if n == 0.0 {
        return Ok(Value::from(format!("{:.*}", precision - 1, 0.0)));
    }

    let sci = format!("{:.*e}", precision - 1, n);
    let exponent: i64 = sci
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    if exponent < -6 || exponent >= precision as i64 {
        return Ok(Value::from(js_exponent(&sci)));
    }
    let decimals = (precision as i64 - 1 - exponent).max(0) as usize;
    Ok(Value::from(format!("{:.*}", decimals, n)))
}

fn number_to_string(receiver: &Value, args: &[Argument<'_>]) -> Result<Value, EvalError> {
    let n = receiver_number("toString", receiver)?;
    let radix = match value_arg("toString", args, 0)? {
        None => 10,
        Some(v) => {
            let r = to_integer(v.to_number());
            if !(2.0..=36.0).contains(&r) {
                return Err(EvalError::OutOfRange {
                    name: "toString".to_string(),
                    min: 2,
                    max: 36,
                });
            }
            r as u32
        }
    };
    if radix == 10 || !n.is_finite() {
        return Ok(Value::Str(format_number(n).into()));
    }
    Ok(Value::from(to_radix(n, radix)))
}

/// Radix conversion with up to 20 fractional digits.
fn to_radix(n: f64, radix: u32) -> String {
    let mut out = String::new();
    if n < 0.0 {
        out.push('-');
    }
    let abs = n.abs();
    let mut int = abs.trunc();
    let mut frac = abs - int;

    let mut int_digits = Vec::new();
    if int == 0.0 {
        int_digits.push('0');
    }
    while int >= 1.0 {
        let digit = (int % f64::from(radix)) as u32;
        int_digits.push(char::from_digit(digit, radix).unwrap_or('0'));
        int = (int / f64::from(radix)).trunc();
    }
    out.extend(int_digits.iter().rev());

    if frac > 0.0 {
        out.push('.');
        for _ in 0..20 {
            frac *= f64::from(radix);
            let digit = frac.trunc() as u32;
            out.push(char::from_digit(digit, radix).unwrap_or('0'));
            frac -= frac.trunc();
            if frac == 0.0 {
                break;
            }
        }
    }
    out
}
