//! Unary and binary operators with JavaScript coercion rules.

use core::cmp::Ordering;

use crate::ast::AstNodeType;
use crate::evaluator::EvalError;
use crate::values::Value;

pub(super) fn eval_unary(op: AstNodeType, operand: &Value) -> Result<Value, EvalError> {
    match op {
        AstNodeType::Not => Ok(Value::Bool(!operand.truthy())),
        AstNodeType::UnaryMinus => Ok(Value::Number(-operand.to_number())),
        AstNodeType::UnaryPlus => Ok(Value::Number(operand.to_number())),
        kind => Err(EvalError::UnexpectedNode { kind }),
    }
}

/// Applies a binary operator to two already evaluated operands.
///
/// `&&` and `||` return one of their operands, not a coerced boolean.
pub(super) fn eval_binary(op: AstNodeType, left: Value, right: Value) -> Result<Value, EvalError> {
    use AstNodeType::*;

    let result = match op {
        LogicalAnd => {
            if left.truthy() {
                right
            } else {
                left
            }
        }
        LogicalOr => {
            if left.truthy() {
                left
            } else {
                right
            }
        }
        Plus => add(&left, &right),
        Minus => Value::Number(left.to_number() - right.to_number()),
        Multiply => Value::Number(left.to_number() * right.to_number()),
        Divide => Value::Number(left.to_number() / right.to_number()),
        // f64 `%` truncates like JavaScript's remainder.
        Modulo => Value::Number(left.to_number() % right.to_number()),
        Equal => Value::Bool(left == right),
        NotEqual => Value::Bool(left != right),
        Less => Value::Bool(compare(&left, &right) == Some(Ordering::Less)),
        LessOrEqual => Value::Bool(matches!(
            compare(&left, &right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        Greater => Value::Bool(compare(&left, &right) == Some(Ordering::Greater)),
        GreaterOrEqual => Value::Bool(matches!(
            compare(&left, &right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        kind => return Err(EvalError::UnexpectedNode { kind }),
    };
    Ok(result)
}

/// `+` concatenates when either side is string-like after `ToPrimitive`.
fn add(left: &Value, right: &Value) -> Value {
    let stringy = |v: &Value| matches!(v, Value::Str(_) | Value::Array(_) | Value::Object(_));
    if stringy(left) || stringy(right) {
        let mut out = left.to_js_string();
        out.push_str(&right.to_js_string());
        Value::Str(out)
    } else {
        Value::Number(left.to_number() + right.to_number())
    }
}

/// Abstract relational comparison. `None` means the operands are unordered
/// (a NaN was involved), which makes every relational operator false.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    let primitive = |v: &Value| match v {
        Value::Array(_) | Value::Object(_) => Value::Str(v.to_js_string()),
        _ => v.clone(),
    };
    match (primitive(left), primitive(right)) {
        (Value::Str(a), Value::Str(b)) => Some(a.as_str().cmp(b.as_str())),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: AstNodeType, l: impl Into<Value>, r: impl Into<Value>) -> Value {
        eval_binary(op, l.into(), r.into()).unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(bin(AstNodeType::Plus, 2, 3), Value::from(5));
        assert_eq!(bin(AstNodeType::Minus, "10", 4), Value::from(6));
        assert_eq!(bin(AstNodeType::Multiply, true, 4), Value::from(4));
        assert_eq!(bin(AstNodeType::Modulo, -7, 2), Value::from(-1));
        assert_eq!(bin(AstNodeType::Divide, 1, 0), Value::from(f64::INFINITY));
        assert_eq!(bin(AstNodeType::Plus, Value::Null, 1), Value::from(1));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(bin(AstNodeType::Plus, "a", 1), Value::from("a1"));
        assert_eq!(bin(AstNodeType::Plus, 1.5, "b"), Value::from("1.5b"));
        assert_eq!(
            bin(AstNodeType::Plus, Value::from(vec![Value::from(1)]), 1),
            Value::from("11")
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(bin(AstNodeType::LogicalOr, 0, "x"), Value::from("x"));
        assert_eq!(bin(AstNodeType::LogicalOr, "y", "x"), Value::from("y"));
        assert_eq!(bin(AstNodeType::LogicalAnd, 0, "x"), Value::from(0));
        assert_eq!(bin(AstNodeType::LogicalAnd, 1, "x"), Value::from("x"));
    }

    #[test]
    fn test_relational() {
        assert_eq!(bin(AstNodeType::Less, 1, 2), Value::from(true));
        assert_eq!(bin(AstNodeType::Less, "10", "9"), Value::from(true));
        assert_eq!(bin(AstNodeType::Less, "10", 9), Value::from(false));
        assert_eq!(bin(AstNodeType::LessOrEqual, f64::NAN, 1), Value::from(false));
        assert_eq!(bin(AstNodeType::GreaterOrEqual, Value::Null, 0), Value::from(true));
    }

    #[test]
    fn test_equality_is_strict() {
        assert_eq!(bin(AstNodeType::Equal, 1, "1"), Value::from(false));
        assert_eq!(bin(AstNodeType::Equal, "a", "a"), Value::from(true));
        assert_eq!(bin(AstNodeType::NotEqual, f64::NAN, f64::NAN), Value::from(true));
    }

    #[test]
    fn test_unary() {
        assert_eq!(eval_unary(AstNodeType::Not, &Value::from("")).unwrap(), Value::from(true));
        assert_eq!(eval_unary(AstNodeType::UnaryMinus, &Value::from("3")).unwrap(), Value::from(-3));
        assert!(eval_unary(AstNodeType::UnaryPlus, &Value::from("x")).unwrap().as_number().unwrap().is_nan());
    }
}
