//! Tests for the array methods

use crate::{evaluator, evaluator::EvalError, parser, scope::Scope, values::Value};
use pretty_assertions::assert_eq;

// Helper for evaluating an expression against a scope given as JSON
fn eval_in(scope: &str, source: &str) -> Result<Value, EvalError> {
    let scope: Scope = serde_json::from_str(scope).expect("invalid test scope");
    let ast = parser::parse(source)
        .unwrap_or_else(|e| panic!("parse should succeed for: {}\nError: {}", source, e));
    evaluator::eval(&ast, &scope)
}

fn test_array_expr(source: &str, expected: &str) {
    let result = eval_in("{}", source)
        .unwrap_or_else(|e| panic!("evaluation should succeed for: {}\nError: {}", source, e));
    let expected: Value = serde_json::from_str(expected).expect("invalid expected JSON");
    assert_eq!(result, expected, "for: {}", source);
}

fn expect_error(source: &str, expected: EvalError) {
    match eval_in("{}", source) {
        Ok(v) => panic!("expected error for: {}\nGot: {}", source, v),
        Err(e) => assert_eq!(e, expected, "for: {}", source),
    }
}

// ============================================================================
// Iteration
// ============================================================================

#[test]
fn test_map() {
    test_array_expr("[1, 2, 3].map(x => x * 2)", "[2, 4, 6]");
    test_array_expr("[].map(x => x)", "[]");
    test_array_expr("['a', 'b'].map((x, i) => x + i)", r#"["a0", "b1"]"#);
    test_array_expr("[7].map((x, i, arr) => arr.length)", "[1]");
}

#[test]
fn test_filter() {
    test_array_expr("[1, 2, 3, 4].filter(x => x % 2 == 0)", "[2, 4]");
    test_array_expr("[0, 1, '', 'a', null].filter(x => x)", r#"[1, "a"]"#);
}

#[test]
fn test_every_and_some() {
    test_array_expr("[2, 4].every(x => x % 2 == 0)", "true");
    test_array_expr("[2, 3].every(x => x % 2 == 0)", "false");
    test_array_expr("[].every(x => false)", "true");
    test_array_expr("[1, 2].some(x => x > 1)", "true");
    test_array_expr("[].some(x => true)", "false");
}

#[test]
fn test_find() {
    test_array_expr("[1, 5, 10].find(x => x > 3)", "5");
    test_array_expr("[1, 2].find(x => x > 3)", "null");
    test_array_expr("[1, 5, 10].findIndex(x => x > 3)", "1");
    test_array_expr("[1, 2].findIndex(x => x > 3)", "-1");
}

#[test]
fn test_reduce() {
    test_array_expr("[1, 2, 3].reduce((acc, x) => acc + x)", "6");
    test_array_expr("[1, 2, 3].reduce((acc, x) => acc + x, 10)", "16");
    test_array_expr("[].reduce((acc, x) => acc + x, 'init')", r#""init""#);
    test_array_expr("['a', 'b'].reduce((acc, x, i) => acc + i, '')", r#""01""#);
    expect_error("[].reduce((acc, x) => acc + x)", EvalError::ReduceOfEmptyArray);
}

#[test]
fn test_callback_required() {
    expect_error(
        "[1].map(1)",
        EvalError::ExpectedCallback {
            name: "map".to_string(),
        },
    );
    expect_error(
        "[1].filter()",
        EvalError::ExpectedCallback {
            name: "filter".to_string(),
        },
    );
}

#[test]
fn test_callback_sees_outer_scope() {
    let result = eval_in(r#"{"k": 10}"#, "[1, 2].map(x => x + k)").unwrap();
    assert_eq!(result, serde_json::from_str::<Value>("[11, 12]").unwrap());
}

#[test]
fn test_callback_parameters_shadow_scope() {
    let result = eval_in(r#"{"x": 100}"#, "[1, 2].map(x => x)").unwrap();
    assert_eq!(result, serde_json::from_str::<Value>("[1, 2]").unwrap());
}

#[test]
fn test_nested_callbacks() {
    test_array_expr(
        "[1, 2].map(x => [10, 20].map(y => x + y))",
        "[[11, 21], [12, 22]]",
    );
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_includes() {
    test_array_expr("[1, 2, 3].includes(2)", "true");
    test_array_expr("[1, 2, 3].includes('2')", "false");
    test_array_expr("[1, 2, 3].includes(1, 1)", "false");
    test_array_expr("[1, 2, 3].includes(3, -1)", "true");
    test_array_expr("[null].includes(null)", "true");
}

#[test]
fn test_index_of() {
    test_array_expr("['a', 'b', 'a'].indexOf('a')", "0");
    test_array_expr("['a', 'b', 'a'].indexOf('a', 1)", "2");
    test_array_expr("['a', 'b'].indexOf('z')", "-1");
    test_array_expr("['a', 'b', 'a'].lastIndexOf('a')", "2");
    test_array_expr("['a', 'b', 'a'].lastIndexOf('a', 1)", "0");
    test_array_expr("['a', 'b', 'a'].lastIndexOf('a', -5)", "-1");
    test_array_expr("[].lastIndexOf('a')", "-1");
}

#[test]
fn test_structural_search() {
    test_array_expr("[[1], [2]].indexOf([2])", "1");
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_concat() {
    test_array_expr("[1].concat([2, 3], 4)", "[1, 2, 3, 4]");
    test_array_expr("[1].concat([[2]])", "[1, [2]]");
    test_array_expr("[].concat()", "[]");
}

#[test]
fn test_join() {
    test_array_expr("[1, 2, 3].join()", r#""1,2,3""#);
    test_array_expr("[1, 2, 3].join('-')", r#""1-2-3""#);
    test_array_expr("['a', null, 'b'].join('')", r#""ab""#);
    test_array_expr("[].join('-')", r#""""#);
    test_array_expr("[true, 1.5].join(' ')", r#""true 1.5""#);
}

#[test]
fn test_slice() {
    test_array_expr("[1, 2, 3, 4].slice(1)", "[2, 3, 4]");
    test_array_expr("[1, 2, 3, 4].slice(1, 3)", "[2, 3]");
    test_array_expr("[1, 2, 3, 4].slice(-2)", "[3, 4]");
    test_array_expr("[1, 2, 3, 4].slice(3, 1)", "[]");
    test_array_expr("[1, 2, 3, 4].slice()", "[1, 2, 3, 4]");
}

// ============================================================================
// Copy-on-write mutators
// ============================================================================

#[test]
fn test_sort_default_order() {
    test_array_expr("['b', 'c', 'a'].sort()", r#"["a", "b", "c"]"#);
    // Default order compares string forms.
    test_array_expr("[10, 9, 1].sort()", "[1, 10, 9]");
    test_array_expr("[null, 'b', 'a'].sort()", r#"["a", "b", null]"#);
}

#[test]
fn test_sort_with_comparator() {
    test_array_expr("[10, 9, 1].sort((a, b) => a - b)", "[1, 9, 10]");
    test_array_expr("[10, 9, 1].sort((a, b) => b - a)", "[10, 9, 1]");
}

#[test]
fn test_sort_comparator_errors_propagate() {
    expect_error(
        "[2, 1].sort((a, b) => sin(a))",
        EvalError::unsupported("sin"),
    );
}

#[test]
fn test_sort_is_stable() {
    test_array_expr(
        "[[1, 'a'], [0, 'b'], [1, 'c'], [0, 'd']].sort((x, y) => x[0] - y[0])",
        r#"[[0, "b"], [0, "d"], [1, "a"], [1, "c"]]"#,
    );
}

#[test]
fn test_sort_inconsistent_comparator_permutes() {
    let items: Vec<usize> = (0..500).collect();
    let scope = format!(r#"{{"items": {:?}}}"#, items);
    for comparator in ["(x, y) => random() - 0.5", "(x, y) => 1", "(x, y) => -1", "(x, y) => x < y"] {
        let source = format!("items.sort({})", comparator);
        let result = eval_in(&scope, &source)
            .unwrap_or_else(|e| panic!("sort failed for {}: {}", comparator, e));
        let Value::Array(sorted) = result else {
            panic!("expected an array for {}", comparator);
        };
        let mut seen: Vec<usize> = sorted.iter().map(|v| v.to_number() as usize).collect();
        seen.sort_unstable();
        assert_eq!(seen, items, "for: {}", comparator);
    }
}

#[test]
fn test_sort_comparator_nan_keeps_order() {
    test_array_expr("[3, 1, 2].sort((a, b) => 'x')", "[3, 1, 2]");
}

#[test]
fn test_sort_rejects_non_function() {
    expect_error("[2, 1].sort(1)", EvalError::argument_type("sort"));
}

#[test]
fn test_sort_does_not_mutate() {
    let scope = r#"{"items": [3, 1, 2]}"#;
    let result = eval_in(scope, "[items.sort(), items]").unwrap();
    assert_eq!(
        result,
        serde_json::from_str::<Value>("[[1, 2, 3], [3, 1, 2]]").unwrap()
    );
}

#[test]
fn test_splice() {
    test_array_expr("[1, 2, 3, 4].splice(1, 2)", "[1, 4]");
    test_array_expr("[1, 2, 3].splice(1, 0, 'x', 'y')", r#"[1, "x", "y", 2, 3]"#);
    test_array_expr("[1, 2, 3].splice(-1)", "[1, 2]");
    test_array_expr("[1, 2, 3].splice()", "[1, 2, 3]");
    test_array_expr("[1, 2, 3].splice(1, 99)", "[1]");
}

#[test]
fn test_splice_accepts_objects() {
    test_array_expr("[1].splice(1, 0, {a: 2})", r#"[1, {"a": 2}]"#);
}

#[test]
fn test_splice_does_not_mutate() {
    let scope = r#"{"items": [1, 2, 3]}"#;
    let result = eval_in(scope, "[items.splice(0, 1), items]").unwrap();
    assert_eq!(
        result,
        serde_json::from_str::<Value>("[[2, 3], [1, 2, 3]]").unwrap()
    );
}

// ============================================================================
// Argument policy
// ============================================================================

#[test]
fn test_objects_rejected_where_not_allowed() {
    expect_error("[1].includes({a: 1})", EvalError::argument_type("includes"));
    expect_error("[1].concat({a: 1})", EvalError::argument_type("concat"));
}

#[test]
fn test_lambda_where_value_expected() {
    expect_error("[1].includes(x => x)", EvalError::argument_type("includes"));
}

#[test]
fn test_methods_only_on_arrays() {
    expect_error("true.map(x => x)", EvalError::unsupported("map"));
    let obj = eval_in(r#"{"o": {"map": 1}}"#, "o.map(x => x)");
    assert_eq!(obj, Err(EvalError::unsupported("map")));
}
