use crate::ast::AstNode;

use super::parser::parse;

// We test precedence by comparing whether two expressions parenthesized in
// different ways yield the same AST.
fn ast(source: &str) -> AstNode {
    parse(source).unwrap_or_else(|e| panic!("Expression parsing failed: {}\n{}", source, e))
}

#[test]
fn test_addition_vs_subtraction() {
    assert_eq!(ast("a + b - c"), ast("(a + b) - c"));
    assert_eq!(ast("a - b + c"), ast("(a - b) + c"));
    assert_eq!(
        ast("a + b - c + d - e + f"),
        ast("((((a + b) - c) + d) - e) + f")
    );
}

#[test]
fn test_multiplicative_operators() {
    assert_eq!(ast("a * b / c % d"), ast("((a * b) / c) % d"));
    assert_eq!(ast("a + b * c"), ast("a + (b * c)"));
    assert_eq!(ast("a % b - c"), ast("(a % b) - c"));
}

#[test]
fn test_comparison_vs_arithmetic() {
    assert_eq!(ast("a + 1 < b * 2"), ast("(a + 1) < (b * 2)"));
    assert_eq!(ast("a < b == c >= d"), ast("(a < b) == (c >= d)"));
}

#[test]
fn test_and_vs_or() {
    assert_eq!(ast("a && b || c"), ast("(a && b) || c"));
    assert_eq!(ast("a || b && c"), ast("a || (b && c)"));
    assert_eq!(ast("a == b && c != d"), ast("(a == b) && (c != d)"));
}

#[test]
fn test_unary_vs_binary() {
    assert_eq!(ast("-a + b"), ast("(-a) + b"));
    assert_eq!(ast("!a && b"), ast("(!a) && b"));
    assert_eq!(ast("-a * -b"), ast("(-a) * (-b)"));
}

#[test]
fn test_unary_vs_member_access() {
    assert_eq!(ast("-a.b"), ast("-(a.b)"));
    assert_eq!(ast("!a[0]"), ast("!(a[0])"));
    assert_eq!(ast("-a.abs()"), ast("-(a.abs())"));
}

#[test]
fn test_ternary_is_lowest_and_right_associative() {
    assert_eq!(ast("a || b ? c : d"), ast("(a || b) ? c : d"));
    assert_eq!(ast("a ? b : c ? d : e"), ast("a ? b : (c ? d : e)"));
    assert_eq!(ast("a ? b + 1 : c"), ast("a ? (b + 1) : c"));
}

#[test]
fn test_postfix_chains_left_to_right() {
    assert_eq!(ast("a.b.c"), ast("(a.b).c"));
    assert_eq!(ast("a[0].map(x => x)"), ast("(a[0]).map(x => x)"));
}
