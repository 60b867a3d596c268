use crate::ast::{AstNode, AstNodeType as T, Literal};
use crate::parser::{MAX_NODES, ParseErrorKind, minimum_node_count, parse, parse_with_max_depth};
use pretty_assertions::assert_eq;

fn body(source: &str) -> AstNode {
    let root = parse(source).unwrap_or_else(|e| panic!("failed to parse {}: {}", source, e));
    assert_eq!(root.kind, T::Expression);
    assert_eq!(root.args.len(), 1);
    root.args.into_iter().next().unwrap()
}

fn var(name: &str) -> AstNode {
    AstNode::named(T::Variable, vec![], name)
}

fn num(n: f64) -> AstNode {
    AstNode::literal(Literal::Number(n))
}

fn string(s: &str) -> AstNode {
    AstNode::literal(Literal::String(s.into()))
}

#[test]
fn test_literals() {
    assert_eq!(body("42"), num(42.0));
    assert_eq!(body(".5"), num(0.5));
    assert_eq!(body("1e3"), num(1000.0));
    assert_eq!(body("true"), AstNode::literal(Literal::Bool(true)));
    assert_eq!(body("null"), AstNode::literal(Literal::Null));
    assert_eq!(body("'a\\'b'"), string("a'b"));
    assert_eq!(body("\"line\\nbreak\""), string("line\nbreak"));
}

#[test]
fn test_keyword_prefixed_identifier_is_variable() {
    assert_eq!(body("nullable"), var("nullable"));
    assert_eq!(body("trueValue"), var("trueValue"));
}

#[test]
fn test_free_invocation() {
    assert_eq!(
        body("max(1, x)"),
        AstNode::named(
            T::Invocation,
            vec![AstNode::new(T::Args, vec![AstNode::new(T::Array, vec![num(1.0), var("x")])])],
            "max"
        )
    );
    assert_eq!(
        body("random()"),
        AstNode::named(T::Invocation, vec![AstNode::new(T::Args, vec![])], "random")
    );
}

#[test]
fn test_method_invocation_with_arrow_function() {
    let arrow = AstNode::new(
        T::ArrowFunction,
        vec![
            AstNode::new(T::Array, vec![var("x")]),
            AstNode::new(T::Plus, vec![var("x"), num(1.0)]),
        ],
    );
    assert_eq!(
        body("items.map(x => x + 1)"),
        AstNode::named(
            T::Invocation,
            vec![var("items"), AstNode::new(T::Args, vec![AstNode::new(T::Array, vec![arrow])])],
            "map"
        )
    );
}

#[test]
fn test_arrow_function_parameter_lists() {
    let parsed = body("a.reduce((acc, x) => acc + x, 0)");
    let args = &parsed.args[1].args[0].args;
    assert_eq!(args.len(), 2);
    assert_eq!(args[0].kind, T::ArrowFunction);
    assert_eq!(args[0].args[0].args, vec![var("acc"), var("x")]);

    let parsed = body("a.filter(() => true)");
    assert_eq!(parsed.args[1].args[0].args[0].args[0].args, vec![]);
}

#[test]
fn test_arrow_function_outside_arguments_is_rejected() {
    assert!(parse("x => x").is_err());
    assert!(parse("[x => x]").is_err());
}

#[test]
fn test_member_access() {
    assert_eq!(
        body("a.b"),
        AstNode::new(
            T::MemberAccess,
            vec![var("a"), AstNode::named(T::Member, vec![], "b")]
        )
    );
    assert_eq!(
        body("a[0]"),
        AstNode::new(
            T::MemberAccess,
            vec![var("a"), AstNode::new(T::Member, vec![num(0.0)])]
        )
    );
}

#[test]
fn test_array_literal() {
    assert_eq!(body("[]"), AstNode::new(T::ArrayLiteral, vec![]));
    assert_eq!(
        body("[1, 'a',]"),
        AstNode::new(
            T::ArrayLiteral,
            vec![AstNode::new(T::Array, vec![num(1.0), string("a")])]
        )
    );
}

#[test]
fn test_object_literal_keys() {
    let kv = |k: AstNode, v: AstNode| AstNode::new(T::KeyValue, vec![k, v]);
    assert_eq!(body("{}"), AstNode::new(T::ObjectLiteral, vec![]));
    assert_eq!(
        body("{a: 1, 'b c': 2, 3: 4, [k]: 5}"),
        AstNode::new(
            T::ObjectLiteral,
            vec![AstNode::new(
                T::Object,
                vec![
                    kv(string("a"), num(1.0)),
                    kv(string("b c"), num(2.0)),
                    kv(string("3"), num(4.0)),
                    kv(var("k"), num(5.0)),
                ]
            )]
        )
    );
}

#[test]
fn test_ternary() {
    assert_eq!(
        body("a ? 1 : 2"),
        AstNode::new(T::Ternary, vec![var("a"), num(1.0), num(2.0)])
    );
}

#[test]
fn test_unary_operators() {
    assert_eq!(body("-x"), AstNode::new(T::UnaryMinus, vec![var("x")]));
    assert_eq!(body("+x"), AstNode::new(T::UnaryPlus, vec![var("x")]));
    assert_eq!(
        body("!!x"),
        AstNode::new(T::Not, vec![AstNode::new(T::Not, vec![var("x")])])
    );
}

#[test]
fn test_syntax_errors() {
    for source in ["", "1 +", "a.", "foo(", "a = 1", "{a 1}", "1 2", "a ? b"] {
        assert!(parse(source).is_err(), "expected error for {:?}", source);
    }
}

#[test]
fn test_unclosed_delimiter_is_reported() {
    let err = parse("foo(1, [2").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnclosedDelimiter { delimiter: '[' });
}

#[test]
fn test_max_depth() {
    let nested = format!("{}1{}", "(".repeat(10), ")".repeat(10));
    assert!(parse_with_max_depth(&nested, 10).is_ok());
    let err = parse_with_max_depth(&nested, 9).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MaxDepthExceeded { max_depth: 9 });
}

#[test]
fn test_brackets_inside_strings_do_not_count_towards_depth() {
    assert!(parse_with_max_depth("'(((((' + x", 1).is_ok());
}

#[test]
fn test_nested_ternaries_count_towards_depth() {
    let nested = format!("{}1{}", "a ? ".repeat(10), " : 2".repeat(10));
    assert!(parse_with_max_depth(&nested, 10).is_ok());
    let err = parse_with_max_depth(&nested, 9).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MaxDepthExceeded { max_depth: 9 });

    // A chain in the else branch stays shallow, as do object colons.
    let chain = format!("{}1", "a ? 1 : ".repeat(20));
    assert!(parse_with_max_depth(&chain, 2).is_ok());
    assert!(parse_with_max_depth("a ? {x: 1, y: b ? 2 : 3} : 4", 3).is_ok());
}

#[test]
fn test_oversized_sources_are_rejected_before_parsing() {
    let source = format!("{}1", "-".repeat(20_000));
    let err = parse(&source).unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::TooLarge {
            size: 20_002,
            max: MAX_NODES
        }
    );
}

#[test]
fn test_minimum_node_count_is_a_lower_bound() {
    for source in [
        "1",
        "-1.5e-3 + .5",
        "a.b[c] * f(1, 'x\\'y')",
        "items.map((x, i) => x + i).sort()",
        "{a: 1, 'b': [2, 3], [k]: !v}",
        "x >= 1 && y != 2 || z ? 'yes' : null",
        "true == false",
    ] {
        let actual = parse(source).unwrap().size();
        let bound = minimum_node_count(source);
        assert!(bound <= actual, "{}: {} > {}", source, bound, actual);
    }
    assert_eq!(minimum_node_count("1 + 2"), 4);
    assert_eq!(minimum_node_count("'a + b'"), 2);
}
