use crate::ast::{AstNode, AstNodeType, Literal};
use crate::parser::error::{ParseError, ParseErrorKind, convert_pest_error};
use crate::parser::syntax::Span;
use ecow::EcoString;
use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

/// Default nesting limit for brackets, braces, parentheses and ternaries.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Hard limit on the size of a parsed tree, in every mode.
pub const MAX_NODES: usize = 1_000;

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::ternary_op, Assoc::Right))   // `a ? b : c`
        .op(Op::infix(Rule::or, Assoc::Left))            // `||`
        .op(Op::infix(Rule::and, Assoc::Left))           // `&&`
        .op(
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::neq, Assoc::Left)
        )                                                // `==`, `!=`
        .op(
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left)
        )                                                // `<`, `<=`, `>`, `>=`
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                                // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::rem, Assoc::Left)
        )                                                // `*`, `/`, `%`
        .op(
            Op::prefix(Rule::not) |
            Op::prefix(Rule::neg) |
            Op::prefix(Rule::pos)
        )                                                // `!`, `-`, `+`

        // Postfix operators.
        .op(
            Op::postfix(Rule::method_call) |
            Op::postfix(Rule::member_dot) |
            Op::postfix(Rule::member_index)
        )                                                // `.f()`, `.x`, `[i]`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
pub struct ExpressionParser;

type PestError = pest::error::Error<Rule>;

/// Parses `source` into an AST rooted at an [`AstNodeType::Expression`] node.
pub fn parse(source: &str) -> Result<AstNode, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Like [`parse`], rejecting sources that nest deeper than `max_depth`.
///
/// Nesting and size are checked up front so that pathological inputs never
/// reach the recursive descent.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<AstNode, ParseError> {
    check_nesting_depth(source, max_depth).map_err(|e| convert_pest_error(e, source))?;

    let size = minimum_node_count(source);
    if size > MAX_NODES {
        return Err(ParseError::new(
            ParseErrorKind::TooLarge {
                size,
                max: MAX_NODES,
            },
            source.to_string(),
            Span(0..source.len()),
        ));
    }

    let mut pairs =
        ExpressionParser::parse(Rule::main, source).map_err(|e| convert_pest_error(e, source))?;
    let start = pest::Position::from_start(source);
    let main = pairs.next().ok_or_else(|| {
        convert_pest_error(custom_error("empty parse result", start.span(&start)), source)
    })?;

    let root = parse_node(main).map_err(|e| convert_pest_error(e, source))?;
    tracing::trace!(size = root.size(), "parsed expression");
    Ok(root)
}

/// A lower bound on the node count of the tree `source` parses to.
///
/// Every operand and every operator token becomes at least one node of its
/// own, plus the root. Runs in one pass without building anything, so huge
/// inputs can be rejected before parsing.
pub fn minimum_node_count(source: &str) -> usize {
    let bytes = source.as_bytes();
    let mut count = 1;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'"' | b'\'' => {
                i += 1;
                while i < bytes.len() && bytes[i] != c {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i += 1;
                count += 1;
            }
            b'0'..=b'9' => {
                i = skip_number(bytes, i);
                count += 1;
            }
            b'.' if bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                i = skip_number(bytes, i);
                count += 1;
            }
            c if c.is_ascii_alphabetic() || c == b'_' || c == b'$' => {
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
                {
                    i += 1;
                }
                count += 1;
            }
            _ => {
                let pair = bytes.get(i..i + 2);
                if matches!(
                    pair,
                    Some(
                        [b'&', b'&']
                            | [b'|', b'|']
                            | [b'=' | b'!' | b'<' | b'>', b'=']
                            | [b'=', b'>']
                    )
                ) {
                    i += 2;
                    count += 1;
                } else {
                    if matches!(c, b'!' | b'+' | b'-' | b'*' | b'/' | b'%' | b'<' | b'>' | b'?') {
                        count += 1;
                    }
                    i += 1;
                }
            }
        }
    }
    count
}

/// End of the number literal starting at `i`, exponent included.
fn skip_number(bytes: &[u8], mut i: usize) -> usize {
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    i = digits(i);
    if bytes.get(i) == Some(&b'.') {
        i = digits(i + 1);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(i + 1), Some(b'+' | b'-')));
        if bytes.get(i + 1 + sign).is_some_and(u8::is_ascii_digit) {
            i = digits(i + 1 + sign);
        }
    }
    i
}

/// Rejects sources whose brackets or ternaries nest deeper than `max_depth`.
///
/// A `?` opens a level that the matching `:` closes; both recurse in the
/// grammar just like brackets.
fn check_nesting_depth(source: &str, max_depth: usize) -> Result<(), PestError> {
    let mut open: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (pos, c) in source.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' | '?' => {
                open.push(c);
                if open.len() > max_depth {
                    let position = pest::Position::new(source, pos)
                        .unwrap_or_else(|| pest::Position::from_start(source));
                    return Err(PestError::new_from_pos(
                        pest::error::ErrorVariant::CustomError {
                            message: format!(
                                "Expression nesting depth exceeds maximum of {} levels",
                                max_depth
                            ),
                        },
                        position,
                    ));
                }
            }
            ':' => {
                if open.last() == Some(&'?') {
                    open.pop();
                }
            }
            ')' | ']' | '}' => {
                while open.last() == Some(&'?') {
                    open.pop();
                }
                open.pop();
            }
            _ => {}
        }
    }
    Ok(())
}

fn custom_error(message: &str, span: pest::Span<'_>) -> PestError {
    PestError::new_from_span(
        pest::error::ErrorVariant::CustomError {
            message: message.to_string(),
        },
        span,
    )
}

fn next_inner<'a>(pairs: &mut pest::iterators::Pairs<'a, Rule>, span: pest::Span<'a>) -> Result<Pair<'a, Rule>, PestError> {
    pairs
        .next()
        .ok_or_else(|| custom_error("missing expected pair in rule", span))
}

fn parse_node(pair: Pair<Rule>) -> Result<AstNode, PestError> {
    match pair.as_rule() {
        Rule::main => {
            let span = pair.as_span();
            let expr = next_inner(&mut pair.into_inner(), span)?;
            Ok(AstNode::new(AstNodeType::Expression, vec![parse_node(expr)?]))
        }

        Rule::expression => PRATT_PARSER
            .map_primary(parse_node)
            .map_prefix(|op, rhs| {
                let kind = match op.as_rule() {
                    Rule::not => AstNodeType::Not,
                    Rule::neg => AstNodeType::UnaryMinus,
                    Rule::pos => AstNodeType::UnaryPlus,
                    _ => unreachable!("Unknown prefix operator: {:?}", op.as_rule()),
                };
                Ok(AstNode::new(kind, vec![rhs?]))
            })
            .map_infix(|lhs, op, rhs| {
                let kind = match op.as_rule() {
                    Rule::ternary_op => {
                        let span = op.as_span();
                        let then = parse_node(next_inner(&mut op.into_inner(), span)?)?;
                        return Ok(AstNode::new(AstNodeType::Ternary, vec![lhs?, then, rhs?]));
                    }
                    Rule::or => AstNodeType::LogicalOr,
                    Rule::and => AstNodeType::LogicalAnd,
                    Rule::eq => AstNodeType::Equal,
                    Rule::neq => AstNodeType::NotEqual,
                    Rule::lt => AstNodeType::Less,
                    Rule::le => AstNodeType::LessOrEqual,
                    Rule::gt => AstNodeType::Greater,
                    Rule::ge => AstNodeType::GreaterOrEqual,
                    Rule::add => AstNodeType::Plus,
                    Rule::sub => AstNodeType::Minus,
                    Rule::mul => AstNodeType::Multiply,
                    Rule::div => AstNodeType::Divide,
                    Rule::rem => AstNodeType::Modulo,
                    _ => unreachable!("Unknown binary operator: {:?}", op.as_rule()),
                };
                Ok(AstNode::new(kind, vec![lhs?, rhs?]))
            })
            .map_postfix(|lhs, op| {
                let span = op.as_span();
                match op.as_rule() {
                    Rule::method_call => {
                        let mut inner = op.into_inner();
                        let name = next_inner(&mut inner, span)?;
                        let args = parse_call_args(next_inner(&mut inner, span)?)?;
                        Ok(AstNode::named(
                            AstNodeType::Invocation,
                            vec![lhs?, args],
                            name.as_str(),
                        ))
                    }
                    Rule::member_dot => {
                        let name = next_inner(&mut op.into_inner(), span)?;
                        let member = AstNode::named(AstNodeType::Member, vec![], name.as_str());
                        Ok(AstNode::new(AstNodeType::MemberAccess, vec![lhs?, member]))
                    }
                    Rule::member_index => {
                        let index = parse_node(next_inner(&mut op.into_inner(), span)?)?;
                        let member = AstNode::new(AstNodeType::Member, vec![index]);
                        Ok(AstNode::new(AstNodeType::MemberAccess, vec![lhs?, member]))
                    }
                    _ => unreachable!("Unknown postfix operator: {:?}", op.as_rule()),
                }
            })
            .parse(pair.into_inner()),

        Rule::grouped => {
            let span = pair.as_span();
            parse_node(next_inner(&mut pair.into_inner(), span)?)
        }

        Rule::invocation => {
            let span = pair.as_span();
            let mut inner = pair.into_inner();
            let name = next_inner(&mut inner, span)?;
            let args = parse_call_args(next_inner(&mut inner, span)?)?;
            Ok(AstNode::named(
                AstNodeType::Invocation,
                vec![args],
                name.as_str(),
            ))
        }

        Rule::array_literal => {
            let items = pair
                .into_inner()
                .map(parse_node)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(wrap_list(AstNodeType::ArrayLiteral, AstNodeType::Array, items))
        }

        Rule::object_literal => {
            let entries = pair
                .into_inner()
                .map(parse_key_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(wrap_list(AstNodeType::ObjectLiteral, AstNodeType::Object, entries))
        }

        Rule::ident => Ok(AstNode::named(AstNodeType::Variable, vec![], pair.as_str())),

        Rule::number | Rule::string | Rule::boolean | Rule::null => {
            Ok(AstNode::literal(parse_literal(pair)?))
        }

        rule => Err(custom_error(
            &format!("unexpected rule {:?}", rule),
            pair.as_span(),
        )),
    }
}

/// `[]` for an empty list, otherwise `[list[items...]]`.
fn wrap_list(outer: AstNodeType, list: AstNodeType, items: Vec<AstNode>) -> AstNode {
    if items.is_empty() {
        AstNode::new(outer, vec![])
    } else {
        AstNode::new(outer, vec![AstNode::new(list, items)])
    }
}

fn parse_call_args(pair: Pair<Rule>) -> Result<AstNode, PestError> {
    let items = pair
        .into_inner()
        .map(|arg| match arg.as_rule() {
            Rule::arrow_function => parse_arrow_function(arg),
            _ => parse_node(arg),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(wrap_list(AstNodeType::Args, AstNodeType::Array, items))
}

fn parse_arrow_function(pair: Pair<Rule>) -> Result<AstNode, PestError> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let params = next_inner(&mut inner, span)?
        .into_inner()
        .map(|p| AstNode::named(AstNodeType::Variable, vec![], p.as_str()))
        .collect();
    let body = parse_node(next_inner(&mut inner, span)?)?;
    Ok(AstNode::new(
        AstNodeType::ArrowFunction,
        vec![AstNode::new(AstNodeType::Array, params), body],
    ))
}

fn parse_key_value(pair: Pair<Rule>) -> Result<AstNode, PestError> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let key_pair = next_inner(&mut inner, span)?;
    let key = match key_pair.as_rule() {
        Rule::computed_key => {
            let key_span = key_pair.as_span();
            parse_node(next_inner(&mut key_pair.into_inner(), key_span)?)?
        }
        // Identifiers and literal keys are taken verbatim.
        Rule::ident | Rule::number | Rule::boolean | Rule::null => {
            AstNode::literal(Literal::String(key_pair.as_str().into()))
        }
        _ => AstNode::literal(parse_literal(key_pair)?),
    };
    let value = parse_node(next_inner(&mut inner, span)?)?;
    Ok(AstNode::new(AstNodeType::KeyValue, vec![key, value]))
}

fn parse_literal(pair: Pair<Rule>) -> Result<Literal, PestError> {
    match pair.as_rule() {
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(Literal::Number)
            .map_err(|_| custom_error("invalid number literal", pair.as_span())),
        Rule::string => {
            let span = pair.as_span();
            let body = next_inner(&mut pair.into_inner(), span)?;
            Ok(Literal::String(unescape(body.as_str())))
        }
        Rule::boolean => Ok(Literal::Bool(pair.as_str() == "true")),
        Rule::null => Ok(Literal::Null),
        rule => Err(custom_error(
            &format!("expected literal, found {:?}", rule),
            pair.as_span(),
        )),
    }
}

/// Resolves backslash escapes. Unknown escapes yield the escaped character.
fn unescape(raw: &str) -> EcoString {
    let mut out = EcoString::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
