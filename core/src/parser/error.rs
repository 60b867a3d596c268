use crate::api::{Diagnostic, Severity};
use crate::parser::{Rule, Span};

/// Parser error with the offending source attached.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub source: String,
    pub span: Span,
    /// Rendered location snippet, when available.
    pub detail: String,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Unexpected token
    UnexpectedToken { expected: String, found: String },
    /// Unclosed string, bracket or parenthesis
    UnclosedDelimiter { delimiter: char },
    /// Invalid number literal
    InvalidNumber { text: String },
    /// Maximum nesting depth exceeded
    MaxDepthExceeded { max_depth: usize },
    /// The tree would have more nodes than any expression may have
    TooLarge { size: usize, max: usize },
    /// Other parse errors (catch-all for Pest errors we don't specifically handle)
    Other { message: String },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, source: String, span: Span) -> Self {
        Self {
            kind,
            source,
            span,
            detail: String::new(),
        }
    }

    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = detail;
        self
    }

    /// Convert to a Diagnostic for the API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (message, code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => (
                format!("Expected {}, found {}", expected, found),
                "P001",
                vec![],
            ),
            ParseErrorKind::UnclosedDelimiter { delimiter } => (
                format!("Unclosed delimiter '{}'", delimiter),
                "P002",
                vec!["Add the missing closing delimiter".to_string()],
            ),
            ParseErrorKind::InvalidNumber { text } => (
                format!("Invalid number literal '{}'", text),
                "P003",
                vec![],
            ),
            ParseErrorKind::MaxDepthExceeded { max_depth } => (
                format!(
                    "Expression nesting depth exceeds maximum of {} levels",
                    max_depth
                ),
                "P004",
                vec!["Reduce nesting or simplify the expression".to_string()],
            ),
            ParseErrorKind::TooLarge { size, max } => (
                format!("Expression has at least {} nodes, more than the limit of {}", size, max),
                "P005",
                vec![],
            ),
            ParseErrorKind::Other { message } => (message.clone(), "P999", vec![]),
        };

        Diagnostic {
            severity: Severity::Error,
            message,
            span: self.span.clone(),
            help,
            code: Some(code.to_string()),
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let diagnostic = self.to_diagnostic();
        write!(
            f,
            "Failed to parse \"{}\" at offset {}: {}",
            self.source, self.span.0.start, diagnostic.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Convert a Pest error into a ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    use pest::error::ErrorVariant;

    let detail = err.to_string();
    let span = match err.location {
        pest::error::InputLocation::Pos(pos) => Span(pos..pos),
        pest::error::InputLocation::Span((start, end)) => Span(start..end),
    };

    let kind = match err.variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => {
            if let Some(delimiter) = unclosed_delimiter(source) {
                ParseErrorKind::UnclosedDelimiter { delimiter }
            } else {
                ParseErrorKind::UnexpectedToken {
                    expected: format_expected_rules(&positives),
                    found: format_found(&negatives, source, span.0.start),
                }
            }
        }
        ErrorVariant::CustomError { message } => {
            if message.contains("nesting depth") {
                match extract_number_after(&message, "maximum of") {
                    Some(max_depth) => ParseErrorKind::MaxDepthExceeded { max_depth },
                    None => ParseErrorKind::Other { message },
                }
            } else if message.contains("invalid number") {
                ParseErrorKind::InvalidNumber {
                    text: span.str_of(source).to_string(),
                }
            } else {
                ParseErrorKind::Other { message }
            }
        }
    };

    ParseError::new(kind, source.to_string(), span).with_detail(detail)
}

/// Returns the innermost opener left unbalanced at end of input, if any.
fn unclosed_delimiter(source: &str) -> Option<char> {
    let mut stack = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in source.chars() {
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
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                stack.pop();
            }
            _ => {}
        }
    }
    quote.or_else(|| stack.pop())
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    let mut concepts: Vec<&str> = Vec::new();

    for rule in rules {
        let concept = match rule {
            Rule::number | Rule::string | Rule::boolean | Rule::null => "literal",
            Rule::ident => "identifier",
            Rule::EOI => "end of input",
            Rule::eq
            | Rule::neq
            | Rule::lt
            | Rule::le
            | Rule::gt
            | Rule::ge
            | Rule::add
            | Rule::sub
            | Rule::mul
            | Rule::div
            | Rule::rem
            | Rule::and
            | Rule::or
            | Rule::ternary_op => "operator",
            Rule::method_call | Rule::member_dot | Rule::member_index => "member access",
            _ => "expression",
        };
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }

    match concepts.split_last() {
        None => "something else".to_string(),
        Some((only, [])) => only.to_string(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

fn format_found(rules: &[Rule], source: &str, pos: usize) -> String {
    if let Some(rule) = rules.first() {
        return format!("{:?}", rule);
    }
    match source.get(pos..).and_then(|rest| rest.chars().next()) {
        Some(c) => format!("'{}'", c),
        None => "end of input".to_string(),
    }
}

/// Extract the number that follows `keyword` in `message`.
fn extract_number_after(message: &str, keyword: &str) -> Option<usize> {
    let pos = message.find(keyword)?;
    let digits: String = message[pos + keyword.len()..]
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_to_diagnostic() {
        let error = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: "expression".to_string(),
                found: "','".to_string(),
            },
            "test source".to_string(),
            Span(10..20),
        );

        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.severity, Severity::Error);
        assert!(diagnostic.message.contains("Expected expression"));
        assert_eq!(diagnostic.code, Some("P001".to_string()));
    }

    #[test]
    fn test_format_expected_rules() {
        assert_eq!(format_expected_rules(&[Rule::number, Rule::string]), "literal");
        assert_eq!(
            format_expected_rules(&[Rule::ident, Rule::EOI]),
            "identifier or end of input"
        );
        assert_eq!(format_expected_rules(&[]), "something else");
    }

    #[test]
    fn test_unclosed_delimiter() {
        assert_eq!(unclosed_delimiter("foo(1, [2"), Some('['));
        assert_eq!(unclosed_delimiter("'abc"), Some('\''));
        assert_eq!(unclosed_delimiter("a.b(')')"), None);
    }

    #[test]
    fn test_depth_error_conversion() {
        let pest_err = pest::error::Error::<Rule>::new_from_pos(
            pest::error::ErrorVariant::CustomError {
                message: "Expression nesting depth exceeds maximum of 500 levels".to_string(),
            },
            pest::Position::from_start("test"),
        );

        let parse_err = convert_pest_error(pest_err, "test");
        assert_eq!(
            parse_err.kind,
            ParseErrorKind::MaxDepthExceeded { max_depth: 500 }
        );
    }
}
