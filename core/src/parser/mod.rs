mod syntax;
pub mod error;
pub mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use parser::{
    DEFAULT_MAX_DEPTH, ExpressionParser, MAX_NODES, Rule, minimum_node_count, parse,
    parse_with_max_depth,
};
pub use syntax::Span;

#[cfg(test)]
mod parse_test;


#[cfg(test)]
mod precedence_test;
