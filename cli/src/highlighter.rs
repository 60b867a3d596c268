use logos::Logos;
use nu_ansi_term::{Color, Style};
use reedline::{StyledText, ValidationResult, Validator};

use crate::lexer::{Token, calculate_depth};

fn color_of(token: Token) -> Color {
    match token {
        Token::Constant | Token::Number => Color::Cyan,
        Token::StringDouble | Token::StringSingle => Color::Green,
        Token::Ident => Color::Red,
        Token::Arrow => Color::Magenta,
        Token::Operator
        | Token::LBrace
        | Token::RBrace
        | Token::LBracket
        | Token::RBracket
        | Token::LParen
        | Token::RParen => Color::White,
    }
}

pub struct Highlighter;

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let mut output = StyledText::new();
        let plain = Style::new().fg(Color::White);
        let mut curr_end = 0;

        let mut lexer = Token::lexer(line).spanned().peekable();
        while let Some((token, span)) = lexer.next() {
            if span.start > curr_end {
                output.push((plain, line[curr_end..span.start].to_string()));
            }
            let Ok(token) = token else {
                output.push((plain, line[span.start..].to_string()));
                return output;
            };
            // Identifiers directly followed by `(` are calls.
            let fg = match (token, lexer.peek()) {
                (Token::Ident, Some((Ok(Token::LParen), _))) => Color::Blue,
                _ => color_of(token),
            };
            output.push((Style::new().fg(fg), line[span.clone()].to_string()));
            curr_end = span.end;
        }
        if curr_end < line.len() {
            output.push((plain, line[curr_end..].to_string()));
        }

        output
    }
}

/// Keeps reading lines while brackets are open.
pub struct BracketValidator;

impl Validator for BracketValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        match calculate_depth(line) {
            Some(depth) if depth > 0 => ValidationResult::Incomplete,
            _ => ValidationResult::Complete,
        }
    }
}
