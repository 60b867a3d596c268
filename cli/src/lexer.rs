use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("true")]
    #[token("false")]
    #[token("null")]
    Constant,

    #[regex(r"(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")]
    Number,

    // Strict Double Quote String (must end with ")
    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    StringDouble,

    // Strict Single Quote String (must end with ')
    #[regex(r#"'(?:[^'\\]|\\.)*'"#)]
    StringSingle,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    #[token("=>")]
    Arrow,

    #[regex(r"[-+*/%!<>=&|?:.,]")]
    Operator,
}

pub fn calculate_depth(buffer: &str) -> Option<usize> {
    let mut depth: isize = 0;

    for token_res in Token::lexer(buffer) {
        match token_res {
            Ok(Token::LBrace) | Ok(Token::LBracket) | Ok(Token::LParen) => depth += 1,
            Ok(Token::RBrace) | Ok(Token::RBracket) | Ok(Token::RParen) => depth -= 1,

            Ok(_) => {}

            // Unclosed string or unknown character.
            Err(_) => {
                return None;
            }
        }
    }

    if depth < 0 {
        Some(0)
    } else {
        Some(depth as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth() {
        assert_eq!(calculate_depth("1 + 2"), Some(0));
        assert_eq!(calculate_depth("[1, (2"), Some(2));
        assert_eq!(calculate_depth("{a: [1]}"), Some(0));
        assert_eq!(calculate_depth(")"), Some(0));
    }

    #[test]
    fn test_brackets_inside_strings() {
        assert_eq!(calculate_depth("'(' + \"[\""), Some(0));
        assert_eq!(calculate_depth("'unclosed"), None);
    }

    #[test]
    fn test_tokens() {
        let tokens: Vec<_> = Token::lexer("x => null || 1.5e3")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident,
                Token::Arrow,
                Token::Constant,
                Token::Operator,
                Token::Operator,
                Token::Number,
            ]
        );
    }
}
