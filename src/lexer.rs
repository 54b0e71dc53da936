use logos::{Lexer, Logos};
use std::fmt;
use thiserror::Error;

use crate::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip whitespace
#[logos(skip r";[^\n]*")] // Skip comments, the newline itself is still a token
#[logos(error = LexerErrorKind)]
pub enum TokenKind {
    #[token("\n")]
    Newline,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(".")]
    Dot,
    #[token("'")]
    Quote,
    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*", name)]
    Name(String),
    #[regex(r"[-+]?[0-9]+", number)]
    Number(i64),
    #[regex(r#""([^"\\]|\\(.|\n))*"?"#, string)]
    Str(String),
    // Anything else is a one-character token; a sign not followed by a digit lands here.
    #[regex(r".", callback = |lex| lex.slice().chars().next(), priority = 0)]
    Char(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Names and numbers must be followed by a delimiter: `3foo` is rejected,
/// not split in two.
fn expect_delimiter(lex: &Lexer<TokenKind>) -> LexerResult<()> {
    match lex.remainder().chars().next() {
        None | Some(' ' | '\t' | '\r' | '\n' | '(' | ')' | '.') => Ok(()),
        Some(_) => Err(LexerErrorKind::InvalidTokenAfter(lex.slice().to_string())),
    }
}

fn name(lex: &mut Lexer<TokenKind>) -> LexerResult<String> {
    expect_delimiter(lex)?;
    Ok(lex.slice().to_string())
}

fn number(lex: &mut Lexer<TokenKind>) -> LexerResult<i64> {
    expect_delimiter(lex)?;
    let slice = lex.slice();
    slice
        .parse::<i64>()
        .map_err(|_| LexerErrorKind::InvalidNumber(slice.to_string()))
}

fn string(lex: &mut Lexer<TokenKind>) -> LexerResult<String> {
    unescape::unescape(&lex.slice()[1..])
}

mod unescape {
    use super::{LexerErrorKind, LexerResult};

    // A backslash keeps the following character verbatim. `body` starts just
    // after the opening quote; the string is terminated by the first bare quote.
    pub fn unescape(body: &str) -> LexerResult<String> {
        let mut result = String::with_capacity(body.len());
        let mut chars = body.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => result.push(escaped),
                    None => return Err(LexerErrorKind::UnterminatedString),
                },
                '"' => return Ok(result),
                c => result.push(c),
            }
        }
        Err(LexerErrorKind::UnterminatedString)
    }
}

// Implement Display for easy printing
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Quote => write!(f, "'"),
            TokenKind::Name(s) => write!(f, "{}", s),
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Str(s) => write!(f, "\"{}\"", s), // Display with quotes for clarity
            TokenKind::Char(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Error, Default, Debug, Clone, PartialEq)]
pub enum LexerErrorKind {
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Invalid number syntax: '{0}'")]
    InvalidNumber(String),
    #[error("Invalid token after {0}")]
    InvalidTokenAfter(String),
    #[default]
    #[error("Invalid Token")]
    InvalidToken,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct LexerError {
    pub error: LexerErrorKind,
    pub span: Span,
}

// Result type alias for convenience
type LexerResult<T> = Result<T, LexerErrorKind>;

// Result type alias for convenience
type LexerRangedResult<T> = Result<T, LexerError>;

// Helper function to tokenize a string directly (useful for tests and parser)
pub fn tokenize(input: &str) -> LexerRangedResult<Vec<Token>> {
    TokenKind::lexer(input)
        .spanned() // This yields Result<(TokenKind, Range<usize>), LexerError>
        .map(|(result, range)| match result {
            Ok(kind) => Ok(Token {
                kind,
                span: range.into(),
            }),
            Err(error) => Err(LexerError {
                error,
                span: range.into(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper to simplify testing token sequences
    fn assert_tokens(input: &str, expected: Vec<TokenKind>) {
        match tokenize(input) {
            Ok(tokens) => {
                let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
                assert_eq!(kinds, expected, "Input: '{}'", input);
            }
            Err(e) => panic!("Lexing failed for input '{}': {}", input, e.error),
        }
    }

    // Helper to simplify testing for lexer errors
    fn assert_lexer_error(input: &str, expected_error: LexerErrorKind) {
        match tokenize(input) {
            Ok(tokens) => panic!(
                "Expected lexing to fail for input '{}', but got tokens: {:?}",
                input, tokens
            ),
            Err(e) => assert_eq!(e.error, expected_error, "Input: '{}'", input),
        }
    }

    fn name(s: &str) -> TokenKind {
        TokenKind::Name(s.to_string())
    }

    #[test]
    fn test_empty_input() {
        assert_tokens("", vec![]);
        assert_tokens("   \t ", vec![]);
    }

    #[test]
    fn test_parentheses_dot_and_quote() {
        assert_tokens("()", vec![TokenKind::LParen, TokenKind::RParen]);
        assert_tokens("( )", vec![TokenKind::LParen, TokenKind::RParen]);
        assert_tokens(" ' ", vec![TokenKind::Quote]);
        assert_tokens(
            "(a . b)",
            vec![
                TokenKind::LParen,
                name("a"),
                TokenKind::Dot,
                name("b"),
                TokenKind::RParen,
            ],
        );
        assert_tokens(
            "'(a)",
            vec![
                TokenKind::Quote,
                TokenKind::LParen,
                name("a"),
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_names() {
        assert_tokens("upa", vec![name("upa")]);
        assert_tokens("_tmp", vec![name("_tmp")]);
        assert_tokens("si2", vec![name("si2")]);
        assert_tokens("UNTA", vec![name("UNTA")]);
        assert_tokens("ñandú", vec![name("ñandú")]);
    }

    #[test]
    fn test_numbers() {
        assert_tokens("123", vec![TokenKind::Number(123)]);
        assert_tokens("-45", vec![TokenKind::Number(-45)]);
        assert_tokens("+10", vec![TokenKind::Number(10)]);
        assert_tokens("0", vec![TokenKind::Number(0)]);
    }

    #[test]
    fn test_sign_without_digit_is_a_char() {
        assert_tokens("-", vec![TokenKind::Char('-')]);
        assert_tokens("+ x", vec![TokenKind::Char('+'), name("x")]);
        assert_tokens("-x", vec![TokenKind::Char('-'), name("x")]);
    }

    #[test]
    fn test_fallback_chars() {
        assert_tokens(
            "* # ?",
            vec![
                TokenKind::Char('*'),
                TokenKind::Char('#'),
                TokenKind::Char('?'),
            ],
        );
    }

    #[test]
    fn test_number_then_dot() {
        assert_tokens(
            "1.5",
            vec![
                TokenKind::Number(1),
                TokenKind::Dot,
                TokenKind::Number(5),
            ],
        );
    }

    #[test]
    fn test_strings() {
        assert_tokens(
            r#""ohla odomu!""#,
            vec![TokenKind::Str("ohla odomu!".to_string())],
        );
        assert_tokens(r#""""#, vec![TokenKind::Str(String::new())]);
        // Backslash keeps the next character verbatim
        assert_tokens(
            r#""a\"b\\c\n""#,
            vec![TokenKind::Str(r#"a"b\cn"#.to_string())],
        );
        assert_tokens(
            "\"two\nlines\"",
            vec![TokenKind::Str("two\nlines".to_string())],
        );
    }

    #[test]
    fn test_newlines_are_tokens() {
        assert_tokens(
            "a\nb",
            vec![name("a"), TokenKind::Newline, name("b")],
        );
    }

    #[test]
    fn test_comments() {
        let input = "
            (upa 1 2) ; Pair up
            ; Another comment line
            (lawa x)";
        assert_tokens(
            input,
            vec![
                TokenKind::Newline,
                TokenKind::LParen,
                name("upa"),
                TokenKind::Number(1),
                TokenKind::Number(2),
                TokenKind::RParen,
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::LParen,
                name("lawa"),
                name("x"),
                TokenKind::RParen,
            ],
        );
        assert_tokens("; only comment", vec![]);
        assert_tokens("token ; then comment", vec![name("token")]);
    }

    #[test]
    fn test_delimiters_after_atoms() {
        assert_tokens(
            "(a)(b)",
            vec![
                TokenKind::LParen,
                name("a"),
                TokenKind::RParen,
                TokenKind::LParen,
                name("b"),
                TokenKind::RParen,
            ],
        );
        assert_tokens("a.b", vec![name("a"), TokenKind::Dot, name("b")]);
    }

    #[test]
    fn test_adjacent_tokens_are_rejected() {
        assert_lexer_error("3foo", LexerErrorKind::InvalidTokenAfter("3".to_string()));
        assert_lexer_error("a-1", LexerErrorKind::InvalidTokenAfter("a".to_string()));
        assert_lexer_error("abc'd", LexerErrorKind::InvalidTokenAfter("abc".to_string()));
        assert_lexer_error(
            "12\"x\"",
            LexerErrorKind::InvalidTokenAfter("12".to_string()),
        );
    }

    #[test]
    fn test_number_overflow() {
        assert_lexer_error(
            "99999999999999999999",
            LexerErrorKind::InvalidNumber("99999999999999999999".to_string()),
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_lexer_error(r#""hellox"#, LexerErrorKind::UnterminatedString);
        assert_lexer_error(r#""hello\""#, LexerErrorKind::UnterminatedString);
        assert_lexer_error(r#"""#, LexerErrorKind::UnterminatedString);
        assert_lexer_error(r#"(a "b"#, LexerErrorKind::UnterminatedString);
    }

    #[test]
    fn test_tokenize_spans() {
        // Verify spans manually for a simple case
        let input = "(celi 1)";
        let tokens = tokenize(input).expect("Should tokenize successfully");

        assert_eq!(tokens.len(), 4);

        assert_eq!(tokens[0].kind, TokenKind::LParen);
        assert_eq!(tokens[0].span, Span { start: 0, end: 1 });

        assert_eq!(tokens[1].kind, name("celi"));
        assert_eq!(tokens[1].span, Span { start: 1, end: 5 });

        assert_eq!(tokens[2].kind, TokenKind::Number(1));
        assert_eq!(tokens[2].span, Span { start: 6, end: 7 });

        assert_eq!(tokens[3].kind, TokenKind::RParen);
        assert_eq!(tokens[3].span, Span { start: 7, end: 8 });
    }

    #[test]
    fn test_error_span() {
        let err = tokenize("(a 3x)").expect_err("3x should not lex");
        assert_eq!(err.span, Span::new(3, 4));
        assert_eq!(err.to_string(), "Invalid token after 3");
    }

    #[test]
    fn test_fib_program() {
        let input = r#"
(muhe(
    (yafib (mita (si)
        ; Fibonacci by two branches of itself
        (dala ((shato si 0) 0)
            (da (dala ((aba si du) unu)
                (da (celi (yafib (movo si du)) (yafib (movo si unu)))))))))
))
(yafib 10)
        "#;

        match tokenize(input) {
            Ok(tokens) => {
                let newlines = tokens
                    .iter()
                    .filter(|t| t.kind == TokenKind::Newline)
                    .count();
                assert_eq!(newlines, 9, "Input: '{}'", input);
                assert_eq!(tokens.len() - newlines, 65, "Input: '{}'", input);
            }
            Err(e) => panic!("Lexing failed for input '{}': {}", input, e),
        }
    }
}
