use crate::Span;
use crate::lexer::{LexerError, Token, TokenKind};
use crate::types::Expr;
use std::iter::Peekable;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(
        "Parse Error [at {}]: Unexpected token '{}', expected {expected}",
        .found.span,
        .found.kind
    )]
    UnexpectedToken { found: Token, expected: String },
    /// The tokens ran out while a form was still open. A driver can read
    /// more input and retry instead of rejecting the text.
    #[error("Parse Error: Unexpected end of input during parsing. Expected {0}")]
    UnexpectedEof(String),
    #[error("Lexer Error during parse: {0}")]
    LexerError(#[from] LexerError),
    #[error("Parse Error: Invalid syntax for dotted pair at [{0}]")]
    InvalidDotSyntax(Span),
}

impl ParseError {
    /// True when more input could complete the form.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::UnexpectedEof(_))
    }
}

// Result type alias for convenience
pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    // We iterate over owned Tokens, consuming them.
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        // Line structure only matters to interactive drivers.
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|token| token.kind != TokenKind::Newline)
            .collect();
        Parser {
            tokens: tokens.into_iter().peekable(),
        }
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    pub fn is_at_end(&mut self) -> bool {
        self.tokens.peek().is_none()
    }

    /// Parses one list-form expression:
    /// `Expr := atom | ' Expr | ( Expr* [. Expr] )`.
    pub fn parse_list(&mut self) -> ParseResult<Expr> {
        let token = self.next_token();
        self.parse_list_with_token(token)
    }

    fn parse_list_with_token(&mut self, token: Option<Token>) -> ParseResult<Expr> {
        match token {
            Some(Token {
                kind: TokenKind::LParen,
                ..
            }) => self.parse_items(),
            Some(Token {
                kind: TokenKind::Quote,
                ..
            }) => Ok(Expr::quoted(self.parse_list()?)),
            Some(atom) => self.parse_atom(atom),
            None => Err(ParseError::UnexpectedEof("an expression".to_string())),
        }
    }

    /// Parses the items of a list after its opening parenthesis, through the
    /// closing one. The tail defaults to `nil` unless given after a dot.
    fn parse_items(&mut self) -> ParseResult<Expr> {
        let mut items = Vec::new();
        let tail = loop {
            match self.next_token() {
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => break Expr::nil(),
                Some(Token {
                    kind: TokenKind::Dot,
                    ..
                }) => {
                    let tail = self.parse_list()?;
                    self.expect_rparen("')' after dotted tail")?;
                    break tail;
                }
                Some(token) => items.push(self.parse_list_with_token(Some(token))?),
                None => return Err(ParseError::UnexpectedEof("')'".to_string())),
            }
        };
        Ok(Expr::list_with_tail(items, tail))
    }

    /// Parses one canonical expression: `Expr := atom | ( Expr . Expr )`.
    pub fn parse_sexpr(&mut self) -> ParseResult<Expr> {
        match self.next_token() {
            Some(Token {
                kind: TokenKind::LParen,
                ..
            }) => {
                let first = self.parse_sexpr()?;
                match self.next_token() {
                    Some(Token {
                        kind: TokenKind::Dot,
                        ..
                    }) => {}
                    Some(token) => return Err(ParseError::InvalidDotSyntax(token.span)),
                    None => return Err(ParseError::UnexpectedEof("'.'".to_string())),
                }
                let rest = self.parse_sexpr()?;
                self.expect_rparen("')' closing the pair")?;
                Ok(Expr::cons(first, rest))
            }
            Some(Token {
                kind: TokenKind::Quote,
                ..
            }) => Ok(Expr::quoted(self.parse_sexpr()?)),
            Some(atom) => self.parse_atom(atom),
            None => Err(ParseError::UnexpectedEof("an expression".to_string())),
        }
    }

    /// Parses an atomic expression (name, number, string).
    fn parse_atom(&mut self, token: Token) -> ParseResult<Expr> {
        match token.kind {
            TokenKind::Name(name) => Ok(Expr::name(&name)),
            TokenKind::Number(n) => Ok(Expr::number(n)),
            TokenKind::Str(content) => Ok(Expr::string(&content)),
            _ => Err(ParseError::UnexpectedToken {
                found: token,
                expected: "an atom, '(' or '''".to_string(),
            }),
        }
    }

    fn expect_rparen(&mut self, expected: &str) -> ParseResult<()> {
        match self.next_token() {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => Ok(()),
            Some(found) => Err(ParseError::UnexpectedToken {
                found,
                expected: expected.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof(expected.to_string())),
        }
    }

    fn expect_end(&mut self) -> ParseResult<()> {
        match self.next_token() {
            Some(found) => Err(ParseError::UnexpectedToken {
                found,
                expected: "end of input".to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Parses exactly one list-form expression from the token stream.
    pub fn parse(mut self) -> ParseResult<Expr> {
        let expr = self.parse_list()?;
        self.expect_end()?;
        Ok(expr)
    }

    /// Parses every list-form expression in the token stream.
    pub fn parse_all(mut self) -> ParseResult<Vec<Expr>> {
        let mut expressions = Vec::new();
        while !self.is_at_end() {
            expressions.push(self.parse_list()?);
        }
        Ok(expressions)
    }
}

// Helper function to lex and parse a string directly (useful for tests and drivers)
pub fn parse_str(input: &str) -> ParseResult<Expr> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}

pub fn parse_sexpr_str(input: &str) -> ParseResult<Expr> {
    let tokens = crate::lexer::tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_sexpr()?;
    parser.expect_end()?;
    Ok(expr)
}

pub fn parse_program(input: &str) -> ParseResult<Vec<Expr>> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse_all()
}
