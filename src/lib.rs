// Declare modules publicly so they are part of the library interface
pub mod combinator;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod printer;
pub mod source;
pub mod symbol;
pub mod types;

pub use environment::{EnvError, StackTrace};
pub use evaluator::{Context, EvalError, EvalResult};
pub use lexer::{LexerError, Token, tokenize};
pub use parser::{ParseError, Parser, parse_program, parse_sexpr_str, parse_str};
pub use source::Span;
pub use symbol::{Name, intern};
pub use types::{Atom, Expr};
