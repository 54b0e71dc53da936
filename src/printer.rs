//! Text renderings of expression trees.
//!
//! `Display` on [`Expr`] gives list form with `'x` quote sugar, [`Expr::raw`]
//! gives list form without the sugar and [`Expr::canonical`] always spells
//! out every pair as `(first . rest)`.

use crate::symbol::keywords;
use crate::types::{Atom, Expr};
use std::fmt::{self, Write};

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Name(name) => write!(f, "{}", name),
            Atom::Number(n) => write!(f, "{}", n),
            Atom::Str(content) => {
                f.write_char('"')?;
                for c in content.text().chars() {
                    if c == '"' || c == '\\' {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_char('"')
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(self, f, true)
    }
}

pub struct Raw<'a>(&'a Expr);

impl fmt::Display for Raw<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(self.0, f, false)
    }
}

pub struct Canonical<'a>(&'a Expr);

impl fmt::Display for Canonical<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_canonical(self.0, f)
    }
}

impl Expr {
    /// List form, with quote forms left as `(plata x)`.
    pub fn raw(&self) -> Raw<'_> {
        Raw(self)
    }

    /// Fully dotted form.
    pub fn canonical(&self) -> Canonical<'_> {
        Canonical(self)
    }
}

/// Matches `(plata . (x . nil))` and returns `x`.
fn quoted_operand(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Pair(head, rest) if head.as_name() == Some(keywords().quote) => match &**rest {
            Expr::Pair(operand, tail) if tail.is_nil() => Some(&**operand),
            _ => None,
        },
        _ => None,
    }
}

fn write_list(expr: &Expr, f: &mut fmt::Formatter<'_>, quote: bool) -> fmt::Result {
    let (first, rest) = match expr {
        Expr::Atom(atom) => return write!(f, "{}", atom),
        Expr::Pair(first, rest) => (first, rest),
    };
    if quote {
        if let Some(operand) = quoted_operand(expr) {
            f.write_char('\'')?;
            return write_list(operand, f, quote);
        }
    }

    f.write_char('(')?;
    write_list(first, f, quote)?;
    let mut tail: &Expr = &**rest;
    loop {
        match tail {
            Expr::Pair(first, rest) => {
                f.write_char(' ')?;
                write_list(first, f, quote)?;
                tail = &**rest;
            }
            Expr::Atom(_) if tail.is_nil() => break,
            Expr::Atom(atom) => {
                write!(f, " . {}", atom)?;
                break;
            }
        }
    }
    f.write_char(')')
}

fn write_canonical(expr: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // Rest children are written in a loop and closed together at the end.
    let mut open = 0;
    let mut tail = expr;
    loop {
        match tail {
            Expr::Pair(first, rest) => {
                f.write_char('(')?;
                write_canonical(first, f)?;
                f.write_str(" . ")?;
                open += 1;
                tail = &**rest;
            }
            Expr::Atom(atom) => {
                write!(f, "{}", atom)?;
                break;
            }
        }
    }
    for _ in 0..open {
        f.write_char(')')?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Expr {
        Expr::list(vec![Expr::name("a"), Expr::name("b"), Expr::name("c")])
    }

    #[test]
    fn test_atoms() {
        assert_eq!(Expr::name("upa").to_string(), "upa");
        assert_eq!(Expr::number(-42).to_string(), "-42");
        assert_eq!(Expr::nil().to_string(), "nil");
        assert_eq!(Expr::string("ohla odomu!").to_string(), "\"ohla odomu!\"");
    }

    #[test]
    fn test_string_escapes_are_restored() {
        assert_eq!(Expr::string(r#"a"b\c"#).to_string(), r#""a\"b\\c""#);
    }

    #[test]
    fn test_proper_list() {
        assert_eq!(abc().to_string(), "(a b c)");
        assert_eq!(abc().canonical().to_string(), "(a . (b . (c . nil)))");
    }

    #[test]
    fn test_dotted_tail() {
        let dotted = Expr::cons(
            Expr::name("a"),
            Expr::cons(Expr::name("b"), Expr::name("c")),
        );
        assert_eq!(dotted.to_string(), "(a b . c)");
        assert_eq!(dotted.canonical().to_string(), "(a . (b . c))");
    }

    #[test]
    fn test_nested_lists() {
        let nested = Expr::list(vec![abc(), Expr::cons(Expr::name("d"), Expr::name("e"))]);
        assert_eq!(nested.to_string(), "((a b c) (d . e))");
    }

    #[test]
    fn test_quote_sugar() {
        let quoted = Expr::quoted(Expr::name("a"));
        assert_eq!(quoted.to_string(), "'a");
        assert_eq!(quoted.raw().to_string(), "(plata a)");
        assert_eq!(quoted.canonical().to_string(), "(plata . (a . nil))");

        let twice = Expr::quoted(Expr::quoted(abc()));
        assert_eq!(twice.to_string(), "''(a b c)");
        assert_eq!(twice.raw().to_string(), "(plata (plata (a b c)))");
    }

    #[test]
    fn test_quote_sugar_needs_exact_shape() {
        // (plata a b) is not the expansion of 'x.
        let extra = Expr::list(vec![Expr::name("plata"), Expr::name("a"), Expr::name("b")]);
        assert_eq!(extra.to_string(), "(plata a b)");
        // Quote heads inside a tail are plain items.
        let tail = Expr::cons(Expr::name("x"), Expr::quoted(Expr::name("a")));
        assert_eq!(tail.to_string(), "(x plata a)");
    }

    #[test]
    fn test_long_list_renders() {
        let list = Expr::list((0..100_000).map(Expr::number).collect::<Vec<_>>());
        let canonical = list.canonical().to_string();
        assert!(canonical.starts_with("(0 . (1 . (2 . "), "{}", &canonical[..20]);
        assert!(canonical.ends_with("(99999 . nil)))"));
        assert_eq!(canonical.matches(')').count(), 100_000);
        assert!(list.to_string().ends_with("99998 99999)"));
    }
}
