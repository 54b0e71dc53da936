use crate::symbol::{Name, intern, keywords};
use std::mem;
use std::rc::Rc;

/// The payload of a leaf expression.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    Name(Name),  // interned, compared by handle
    Number(i64), // value-typed, never interned
    Str(Name),   // string literal content, interned but self-evaluating
}

/// A cons-cell expression tree.
///
/// Nodes are immutable once built and subtrees are shared through `Rc`, so
/// cloning an `Expr` never copies more than one node.
///
/// Dropping and comparing walk the `rest` spine in a loop, so list length is
/// not limited by the host stack.
#[derive(Debug, Clone)]
pub enum Expr {
    Atom(Atom),
    Pair(Rc<Expr>, Rc<Expr>),
}

impl Expr {
    pub fn name(text: &str) -> Expr {
        Expr::Atom(Atom::Name(intern(text)))
    }

    pub fn from_name(name: Name) -> Expr {
        Expr::Atom(Atom::Name(name))
    }

    pub fn number(value: i64) -> Expr {
        Expr::Atom(Atom::Number(value))
    }

    pub fn string(content: &str) -> Expr {
        Expr::Atom(Atom::Str(intern(content)))
    }

    pub fn nil() -> Expr {
        Expr::from_name(keywords().nil)
    }

    pub fn truth(value: bool) -> Expr {
        let keywords = keywords();
        Expr::from_name(if value {
            keywords.truth
        } else {
            keywords.falsity
        })
    }

    pub fn cons(first: Expr, rest: Expr) -> Expr {
        Expr::Pair(Rc::new(first), Rc::new(rest))
    }

    /// Builds a proper list terminated by the `nil` leaf.
    pub fn list<I>(items: I) -> Expr
    where
        I: IntoIterator<Item = Expr>,
        I::IntoIter: DoubleEndedIterator,
    {
        Expr::list_with_tail(items, Expr::nil())
    }

    /// Builds a list whose last rest is `tail` instead of `nil`.
    pub fn list_with_tail<I>(items: I, tail: Expr) -> Expr
    where
        I: IntoIterator<Item = Expr>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(tail, |rest, item| Expr::cons(item, rest))
    }

    /// `(plata . (expr . nil))`, the expansion of `'expr`.
    pub fn quoted(expr: Expr) -> Expr {
        Expr::cons(
            Expr::from_name(keywords().quote),
            Expr::cons(expr, Expr::nil()),
        )
    }

    /// Left child of a pair; `nil` for a leaf.
    pub fn first(&self) -> Expr {
        match self {
            Expr::Pair(first, _) => Expr::clone(first),
            Expr::Atom(_) => Expr::nil(),
        }
    }

    /// Right child of a pair; `nil` for a leaf.
    pub fn rest(&self) -> Expr {
        match self {
            Expr::Pair(_, rest) => Expr::clone(rest),
            Expr::Atom(_) => Expr::nil(),
        }
    }

    pub fn as_name(&self) -> Option<Name> {
        match self {
            Expr::Atom(Atom::Name(name)) => Some(*name),
            _ => None,
        }
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Expr::Pair(..))
    }

    pub fn is_nil(&self) -> bool {
        self.as_name() == Some(keywords().nil)
    }

    /// Only the `da` constant is true.
    pub fn is_true(&self) -> bool {
        self.as_name() == Some(keywords().truth)
    }

    /// `nil` and `nya` both stand for zero in arithmetic.
    pub fn is_nya(&self) -> bool {
        let keywords = keywords();
        matches!(self.as_name(), Some(name) if name == keywords.nil || name == keywords.nya)
    }

    /// Iterates over the items of a (possibly improper) list, stopping at
    /// the first rest that is not a pair.
    pub fn items(&self) -> Items<'_> {
        Items { current: self }
    }

    pub fn len(&self) -> usize {
        self.items().count()
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Expr) -> bool {
        let (mut left, mut right) = (self, other);
        loop {
            match (left, right) {
                (Expr::Atom(a), Expr::Atom(b)) => return a == b,
                (Expr::Pair(left_first, left_rest), Expr::Pair(right_first, right_rest)) => {
                    if !Rc::ptr_eq(left_first, right_first) && **left_first != **right_first {
                        return false;
                    }
                    if Rc::ptr_eq(left_rest, right_rest) {
                        return true;
                    }
                    left = &**left_rest;
                    right = &**right_rest;
                }
                _ => return false,
            }
        }
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        if let Expr::Pair(first, rest) = self {
            detach(first, &mut pending);
            detach(rest, &mut pending);
        }
        // Each popped node has its unshared children detached before it drops,
        // so no drop below recurses more than one level.
        while let Some(mut expr) = pending.pop() {
            if let Expr::Pair(first, rest) = &mut expr {
                detach(first, &mut pending);
                detach(rest, &mut pending);
            }
        }
    }
}

/// Moves a uniquely owned pair out of `child`, leaving a leaf behind.
fn detach(child: &mut Rc<Expr>, pending: &mut Vec<Expr>) {
    if let Some(node) = Rc::get_mut(child)
        && node.is_pair()
    {
        pending.push(mem::replace(node, Expr::Atom(Atom::Number(0))));
    }
}

pub struct Items<'a> {
    current: &'a Expr,
}

impl<'a> Iterator for Items<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current {
            Expr::Pair(first, rest) => {
                self.current = &**rest;
                Some(&**first)
            }
            Expr::Atom(_) => None,
        }
    }
}
