use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::evaluator::{EvalError, EvalResult};
use crate::symbol::{Name, intern};
use crate::types::{Atom, Expr};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompareOp {
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Equal,
    NotEqual,
}

/// Operations that only look at their (already evaluated) arguments.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostOp {
    Upa,
    Lawa,
    Kucha,
    List,
    Arith(ArithOp),
    Compare(CompareOp),
}

/// Everything callable through the fixed name table. `Apply` and `Define`
/// need the evaluator and are run there.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Primitive {
    Host(HostOp),
    Apply,
    Define,
}

const ALL: [Primitive; 16] = [
    Primitive::Host(HostOp::Upa),
    Primitive::Host(HostOp::Lawa),
    Primitive::Host(HostOp::Kucha),
    Primitive::Host(HostOp::List),
    Primitive::Apply,
    Primitive::Define,
    Primitive::Host(HostOp::Arith(ArithOp::Add)),
    Primitive::Host(HostOp::Arith(ArithOp::Sub)),
    Primitive::Host(HostOp::Arith(ArithOp::Mul)),
    Primitive::Host(HostOp::Arith(ArithOp::Div)),
    Primitive::Host(HostOp::Compare(CompareOp::Less)),
    Primitive::Host(HostOp::Compare(CompareOp::Greater)),
    Primitive::Host(HostOp::Compare(CompareOp::LessOrEqual)),
    Primitive::Host(HostOp::Compare(CompareOp::GreaterOrEqual)),
    Primitive::Host(HostOp::Compare(CompareOp::Equal)),
    Primitive::Host(HostOp::Compare(CompareOp::NotEqual)),
];

// Keyed by interned handle, never by text.
static TABLE: LazyLock<HashMap<Name, Primitive>> = LazyLock::new(|| {
    ALL.iter()
        .map(|&primitive| (intern(primitive.name()), primitive))
        .collect()
});

impl Primitive {
    pub fn lookup(name: Name) -> Option<Primitive> {
        TABLE.get(&name).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Host(op) => op.name(),
            Primitive::Apply => "apply",
            Primitive::Define => "muhe",
        }
    }
}

impl ArithOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "celi",
            ArithOp::Sub => "movo",
            ArithOp::Mul => "celida",
            ArithOp::Div => "movoda",
        }
    }

    pub fn eval(self, a: i64, b: i64) -> EvalResult<i64> {
        let result = match self {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div => {
                if b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                a.checked_div(b)
            }
        };
        result.ok_or(EvalError::Overflow(self.name()))
    }
}

impl CompareOp {
    pub fn name(self) -> &'static str {
        match self {
            CompareOp::Less => "aba",
            CompareOp::Greater => "unta",
            CompareOp::LessOrEqual => "abashato",
            CompareOp::GreaterOrEqual => "untashato",
            CompareOp::Equal => "shato",
            CompareOp::NotEqual => "nyeshato",
        }
    }

    pub fn test(self, a: i64, b: i64) -> bool {
        match self {
            CompareOp::Less => a < b,
            CompareOp::Greater => a > b,
            CompareOp::LessOrEqual => a <= b,
            CompareOp::GreaterOrEqual => a >= b,
            CompareOp::Equal => a == b,
            CompareOp::NotEqual => a != b,
        }
    }
}

impl HostOp {
    pub fn name(self) -> &'static str {
        match self {
            HostOp::Upa => "upa",
            HostOp::Lawa => "lawa",
            HostOp::Kucha => "kucha",
            HostOp::List => "list",
            HostOp::Arith(op) => op.name(),
            HostOp::Compare(op) => op.name(),
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            HostOp::Lawa | HostOp::Kucha => Arity::Exactly(1),
            HostOp::Upa | HostOp::Arith(_) | HostOp::Compare(_) => Arity::Exactly(2),
            HostOp::List => Arity::Any,
        }
    }

    /// Runs the operation on an evaluated argument list.
    pub fn call(self, name: Name, args: &Expr) -> EvalResult<Expr> {
        self.arity().check(name, args)?;
        let first = args.first();
        match self {
            HostOp::Upa => Ok(Expr::cons(first, args.rest().first())),
            HostOp::Lawa => Ok(first.first()),
            HostOp::Kucha => Ok(first.rest()),
            HostOp::List => Ok(args.clone()),
            HostOp::Arith(op) => {
                let (a, b) = numbers(&first, &args.rest().first())?;
                op.eval(a, b).map(Expr::number)
            }
            HostOp::Compare(op) => {
                let (a, b) = numbers(&first, &args.rest().first())?;
                Ok(Expr::truth(op.test(a, b)))
            }
        }
    }
}

/// `nil` and `nya` count as zero.
pub fn expect_number(expr: &Expr) -> EvalResult<i64> {
    match expr {
        Expr::Atom(Atom::Number(n)) => Ok(*n),
        _ if expr.is_nya() => Ok(0),
        _ => Err(EvalError::NotANumber(expr.clone())),
    }
}

fn numbers(a: &Expr, b: &Expr) -> EvalResult<(i64, i64)> {
    Ok((expect_number(a)?, expect_number(b)?))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Any => true,
        }
    }

    pub fn check(self, name: Name, args: &Expr) -> EvalResult<()> {
        let found = args.len();
        if self.accepts(found) {
            Ok(())
        } else {
            Err(EvalError::ArityMismatch {
                name,
                expected: self,
                found,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Any => write!(f, "any number of"),
        }
    }
}
