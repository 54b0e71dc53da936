//! Accessor-chain names such as `lalawa` or `kulakucha`.
//!
//! A name made of `la`/`ku` codes followed by a `lawa` or `kucha` terminal is
//! callable without a table entry: it composes first (`la`) and rest (`ku`)
//! accessors. Bare `lawa` and `kucha` are ordinary primitives and never match.

use std::str::FromStr;
use thiserror::Error;

use crate::types::Expr;

const MIN_LEN: usize = 6;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    First,
    Rest,
}

impl Step {
    fn run(self, expr: &Expr) -> Expr {
        match self {
            Step::First => expr.first(),
            Step::Rest => expr.rest(),
        }
    }
}

/// A decoded accessor name. `codes` keeps the order of the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorChain {
    codes: Vec<Step>,
    terminal: Step,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not an accessor chain")]
pub struct BadCombinator(pub String);

impl AccessorChain {
    /// Decodes `text`, or returns `None` when it is not an accessor name.
    ///
    /// The terminal is chosen by length parity: even names end in `lawa`,
    /// odd names in `kucha`.
    pub fn parse(text: &str) -> Option<AccessorChain> {
        if text.len() < MIN_LEN {
            return None;
        }
        let (prefix, terminal) = if text.len() % 2 == 0 {
            (text.strip_suffix("lawa")?, Step::First)
        } else {
            (text.strip_suffix("kucha")?, Step::Rest)
        };
        let codes = prefix
            .as_bytes()
            .chunks(2)
            .map(|code| match code {
                b"la" => Some(Step::First),
                b"ku" => Some(Step::Rest),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some(AccessorChain { codes, terminal })
    }

    pub fn matches(text: &str) -> bool {
        Self::parse(text).is_some()
    }

    /// True for names shaped like a chain at the end, whatever their codes.
    pub fn has_terminal(text: &str) -> bool {
        text.len() >= MIN_LEN && (text.ends_with("lawa") || text.ends_with("kucha"))
    }

    /// Applies the chain to the first argument of `args`: the terminal runs
    /// first, then the codes from right to left.
    pub fn apply(&self, args: &Expr) -> Expr {
        let start = self.terminal.run(&args.first());
        self.codes
            .iter()
            .rev()
            .fold(start, |expr, step| step.run(&expr))
    }
}

impl FromStr for AccessorChain {
    type Err = BadCombinator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessorChain::parse(s).ok_or_else(|| BadCombinator(s.to_string()))
    }
}
