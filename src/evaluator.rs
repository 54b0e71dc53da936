use crate::combinator::{AccessorChain, BadCombinator};
use crate::environment::{EnvError, Environment, StackTrace};
use crate::primitives::{Arity, Primitive};
use crate::symbol::{Name, intern, keywords};
use crate::types::{Atom, Expr};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, trace, warn};

// --- Evaluation Error ---
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("undefined: {0}")]
    Undefined(Name),
    #[error("{0} is not a function")]
    NotAFunction(Expr),
    #[error("{0} is a primitive")]
    IsPrimitive(Name),
    #[error("args mismatch for {name}: expected {expected} arguments, got {found}")]
    ArityMismatch {
        name: Name,
        expected: Arity,
        found: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in {0}")]
    Overflow(&'static str),
    #[error("expect number; got {0}")]
    NotANumber(Expr),
    #[error(transparent)]
    EnvError(#[from] EnvError), // Errors from binding names
    #[error("malformed {form}: {expr}")]
    MalformedForm { form: Name, expr: Expr },
    #[error("no true case in dala")]
    NoTrueCase,
    #[error(transparent)]
    BadCombinator(#[from] BadCombinator),
    /// Carries the frames live when the bound tripped, including the refused call.
    #[error("stack too deep")]
    StackTooDeep { trace: StackTrace },
}

// Result type alias for convenience
pub type EvalResult<T = Expr> = Result<T, EvalError>;

// Headroom below which `eval` moves onto a fresh stack segment, and the size
// of each segment. Recursion depth is limited by `max_depth` and the heap,
// never by the thread's stack.
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_SEGMENT: usize = 1024 * 1024;

/// What a called name turned out to be.
enum Callee {
    Primitive(Name, Primitive),
    Chain(Name, AccessorChain),
    Value(Expr),
}

/// An evaluation session: the scope stack plus the recursion bound.
///
/// Definitions made by one top-level evaluation stay visible to the next.
/// After a failed evaluation the frames of the failing call chain are left
/// in place for [`Context::stack_trace`]; call [`Context::reset_stack`]
/// before evaluating again.
#[derive(Debug, Clone)]
pub struct Context {
    env: Environment,
    depth: usize,
    max_depth: usize,
}

impl Default for Context {
    fn default() -> Self {
        Context::new(0)
    }
}

impl Context {
    /// `max_depth` bounds nested applications; 0 disables the bound.
    pub fn new(max_depth: usize) -> Self {
        Context {
            env: Environment::new(),
            depth: 0,
            max_depth,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Current binding of `name`, looked up from the innermost frame.
    pub fn lookup(&self, name: &str) -> Option<Expr> {
        self.env.get(intern(name))
    }

    pub fn stack_trace(&self) -> StackTrace {
        self.env.trace()
    }

    /// Drops every frame but the root and clears the depth counter.
    pub fn reset_stack(&mut self) {
        debug!(frames = self.env.len(), depth = self.depth, "resetting stack");
        self.env.truncate_to_root();
        self.depth = 0;
    }

    /// Evaluates one top-level expression.
    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        let keywords = keywords();
        match expr {
            Expr::Atom(Atom::Name(name)) => {
                if is_builtin(*name) {
                    return Err(EvalError::IsPrimitive(*name));
                }
                self.eval(expr)
            }
            Expr::Pair(head, operands) if head.as_name() == Some(keywords.define) => {
                self.apply(keywords.define, head, Expr::clone(operands))
            }
            _ => {
                // Everything else runs as the body of a nullary lambda.
                let body = Expr::list(vec![
                    Expr::from_name(keywords.lambda),
                    Expr::nil(),
                    expr.clone(),
                ]);
                self.apply(keywords.top, &body, Expr::nil())
            }
        }
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.eval_expr(expr))
    }

    fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Atom(Atom::Name(name)) => {
                self.env.get(*name).ok_or(EvalError::Undefined(*name))
            }
            Expr::Atom(_) => Ok(expr.clone()),
            Expr::Pair(head, operands) => {
                let keywords = keywords();
                match head.as_name() {
                    Some(name) if name == keywords.quote => eval_quote(operands),
                    Some(name) if name == keywords.cond => self.eval_cond(operands),
                    // Bindings are not evaluated.
                    Some(name) if name == keywords.define => {
                        self.apply(name, head, Expr::clone(operands))
                    }
                    Some(name) => {
                        let args = self.eval_list(operands)?;
                        self.apply(name, head, args)
                    }
                    None if is_lambda(head) => {
                        let args = self.eval_list(operands)?;
                        self.apply(keywords.anonymous, head, args)
                    }
                    None => Err(EvalError::NotAFunction(Expr::clone(head))),
                }
            }
        }
    }

    /// Tries `(predicate result)` clauses in order; only `da` is true.
    fn eval_cond(&mut self, clauses: &Expr) -> EvalResult {
        for clause in clauses.items() {
            if !clause.is_pair() {
                return Err(EvalError::MalformedForm {
                    form: keywords().cond,
                    expr: clause.clone(),
                });
            }
            if self.eval(&clause.first())?.is_true() {
                return self.eval(&clause.rest().first());
            }
        }
        Err(EvalError::NoTrueCase)
    }

    // Left to right.
    fn eval_list(&mut self, operands: &Expr) -> EvalResult {
        let values = operands
            .items()
            .map(|operand| self.eval(operand))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(Expr::list(values))
    }

    /// Applies `function` to an argument list. `name` labels the frame in
    /// stack traces.
    ///
    /// On failure the frames pushed so far and the depth count are kept so
    /// the trace can be inspected.
    fn apply(&mut self, name: Name, function: &Expr, args: Expr) -> EvalResult {
        self.enter(name, &args)?;
        trace!(function = %name, args = %args, depth = self.depth, "apply");
        let result = match function {
            Expr::Atom(Atom::Name(callee)) => match self.resolve(*callee)? {
                Callee::Primitive(callee, primitive) => {
                    self.apply_primitive(callee, primitive, &args)
                }
                Callee::Chain(callee, chain) => {
                    Arity::Exactly(1).check(callee, &args)?;
                    Ok(chain.apply(&args))
                }
                Callee::Value(value) => self.apply_lambda(name, &value, args),
            },
            _ => self.apply_lambda(name, function, args),
        }?;
        self.depth -= 1;
        Ok(result)
    }

    fn enter(&mut self, name: Name, args: &Expr) -> EvalResult<()> {
        self.depth += 1;
        if self.max_depth > 0 && self.depth > self.max_depth {
            // The refused call still shows up in the trace.
            self.env.push(name, args.clone());
            warn!(function = %name, max_depth = self.max_depth, "stack too deep");
            return Err(EvalError::StackTooDeep {
                trace: self.env.trace(),
            });
        }
        Ok(())
    }

    /// Looks a called name up: the primitive table, then accessor chains,
    /// then scope bindings. A name bound to another name is followed.
    fn resolve(&self, callee: Name) -> EvalResult<Callee> {
        let mut seen = HashSet::new();
        let mut current = callee;
        loop {
            if let Some(primitive) = Primitive::lookup(current) {
                return Ok(Callee::Primitive(current, primitive));
            }
            let (chain, has_terminal) = current.with_text(|text| {
                (AccessorChain::parse(text), AccessorChain::has_terminal(text))
            });
            if let Some(chain) = chain {
                return Ok(Callee::Chain(current, chain));
            }
            if !seen.insert(current) {
                return Err(EvalError::NotAFunction(Expr::from_name(callee)));
            }
            match self.env.get(current) {
                Some(Expr::Atom(Atom::Name(next))) => current = next,
                Some(value) => return Ok(Callee::Value(value)),
                None if has_terminal => return Err(BadCombinator(current.text()).into()),
                None => return Err(EvalError::Undefined(current)),
            }
        }
    }

    fn apply_primitive(&mut self, name: Name, primitive: Primitive, args: &Expr) -> EvalResult {
        match primitive {
            Primitive::Host(op) => op.call(name, args),
            Primitive::Apply => {
                Arity::AtLeast(1).check(name, args)?;
                let function = args.first();
                let label = function.as_name().unwrap_or(keywords().anonymous);
                self.apply(label, &function, args.rest())
            }
            Primitive::Define => self.define_group(args),
        }
    }

    /// Runs `(mita (params...) body)` in a fresh frame.
    fn apply_lambda(&mut self, name: Name, function: &Expr, args: Expr) -> EvalResult {
        if !is_lambda(function) {
            return Err(EvalError::NotAFunction(function.clone()));
        }
        let formals = function.rest().first();
        let body = function.rest().rest().first();
        Arity::Exactly(formals.len()).check(name, &args)?;

        self.env.push(name, args.clone());
        for (param, arg) in formals.items().zip(args.items()) {
            let param = param.as_name().ok_or_else(|| EvalError::MalformedForm {
                form: keywords().lambda,
                expr: formals.clone(),
            })?;
            self.env.set_local(param, arg.clone())?;
        }
        let result = self.eval(&body)?;
        self.env.pop();
        Ok(result)
    }

    /// `(muhe ((name value) ...))` binds every name before any of them is
    /// called, so the values may refer to each other. Returns the list of
    /// names in order.
    fn define_group(&mut self, operands: &Expr) -> EvalResult {
        let bindings = operands.first();
        let mut names = Vec::new();
        for binding in bindings.items() {
            let name = match binding {
                Expr::Pair(name, _) => name.as_name(),
                Expr::Atom(_) => None,
            }
            .ok_or_else(|| EvalError::MalformedForm {
                form: keywords().define,
                expr: binding.clone(),
            })?;
            let value = binding.rest().first();
            debug!(name = %name, value = %value, "define");
            self.env.set(name, value)?;
            names.push(Expr::from_name(name));
        }
        Ok(Expr::list(names))
    }
}

fn eval_quote(operands: &Expr) -> EvalResult {
    match operands {
        Expr::Pair(operand, _) => Ok(Expr::clone(operand)),
        Expr::Atom(_) => Err(EvalError::MalformedForm {
            form: keywords().quote,
            expr: operands.clone(),
        }),
    }
}

fn is_lambda(expr: &Expr) -> bool {
    expr.is_pair() && expr.first().as_name() == Some(keywords().lambda)
}

/// Names that are callable without a binding and so have no value.
fn is_builtin(name: Name) -> bool {
    Primitive::lookup(name).is_some() || name.with_text(AccessorChain::matches)
}
