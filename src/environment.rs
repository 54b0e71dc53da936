use crate::symbol::{Name, intern, keywords};
use crate::types::Expr;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Frames kept at each end of a trace before the middle is elided.
const TRACE_KEEP: usize = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("cannot set constant {0}")]
    ConstantAssignment(Name),
}

/// One activation: its bindings plus the call that created it.
#[derive(Debug, Clone)]
pub struct Scope {
    bindings: HashMap<Name, Expr>,
    caller: Name,
    args: Expr,
}

impl Scope {
    fn new(caller: Name, args: Expr) -> Self {
        Scope {
            bindings: HashMap::new(),
            caller,
            args,
        }
    }

    pub fn caller(&self) -> Name {
        self.caller
    }

    pub fn args(&self) -> &Expr {
        &self.args
    }
}

/// The stack of scope frames. Frame 0 is the root: it holds the constants,
/// is created once and is never popped.
#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// The root frame is never popped, so there is no empty environment.
#[allow(clippy::len_without_is_empty)]
impl Environment {
    /// Creates the stack with a populated root frame.
    pub fn new() -> Self {
        let keywords = keywords();
        let mut root = Scope::new(keywords.top, Expr::nil());
        for name in [keywords.truth, keywords.falsity, keywords.nya, keywords.nil] {
            root.bindings.insert(name, Expr::from_name(name));
        }
        for (value, text) in (1..).zip(["unu", "du", "unudu", "dudu", "mani"]) {
            root.bindings.insert(intern(text), Expr::number(value));
        }
        Environment { frames: vec![root] }
    }

    pub fn push(&mut self, caller: Name, args: Expr) {
        self.frames.push(Scope::new(caller, args));
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Discards every frame but the root.
    pub fn truncate_to_root(&mut self) {
        self.frames.truncate(1);
    }

    /// Number of live frames, root included.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn innermost(&self) -> &Scope {
        // The root is never popped, so there is always a last frame.
        &self.frames[self.frames.len() - 1]
    }

    /// Looks a name up from the innermost frame out to the root.
    pub fn get(&self, name: Name) -> Option<Expr> {
        self.frames
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(&name))
            .cloned()
    }

    /// Binds `name` in the innermost frame that already holds it, or in the
    /// innermost frame when no frame does.
    pub fn set(&mut self, name: Name, value: Expr) -> Result<(), EnvError> {
        check_not_constant(name)?;
        let index = self
            .frames
            .iter()
            .rposition(|scope| scope.bindings.contains_key(&name))
            .unwrap_or(self.frames.len() - 1);
        self.frames[index].bindings.insert(name, value);
        Ok(())
    }

    /// Binds `name` in the innermost frame, shadowing any outer binding.
    pub fn set_local(&mut self, name: Name, value: Expr) -> Result<(), EnvError> {
        check_not_constant(name)?;
        let last = self.frames.len() - 1;
        self.frames[last].bindings.insert(name, value);
        Ok(())
    }

    /// Snapshot of the live frames for reporting.
    pub fn trace(&self) -> StackTrace {
        StackTrace {
            frames: self
                .frames
                .iter()
                .map(|scope| TraceFrame {
                    caller: scope.caller,
                    args: scope.args.clone(),
                })
                .collect(),
        }
    }
}

fn check_not_constant(name: Name) -> Result<(), EnvError> {
    if name.is_constant() {
        return Err(EnvError::ConstantAssignment(name));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceFrame {
    pub caller: Name,
    pub args: Expr,
}

/// The call chain at some point of evaluation, outermost frame first.
///
/// `Display` lists the calls innermost first as `(name first-arg)`, one per
/// line under a `stack:` header. Root and top-level frames are not shown,
/// and a trace whose innermost frame is the top level renders as nothing.
/// Long traces keep twenty frames at each end around a `...` line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackTrace {
    frames: Vec<TraceFrame>,
}

impl StackTrace {
    pub fn frames(&self) -> &[TraceFrame] {
        &self.frames
    }

    pub fn push(&mut self, caller: Name, args: Expr) {
        self.frames.push(TraceFrame { caller, args });
    }

    fn write_frame(f: &mut fmt::Formatter<'_>, frame: &TraceFrame) -> fmt::Result {
        if frame.caller == keywords().top {
            return Ok(());
        }
        writeln!(f, "\t({} {})", frame.caller, frame.args.first())
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.frames.len();
        match self.frames.last() {
            Some(frame) if frame.caller != keywords().top => {}
            _ => return Ok(()),
        }
        writeln!(f, "stack:")?;
        if len > 2 * TRACE_KEEP + 1 {
            for frame in self.frames[len - TRACE_KEEP..].iter().rev() {
                Self::write_frame(f, frame)?;
            }
            writeln!(f, "\t...")?;
            for frame in self.frames[1..TRACE_KEEP].iter().rev() {
                Self::write_frame(f, frame)?;
            }
        } else {
            for frame in self.frames[1..].iter().rev() {
                Self::write_frame(f, frame)?;
            }
        }
        Ok(())
    }
}
