//! Process-wide symbol table.
//!
//! Every name atom is interned here, so equal text always yields the same
//! [`Name`] handle. The evaluator relies on that: scope frames and the
//! primitive table are keyed by handle, never by text.

use std::collections::HashSet;
use std::fmt;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Names that live in the root frame and can never be rebound.
pub const CONSTANTS: &[&str] = &[
    "da", "nye", "nya", "nil", "unu", "du", "unudu", "dudu", "mani",
];

/// An interned name. Cheap to copy, compared by identity.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Name(DefaultSymbol);

impl Name {
    /// Returns an owned copy of the interned text.
    pub fn text(self) -> String {
        table().resolve(self).to_string()
    }

    /// Runs `f` on the interned text under a single table lock. `f` must not
    /// intern or print names.
    pub fn with_text<R>(self, f: impl FnOnce(&str) -> R) -> R {
        f(table().resolve(self))
    }

    pub fn is_constant(self) -> bool {
        table().is_constant(self)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Copy out before writing so the table lock is never held across the formatter.
        let text = self.text();
        f.write_str(&text)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.text())
    }
}

pub struct SymbolTable {
    interner: DefaultStringInterner,
    constants: HashSet<Name>,
}

impl SymbolTable {
    fn new() -> Self {
        let mut table = SymbolTable {
            interner: DefaultStringInterner::new(),
            constants: HashSet::new(),
        };
        for text in CONSTANTS {
            let name = table.intern(text);
            table.constants.insert(name);
        }
        table
    }

    pub fn intern(&mut self, text: &str) -> Name {
        Name(self.interner.get_or_intern(text))
    }

    pub fn resolve(&self, name: Name) -> &str {
        // Handles are only ever minted by this table, so resolution cannot miss.
        self.interner.resolve(name.0).unwrap_or_default()
    }

    pub fn is_constant(&self, name: Name) -> bool {
        self.constants.contains(&name)
    }

    pub fn len(&self) -> usize {
        self.interner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interner.is_empty()
    }
}

static TABLE: LazyLock<Mutex<SymbolTable>> = LazyLock::new(|| Mutex::new(SymbolTable::new()));

/// Locks the shared table. A panic while holding the lock cannot leave the
/// interner half-updated, so a poisoned lock is simply recovered.
pub fn table() -> MutexGuard<'static, SymbolTable> {
    TABLE.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn intern(text: &str) -> Name {
    table().intern(text)
}

/// Handles for the names the reader, printer and evaluator treat specially.
#[derive(Debug)]
pub struct Keywords {
    pub quote: Name,
    pub cond: Name,
    pub lambda: Name,
    pub define: Name,
    pub nil: Name,
    pub truth: Name,
    pub falsity: Name,
    pub nya: Name,
    // Frame labels. Neither is reachable from source text.
    pub top: Name,
    pub anonymous: Name,
}

static KEYWORDS: LazyLock<Keywords> = LazyLock::new(|| {
    let mut table = table();
    Keywords {
        quote: table.intern("plata"),
        cond: table.intern("dala"),
        lambda: table.intern("mita"),
        define: table.intern("muhe"),
        nil: table.intern("nil"),
        truth: table.intern("da"),
        falsity: table.intern("nye"),
        nya: table.intern("nya"),
        top: table.intern("<top>"),
        anonymous: table.intern("<lambda>"),
    }
});

pub fn keywords() -> &'static Keywords {
    &KEYWORDS
}
