//! Host message atoms.
//!
//! A host message is a short, bounded list of atoms.  Only numbers and
//! symbols have a scripting counterpart; the `$n` argument placeholders that
//! patch files carry are kept as their own kinds so the bridge can refuse
//! them explicitly.

use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::error::BridgeError;

/// Maximum number of atoms in one host message.
pub const MAX_ATOMS: usize = 1024;

// ── Symbol ────────────────────────────────────────────────────────────────────

/// An interned host symbol.
///
/// Cloning is a reference-count bump; two symbols from the same
/// [`SymbolTable`] with equal text share one allocation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Rc<str>);

impl Symbol {
    /// Build a symbol without interning it.
    pub fn new(text: &str) -> Self {
        Symbol(Rc::from(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if both symbols point at the same interned text.
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Symbol {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Interning table for [`Symbol`]s.
#[derive(Debug, Default)]
pub struct SymbolTable {
    syms: HashSet<Rc<str>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the interned symbol for `text`, adding it if new.
    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(existing) = self.syms.get(text) {
            return Symbol(Rc::clone(existing));
        }
        let rc: Rc<str> = Rc::from(text);
        self.syms.insert(Rc::clone(&rc));
        Symbol(rc)
    }

    pub fn len(&self) -> usize {
        self.syms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syms.is_empty()
    }
}

// ── HostAtom ──────────────────────────────────────────────────────────────────

/// One element of a host message.
#[derive(Debug, Clone, PartialEq)]
pub enum HostAtom {
    Number(f64),
    Symbol(Symbol),
    /// `$n`: creation-argument placeholder.
    Dollar(u32),
    /// `$n-suffix`: symbol with an embedded placeholder.
    DollarSymbol(Symbol),
}

impl HostAtom {
    pub fn symbol(text: &str) -> Self {
        HostAtom::Symbol(Symbol::new(text))
    }

    /// Name of the atom kind, as used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            HostAtom::Number(_) => "float",
            HostAtom::Symbol(_) => "symbol",
            HostAtom::Dollar(_) => "dollar",
            HostAtom::DollarSymbol(_) => "dollsym",
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            HostAtom::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Parse one whitespace-free token.
    pub fn parse(token: &str) -> Self {
        if let Some(rest) = token.strip_prefix('$') {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 0 {
                if digits == rest.len() {
                    if let Ok(n) = rest.parse() {
                        return HostAtom::Dollar(n);
                    }
                }
                return HostAtom::DollarSymbol(Symbol::new(token));
            }
        }
        if looks_numeric(token) {
            if let Ok(x) = token.parse::<f64>() {
                return HostAtom::Number(x);
            }
        }
        HostAtom::symbol(token)
    }
}

/// Only plain decimal numerals count; `inf`, `nan` and friends stay symbols.
fn looks_numeric(token: &str) -> bool {
    let body = token.strip_prefix(['-', '+']).unwrap_or(token);
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
}

impl fmt::Display for HostAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostAtom::Number(x) => {
                // Integral floats print without a fraction, like the host does.
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{}", *x as i64)
                } else {
                    write!(f, "{x}")
                }
            }
            HostAtom::Symbol(s) => write!(f, "{s}"),
            HostAtom::Dollar(n) => write!(f, "${n}"),
            HostAtom::DollarSymbol(s) => write!(f, "{s}"),
        }
    }
}

// ── HostMessage ───────────────────────────────────────────────────────────────

/// A bounded, ordered list of atoms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostMessage {
    atoms: Vec<HostAtom>,
}

impl HostMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a message from `atoms`.
    ///
    /// Fails with [`BridgeError::CapacityExceeded`] if more than
    /// [`MAX_ATOMS`] are given; use [`HostMessage::truncating`] to keep the
    /// leading atoms instead.
    pub fn from_atoms(atoms: Vec<HostAtom>) -> Result<Self, BridgeError> {
        if atoms.len() > MAX_ATOMS {
            return Err(BridgeError::CapacityExceeded { capacity: MAX_ATOMS });
        }
        Ok(Self { atoms })
    }

    /// Build a message from `atoms`, dropping anything past [`MAX_ATOMS`].
    pub fn truncating(mut atoms: Vec<HostAtom>) -> Self {
        atoms.truncate(MAX_ATOMS);
        Self { atoms }
    }

    /// Append an atom; fails once the message is full.
    pub fn push(&mut self, atom: HostAtom) -> Result<(), BridgeError> {
        if self.atoms.len() >= MAX_ATOMS {
            return Err(BridgeError::CapacityExceeded { capacity: MAX_ATOMS });
        }
        self.atoms.push(atom);
        Ok(())
    }

    /// Tokenise host text (`call foo 1 2.5 bar`) into atoms.
    ///
    /// Tokens are separated by ASCII whitespace; a trailing `;` message
    /// terminator is dropped.  Returns an error rather than truncating when
    /// the text holds more than [`MAX_ATOMS`] tokens.
    pub fn parse(text: &str) -> Result<Self, BridgeError> {
        let text = text.trim();
        let text = text.strip_suffix(';').unwrap_or(text);
        let mut msg = HostMessage::new();
        for token in text.split_ascii_whitespace() {
            msg.push(HostAtom::parse(token))?;
        }
        Ok(msg)
    }

    pub fn atoms(&self) -> &[HostAtom] {
        &self.atoms
    }

    pub fn first(&self) -> Option<&HostAtom> {
        self.atoms.first()
    }

    /// The message without its leading atom.
    pub fn rest(&self) -> &[HostAtom] {
        self.atoms.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl fmt::Display for HostMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, atom) in self.atoms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{atom}")?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
