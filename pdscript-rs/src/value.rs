//! Conversion of single values between host atoms and Lua.
//!
//! | Host atom                | Lua value                                  |
//! |--------------------------|--------------------------------------------|
//! | `Number(x)`              | number `x`                                 |
//! | `Symbol(s)`              | string `s` (not interned)                  |
//! | `Dollar`, `DollarSymbol` | none ([`BridgeError::UnsupportedAtomKind`]) |
//!
//! In the other direction integers and numbers become `Number`, strings
//! become interned `Symbol`s, and every other Lua type has no atom.  That
//! last case is not an error: list collection treats it as the end of the
//! list.

use mlua::prelude::*;

use crate::atom::{HostAtom, SymbolTable};
use crate::error::{BridgeError, Result};

/// Convert one host atom to a Lua value.
pub fn atom_to_value(lua: &Lua, atom: &HostAtom) -> Result<LuaValue> {
    match atom {
        HostAtom::Number(x) => Ok(LuaValue::Number(*x)),
        HostAtom::Symbol(s) => Ok(LuaValue::String(lua.create_string(s.as_str())?)),
        other => Err(BridgeError::UnsupportedAtomKind { kind: other.kind() }),
    }
}

/// Convert one Lua value to a host atom.
///
/// Returns `None` for values with no atom representation.
pub fn value_to_atom(value: &LuaValue, symbols: &mut SymbolTable) -> Option<HostAtom> {
    match value {
        LuaValue::Integer(i) => Some(HostAtom::Number(*i as f64)),
        LuaValue::Number(x) => Some(HostAtom::Number(*x)),
        LuaValue::String(s) => {
            let text = String::from(s.to_string_lossy());
            Some(HostAtom::Symbol(symbols.intern(&text)))
        }
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Symbol;

    #[test]
    fn number_becomes_lua_number() {
        let lua = Lua::new();
        let v = atom_to_value(&lua, &HostAtom::Number(2.5)).unwrap();
        assert!(matches!(v, LuaValue::Number(x) if x == 2.5));
    }

    #[test]
    fn symbol_becomes_lua_string() {
        let lua = Lua::new();
        let v = atom_to_value(&lua, &HostAtom::symbol("three")).unwrap();
        match v {
            LuaValue::String(s) => assert_eq!(&*s.to_str().unwrap(), "three"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn dollar_atoms_are_unsupported() {
        let lua = Lua::new();
        let err = atom_to_value(&lua, &HostAtom::Dollar(1)).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedAtomKind { kind: "dollar" }));
        let err = atom_to_value(&lua, &HostAtom::DollarSymbol(Symbol::new("$1-x"))).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedAtomKind { kind: "dollsym" }));
    }

    #[test]
    fn integers_and_numbers_become_numbers() {
        let mut syms = SymbolTable::new();
        assert_eq!(value_to_atom(&LuaValue::Integer(7), &mut syms), Some(HostAtom::Number(7.0)));
        assert_eq!(value_to_atom(&LuaValue::Number(-0.5), &mut syms), Some(HostAtom::Number(-0.5)));
    }

    #[test]
    fn lua_string_is_interned() {
        let lua = Lua::new();
        let mut syms = SymbolTable::new();
        let s = LuaValue::String(lua.create_string("three").unwrap());
        let a = value_to_atom(&s, &mut syms).unwrap();
        let b = value_to_atom(&s, &mut syms).unwrap();
        assert_eq!(a, HostAtom::symbol("three"));
        assert!(a.as_symbol().unwrap().ptr_eq(b.as_symbol().unwrap()));
    }

    #[test]
    fn other_kinds_have_no_atom() {
        let lua = Lua::new();
        let mut syms = SymbolTable::new();
        assert_eq!(value_to_atom(&LuaValue::Nil, &mut syms), None);
        assert_eq!(value_to_atom(&LuaValue::Boolean(true), &mut syms), None);
        let t = LuaValue::Table(lua.create_table().unwrap());
        assert_eq!(value_to_atom(&t, &mut syms), None);
    }

    #[test]
    fn number_round_trip_is_exact() {
        let lua = Lua::new();
        let mut syms = SymbolTable::new();
        for x in [0.0, -1.0, 1.0 / 3.0, f64::MAX, f64::MIN_POSITIVE, 1e-300] {
            let v = atom_to_value(&lua, &HostAtom::Number(x)).unwrap();
            assert_eq!(value_to_atom(&v, &mut syms), Some(HostAtom::Number(x)));
        }
    }
}
