//! Host message → Lua argument list.

use mlua::prelude::*;

use crate::atom::HostAtom;
use crate::error::BridgeError;
use crate::value::atom_to_value;

/// Which atoms of a message are the call's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRange {
    /// Skip the leading selector atom (`call fn a b` → `a b`).
    AfterSelector,
    /// Every atom is an argument (`list a b` → `a b`).
    Whole,
}

impl ArgRange {
    fn slice(self, atoms: &[HostAtom]) -> &[HostAtom] {
        match self {
            ArgRange::AfterSelector => atoms.get(1..).unwrap_or(&[]),
            ArgRange::Whole => atoms,
        }
    }
}

/// Build a Lua argument list from `atoms`, preserving order.
///
/// The list is folded from the last argument to the first, pushing each
/// converted value onto the front.  Atoms that fail conversion are skipped;
/// their errors are handed to `on_error` so the caller can report them.
pub fn marshal_args(
    lua: &Lua,
    atoms: &[HostAtom],
    range: ArgRange,
    mut on_error: impl FnMut(&HostAtom, BridgeError),
) -> LuaMultiValue {
    let mut args = LuaMultiValue::new();
    for atom in range.slice(atoms).iter().rev() {
        match atom_to_value(lua, atom) {
            Ok(v) => args.push_front(v),
            Err(e) => on_error(atom, e),
        }
    }
    args
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::HostMessage;

    fn no_errors(atom: &HostAtom, e: BridgeError) {
        panic!("unexpected conversion error for {atom}: {e}");
    }

    /// Render each argument via Lua's `tostring` for easy comparison.
    fn render(lua: &Lua, args: LuaMultiValue) -> Vec<String> {
        let tostring: LuaFunction = lua.globals().get("tostring").unwrap();
        args.into_iter()
            .map(|v| tostring.call::<String>(v).unwrap())
            .collect()
    }

    #[test]
    fn after_selector_skips_first_atom() {
        let lua = Lua::new();
        let msg = HostMessage::parse("add 1 2.5 three").unwrap();
        let args = marshal_args(&lua, msg.atoms(), ArgRange::AfterSelector, no_errors);
        assert_eq!(render(&lua, args), ["1.0", "2.5", "three"]);
    }

    #[test]
    fn whole_keeps_every_atom() {
        let lua = Lua::new();
        let msg = HostMessage::parse("add 1 2").unwrap();
        let args = marshal_args(&lua, msg.atoms(), ArgRange::Whole, no_errors);
        assert_eq!(render(&lua, args), ["add", "1.0", "2.0"]);
    }

    #[test]
    fn empty_range_is_empty_list() {
        let lua = Lua::new();
        let msg = HostMessage::parse("solo").unwrap();
        assert!(marshal_args(&lua, msg.atoms(), ArgRange::AfterSelector, no_errors).is_empty());
        assert!(marshal_args(&lua, &[], ArgRange::AfterSelector, no_errors).is_empty());
        assert!(marshal_args(&lua, &[], ArgRange::Whole, no_errors).is_empty());
    }

    #[test]
    fn unsupported_atoms_are_skipped_and_reported() {
        let lua = Lua::new();
        let msg = HostMessage::parse("f 1 $1 two $2-x").unwrap();
        let mut errors = Vec::new();
        let args = marshal_args(&lua, msg.atoms(), ArgRange::AfterSelector, |atom, e| {
            errors.push(format!("{atom}: {e}"));
        });
        assert_eq!(render(&lua, args), ["1.0", "two"]);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("$2-x"), "{errors:?}");
        assert!(errors[1].starts_with("$1"), "{errors:?}");
    }

    #[test]
    fn arguments_reach_a_lua_function_in_order() {
        let lua = Lua::new();
        lua.load("function join(...) return table.concat({...}, ',') end").exec().unwrap();
        let msg = HostMessage::parse("join a b c").unwrap();
        let args = marshal_args(&lua, msg.atoms(), ArgRange::AfterSelector, no_errors);
        let join: LuaFunction = lua.globals().get("join").unwrap();
        assert_eq!(join.call::<String>(args).unwrap(), "a,b,c");
    }
}
