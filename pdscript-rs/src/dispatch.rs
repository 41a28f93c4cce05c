//! Calling Lua functions by name.
//!
//! Dispatch is two separate steps so that "no such function" can be told
//! apart from "the function ran and failed":
//!
//! 1. [`lookup`] resolves a global name to a function, or reports
//!    [`BridgeError::UndefinedFunction`] / [`BridgeError::NotCallable`]
//!    without running any script code.
//! 2. [`invoke`] runs the function to completion; failures raised by the
//!    script come back as [`BridgeError::Script`].

use mlua::prelude::*;

use crate::atom::HostAtom;
use crate::error::{BridgeError, Result};

/// Resolve `name` in the Lua global table.
pub fn lookup(lua: &Lua, name: &str) -> Result<LuaFunction> {
    // raw_get: a global-table __index hook must not run during lookup.
    match lua.globals().raw_get::<LuaValue>(name)? {
        LuaValue::Function(f) => Ok(f),
        LuaValue::Nil => Err(BridgeError::UndefinedFunction(name.to_owned())),
        other => Err(BridgeError::NotCallable { name: name.to_owned(), kind: other.type_name() }),
    }
}

/// Call `func` with `args`, discarding its results.
pub fn invoke(func: &LuaFunction, args: LuaMultiValue) -> Result<()> {
    func.call::<()>(args)?;
    Ok(())
}

/// [`lookup`] then [`invoke`].
pub fn dispatch(lua: &Lua, name: &str, args: LuaMultiValue) -> Result<()> {
    let func = lookup(lua, name)?;
    invoke(&func, args)
}

/// Extract the function name from the first atom of a `call` message.
pub fn selector(atoms: &[HostAtom]) -> Result<&str> {
    match atoms.first() {
        Some(HostAtom::Symbol(s)) => Ok(s.as_str()),
        Some(other) => Err(BridgeError::InvalidSelector { kind: other.kind() }),
        None => Err(BridgeError::InvalidSelector { kind: "nothing" }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
