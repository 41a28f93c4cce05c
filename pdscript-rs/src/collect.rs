//! Lua value lists → host list messages.
//!
//! The `outlet(...)` callback hands its arguments to a [`ResultCollector`],
//! which converts them front to back into a reusable scratch buffer and
//! sends the result as one list.  Conversion stops at the first value with
//! no atom form (`nil`, a boolean, a table, …); everything before it is
//! still sent.  A list longer than the scratch buffer is cut at capacity and
//! reported.

use mlua::prelude::*;

use crate::atom::{HostAtom, SymbolTable};
use crate::error::BridgeError;
use crate::host::ListOutlet;
use crate::value::value_to_atom;

/// Default scratch buffer capacity in atoms.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 1024;

/// Result of one collection pass.
#[derive(Debug)]
pub struct Collected<'a> {
    pub atoms: &'a [HostAtom],
    /// The list held more convertible values than the scratch buffer.
    pub truncated: bool,
}

/// Scratch buffer plus the symbol table strings are interned into.
#[derive(Debug)]
pub struct ResultCollector {
    scratch: Vec<HostAtom>,
    capacity: usize,
    symbols: SymbolTable,
}

impl ResultCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            scratch: Vec::with_capacity(capacity),
            capacity,
            symbols: SymbolTable::new(),
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Convert `values` into the scratch buffer.
    pub fn collect(&mut self, values: &LuaMultiValue) -> Collected<'_> {
        self.scratch.clear();
        let mut truncated = false;
        for value in values.iter() {
            let Some(atom) = value_to_atom(value, &mut self.symbols) else { break };
            if self.scratch.len() == self.capacity {
                truncated = true;
                break;
            }
            self.scratch.push(atom);
        }
        Collected { atoms: &self.scratch, truncated }
    }

    /// Collect `values` and send them on `outlet` as one list.
    ///
    /// Returns the number of atoms sent.  A truncated list is still sent,
    /// after which [`BridgeError::CapacityExceeded`] is returned.
    pub fn emit(
        &mut self,
        values: &LuaMultiValue,
        outlet: &dyn ListOutlet,
    ) -> Result<usize, BridgeError> {
        let capacity = self.capacity;
        let collected = self.collect(values);
        outlet.send_list(collected.atoms);
        if collected.truncated {
            return Err(BridgeError::CapacityExceeded { capacity });
        }
        Ok(collected.atoms.len())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
