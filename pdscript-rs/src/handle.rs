//! One scripting node: a Lua state wired to a host.
//!
//! # Messages
//!
//! | Host message          | Rust method                     |
//! |-----------------------|---------------------------------|
//! | `bang`                | [`BridgeHandle::bang`]          |
//! | `load <path>`         | [`BridgeHandle::load`]          |
//! | `call <fn> <arg>…`    | [`BridgeHandle::call`]          |
//! | `list <atom>…`        | [`BridgeHandle::list`]          |
//!
//! # Lua API
//!
//! | Lua function       | Effect                                          |
//! |--------------------|-------------------------------------------------|
//! | `outlet(...)`      | send the numbers/strings in `...` as one list   |
//! | `print(...)` etc.  | post text to the host log (see [`crate::sink`]) |
//!
//! # Errors
//!
//! Nothing here fails towards the host.  Bridge faults (unknown function,
//! bad selector, unconvertible atom, truncated list) go to
//! [`Host::error`]; errors raised by Lua code, including load errors, are
//! printed into the node's console output like any other text.  The node
//! stays usable afterwards.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use mlua::prelude::*;

use crate::atom::HostAtom;
use crate::collect::ResultCollector;
use crate::config::BridgeConfig;
use crate::dispatch::{self, selector};
use crate::error::{BridgeError, Result};
use crate::host::{Host, ListOutlet};
use crate::marshal::{marshal_args, ArgRange};
use crate::sink::{self, OutputSink};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

// ── Shared state seen by the `outlet` callback ───────────────────────────────

struct Emitter {
    node: u64,
    collector: RefCell<ResultCollector>,
    /// `None` once the node has been torn down.
    outlet: RefCell<Option<Box<dyn ListOutlet>>>,
    host: Rc<dyn Host>,
}

impl Emitter {
    fn emit(&self, args: &LuaMultiValue) -> LuaResult<()> {
        let mut collector = self.collector.try_borrow_mut().map_err(|_| {
            LuaError::RuntimeError("outlet: called again while its list is being sent".into())
        })?;
        let outlet = self.outlet.borrow();
        let Some(outlet) = outlet.as_deref() else { return Ok(()) };
        if let Err(e) = collector.emit(args, outlet) {
            tracing::warn!(node = self.node, "outlet: {e}");
            self.host.error(&format!("outlet: {e}"));
        }
        Ok(())
    }
}

// ── BridgeHandle ──────────────────────────────────────────────────────────────

/// A Lua interpreter owned by one host node.
///
/// Create with [`BridgeHandle::new`]; dropping the handle flushes pending
/// console text, releases the list outlet and closes the Lua state.
pub struct BridgeHandle {
    node: u64,
    lua: Lua,
    emitter: Rc<Emitter>,
    sink: Rc<RefCell<OutputSink>>,
    host: Rc<dyn Host>,
    config: BridgeConfig,
}

impl BridgeHandle {
    /// Create a fresh Lua state bound to `host`.
    pub fn new(host: Rc<dyn Host>, config: BridgeConfig) -> Result<Self> {
        let node = NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed);
        let lua = Lua::new();

        let sink = Rc::new(RefCell::new(OutputSink::new(
            Rc::clone(&host),
            config.output_capacity,
        )));
        sink::redirect(&lua, &sink)?;

        let emitter = Rc::new(Emitter {
            node,
            collector: RefCell::new(ResultCollector::new(config.scratch_capacity)),
            outlet: RefCell::new(Some(host.new_list_outlet())),
            host: Rc::clone(&host),
        });
        {
            let emitter = Rc::clone(&emitter);
            lua.globals().set(
                config.outlet_name.as_str(),
                lua.create_function(move |_, args: LuaMultiValue| emitter.emit(&args))?,
            )?;
        }

        tracing::debug!(
            node,
            scratch = config.scratch_capacity,
            output = config.output_capacity,
            "node created"
        );
        Ok(Self { node, lua, emitter, sink, host, config })
    }

    /// The node's Lua state, for embedding code that needs direct access.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ── Messages ──────────────────────────────────────────────────────────

    /// Route a host message by selector.
    pub fn receive(&mut self, selector: &str, args: &[HostAtom]) {
        let result = match selector {
            "bang" => self.run_bang(),
            "load" => self.run_load(args),
            "call" => self.run_call(args),
            "list" => self.run_list(args),
            other => Err(BridgeError::UnknownMethod(other.to_owned())),
        };
        self.report(result);
    }

    /// Route a complete message whose first atom is the selector.
    ///
    /// A message starting with a number is a list.
    pub fn receive_message(&mut self, atoms: &[HostAtom]) {
        match atoms.first() {
            None => {}
            Some(HostAtom::Symbol(sel)) => {
                let sel = sel.clone();
                self.receive(&sel, &atoms[1..]);
            }
            Some(_) => self.receive("list", atoms),
        }
    }

    /// Run the bang function with no arguments.
    pub fn bang(&mut self) {
        let result = self.run_bang();
        self.report(result);
    }

    /// Load a Lua file named by the first atom.
    pub fn load(&mut self, args: &[HostAtom]) {
        let result = self.run_load(args);
        self.report(result);
    }

    /// Load a Lua file, resolving relative paths via the search path.
    pub fn load_path(&mut self, path: &Path) {
        let result = self.run_load_path(path);
        self.report(result);
    }

    /// Call the function named by the first atom with the remaining atoms.
    pub fn call(&mut self, args: &[HostAtom]) {
        let result = self.run_call(args);
        self.report(result);
    }

    /// Call the `list` function with every atom as an argument.
    pub fn list(&mut self, args: &[HostAtom]) {
        let result = self.run_list(args);
        self.report(result);
    }

    /// Execute a Lua chunk.
    pub fn eval(&mut self, chunk: &str) {
        let result = self.lua.load(chunk).set_name("=eval").exec().map_err(BridgeError::from);
        self.report(result);
    }

    // ── Implementation ────────────────────────────────────────────────────

    fn run_bang(&self) -> Result<()> {
        tracing::debug!(node = self.node, "bang");
        dispatch::dispatch(&self.lua, &self.config.bang_name, LuaMultiValue::new())
    }

    fn run_load(&self, args: &[HostAtom]) -> Result<()> {
        let Some(first) = args.first() else {
            return Err(BridgeError::MissingPath);
        };
        self.run_load_path(&PathBuf::from(first.to_string()))
    }

    fn run_load_path(&self, path: &Path) -> Result<()> {
        let path = self.config.resolve_script(path);
        tracing::debug!(node = self.node, path = %path.display(), "load");
        let source = std::fs::read(&path).map_err(|e| {
            LuaError::RuntimeError(format!("cannot open {}: {e}", path.display()))
        })?;
        self.lua
            .load(source.as_slice())
            .set_name(format!("@{}", path.display()))
            .exec()?;
        Ok(())
    }

    fn run_call(&self, args: &[HostAtom]) -> Result<()> {
        let name = selector(args)?;
        let func = dispatch::lookup(&self.lua, name)?;
        tracing::debug!(node = self.node, function = name, argc = args.len() - 1, "call");
        let lua_args = self.marshal(args, ArgRange::AfterSelector);
        dispatch::invoke(&func, lua_args)
    }

    fn run_list(&self, args: &[HostAtom]) -> Result<()> {
        let func = dispatch::lookup(&self.lua, "list")?;
        tracing::debug!(node = self.node, argc = args.len(), "list");
        let lua_args = self.marshal(args, ArgRange::Whole);
        dispatch::invoke(&func, lua_args)
    }

    fn marshal(&self, args: &[HostAtom], range: ArgRange) -> LuaMultiValue {
        marshal_args(&self.lua, args, range, |atom, e| {
            tracing::warn!(node = self.node, atom = %atom, "argument skipped: {e}");
            self.host.error(&format!("argument skipped: {e}"));
        })
    }

    /// Send a failure to the right channel.
    fn report(&self, result: Result<()>) {
        let Err(e) = result else { return };
        if e.is_script() {
            tracing::debug!(node = self.node, "script error: {e}");
            match self.sink.try_borrow_mut() {
                Ok(mut sink) => {
                    sink.write_str(&e.to_string());
                    sink.put_byte(b'\n');
                }
                // Busy: the host is inside `post` for this node.
                Err(_) => tracing::warn!(node = self.node, "script error while posting: {e}"),
            }
        } else {
            tracing::warn!(node = self.node, "{e}");
            self.host.error(&e.to_string());
        }
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        if let Ok(mut sink) = self.sink.try_borrow_mut() {
            sink.flush();
        }
        if let Ok(mut outlet) = self.emitter.outlet.try_borrow_mut() {
            outlet.take();
        }
        tracing::debug!(node = self.node, "node destroyed");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
