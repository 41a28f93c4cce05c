//! Console capture: Lua output → host log lines.
//!
//! Every byte a script prints passes through [`OutputSink::put_byte`].  Bytes
//! accumulate in a fixed-capacity buffer which is posted to the host as one
//! line when a `\n` arrives or the buffer fills up, whichever comes first.
//! The buffer then restarts empty.
//!
//! [`redirect`] replaces Lua's console primitives so that everything lands
//! here:
//!
//! | Lua                        | Effect                                   |
//! |----------------------------|------------------------------------------|
//! | `print(...)`               | `tostring` of each arg, tab-separated, `\n` |
//! | `io.write(...)`            | strings / numbers, no separator          |
//! | `io.stdout:write(...)`     | same as `io.write`                       |
//! | `io.stderr:write(...)`     | same as `io.write`                       |
//!
//! Output and error text share the sink and are indistinguishable once
//! captured.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;

use crate::host::Host;

/// Default [`OutputSink`] capacity in bytes.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 1024;

/// Line buffer between a Lua state and the host log channel.
pub struct OutputSink {
    buf: Vec<u8>,
    capacity: usize,
    host: Rc<dyn Host>,
}

impl OutputSink {
    /// A sink posting to `host`.  A `capacity` of 0 is treated as 1.
    pub fn new(host: Rc<dyn Host>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { buf: Vec::with_capacity(capacity), capacity, host }
    }

    /// Append one byte, flushing on `\n` or when the buffer is full.
    pub fn put_byte(&mut self, b: u8) {
        self.buf.push(b);
        if b == b'\n' || self.buf.len() >= self.capacity {
            self.flush();
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.put_byte(b);
        }
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Post whatever is buffered, even without a terminator.
    ///
    /// A multi-byte character split by a capacity flush is posted with
    /// replacement characters.
    pub fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        self.host.post(&line);
        self.buf.clear();
    }

    /// Bytes waiting for a terminator.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ── Lua redirection ───────────────────────────────────────────────────────────

/// Route `print`, `io.write`, `io.stdout` and `io.stderr` of `lua` into `sink`.
///
/// Arguments are rendered before the sink is borrowed, so a `__tostring`
/// metamethod that prints is safe.
pub fn redirect(lua: &Lua, sink: &Rc<RefCell<OutputSink>>) -> LuaResult<()> {
    let globals = lua.globals();

    // print(...)
    {
        let sink = Rc::clone(sink);
        globals.set(
            "print",
            lua.create_function(move |_, args: LuaMultiValue| {
                let mut line = Vec::new();
                for (i, v) in args.iter().enumerate() {
                    if i > 0 {
                        line.push(b'\t');
                    }
                    push_tostring(&mut line, v)?;
                }
                line.push(b'\n');
                write_to(&sink, "print", &line)
            })?,
        )?;
    }

    let io: LuaTable = globals.get("io")?;

    // stream:write(...) → stream, shared by io.stdout and io.stderr
    let stream = lua.create_table()?;
    {
        let sink = Rc::clone(sink);
        stream.set(
            "write",
            lua.create_function(move |_, (this, args): (LuaTable, LuaMultiValue)| {
                let bytes = render_write_args(&args)?;
                write_to(&sink, "write", &bytes)?;
                Ok(this)
            })?,
        )?;
    }
    stream.set("flush", lua.create_function(|_, this: LuaTable| Ok(this))?)?;
    io.set("stdout", stream.clone())?;
    io.set("stderr", stream)?;

    // io.write(...) → io.stdout
    {
        let sink = Rc::clone(sink);
        io.set(
            "write",
            lua.create_function(move |lua, args: LuaMultiValue| {
                let bytes = render_write_args(&args)?;
                write_to(&sink, "write", &bytes)?;
                lua.globals().get::<LuaTable>("io")?.get::<LuaValue>("stdout")
            })?,
        )?;
    }

    Ok(())
}

/// The sink is busy while a line is being posted; a host that echoes the
/// line back into the same node gets a Lua error instead.
fn write_to(sink: &RefCell<OutputSink>, func: &str, bytes: &[u8]) -> LuaResult<()> {
    let mut sink = sink.try_borrow_mut().map_err(|_| {
        LuaError::RuntimeError(format!("{func}: called again while a line is being posted"))
    })?;
    sink.write_bytes(bytes);
    Ok(())
}

fn push_tostring(out: &mut Vec<u8>, v: &LuaValue) -> LuaResult<()> {
    match v {
        LuaValue::String(s) => out.extend_from_slice(&s.as_bytes()),
        other => out.extend_from_slice(other.to_string()?.as_bytes()),
    }
    Ok(())
}

/// `io.write` accepts only strings and numbers.
fn render_write_args(args: &LuaMultiValue) -> LuaResult<Vec<u8>> {
    let mut out = Vec::new();
    for (i, v) in args.iter().enumerate() {
        match v {
            LuaValue::String(_) | LuaValue::Integer(_) | LuaValue::Number(_) => {
                push_tostring(&mut out, v)?;
            }
            other => {
                return Err(LuaError::RuntimeError(format!(
                    "bad argument #{} to 'write' (string expected, got {})",
                    i + 1,
                    other.type_name()
                )));
            }
        }
    }
    Ok(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
