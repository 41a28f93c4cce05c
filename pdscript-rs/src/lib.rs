//! Lua scripting node for message-passing patch hosts.
//!
//! A [`BridgeHandle`] owns one Lua 5.4 state and translates between the
//! host's atom messages and Lua values: host messages call Lua functions by
//! name, scripts send lists back through `outlet(...)`, and anything a
//! script prints is posted to the host log one line at a time.
//!
//! ```rust
//! use std::rc::Rc;
//! use pdscript::{BridgeConfig, BridgeHandle, CaptureHost, HostAtom, HostMessage};
//!
//! let host = CaptureHost::new();
//! let mut node = BridgeHandle::new(Rc::new(host.clone()), BridgeConfig::default()).unwrap();
//! node.eval("function add(a, b) outlet(a + b) end");
//! node.receive_message(HostMessage::parse("call add 1 2").unwrap().atoms());
//! assert_eq!(host.lists(), vec![vec![HostAtom::Number(3.0)]]);
//! ```

pub mod atom;
pub mod cli;
pub mod collect;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod host;
pub mod marshal;
pub mod sink;
pub mod value;

// Re-exports for convenience.
pub use atom::{HostAtom, HostMessage, Symbol, SymbolTable, MAX_ATOMS};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use handle::BridgeHandle;
pub use host::{CaptureHost, ConsoleHost, Host, ListOutlet};
