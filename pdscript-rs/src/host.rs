//! The host side of the bridge.
//!
//! A node talks to its host through three channels: a list outlet for
//! collected values, a log channel for console text, and an error channel
//! for bridge faults.  [`ConsoleHost`] writes them to stdout/stderr;
//! [`CaptureHost`] records them for inspection.

use std::cell::RefCell;
use std::rc::Rc;

use crate::atom::{HostAtom, HostMessage};

/// Outbound list channel created by [`Host::new_list_outlet`].
///
/// Dropping the box releases the channel.
pub trait ListOutlet {
    fn send_list(&self, atoms: &[HostAtom]);
}

/// Services a node needs from its host.
pub trait Host {
    /// Post one line of console text.  `line` keeps its terminator when it
    /// had one.
    fn post(&self, line: &str);

    /// Report a bridge fault.
    fn error(&self, message: &str);

    /// Create a list outlet for the node.
    fn new_list_outlet(&self) -> Box<dyn ListOutlet>;
}

// ── ConsoleHost ───────────────────────────────────────────────────────────────

/// Host that prints to the terminal; used by the `pdscript` binary.
#[derive(Debug, Default)]
pub struct ConsoleHost;

struct ConsoleOutlet;

impl ListOutlet for ConsoleOutlet {
    fn send_list(&self, atoms: &[HostAtom]) {
        let msg = HostMessage::truncating(atoms.to_vec());
        println!("outlet: {msg}");
    }
}

impl Host for ConsoleHost {
    fn post(&self, line: &str) {
        println!("{}", line.strip_suffix('\n').unwrap_or(line));
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn new_list_outlet(&self) -> Box<dyn ListOutlet> {
        Box::new(ConsoleOutlet)
    }
}

// ── CaptureHost ───────────────────────────────────────────────────────────────

/// Everything a [`CaptureHost`] has received.
#[derive(Debug, Default, Clone)]
pub struct Captured {
    /// One entry per list sent on any outlet.
    pub lists: Vec<Vec<HostAtom>>,
    /// Console lines, terminators included.
    pub posts: Vec<String>,
    pub errors: Vec<String>,
    /// Outlets created and not yet released.
    pub open_outlets: usize,
}

/// Host that records every message; clones share one record.
#[derive(Debug, Default, Clone)]
pub struct CaptureHost {
    record: Rc<RefCell<Captured>>,
}

struct CaptureOutlet {
    record: Rc<RefCell<Captured>>,
}

impl ListOutlet for CaptureOutlet {
    fn send_list(&self, atoms: &[HostAtom]) {
        self.record.borrow_mut().lists.push(atoms.to_vec());
    }
}

impl Drop for CaptureOutlet {
    fn drop(&mut self) {
        self.record.borrow_mut().open_outlets -= 1;
    }
}

impl CaptureHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Captured {
        self.record.borrow().clone()
    }

    /// Take everything recorded so far, leaving the record empty (open
    /// outlets are still counted).
    pub fn take(&self) -> Captured {
        let mut rec = self.record.borrow_mut();
        let open = rec.open_outlets;
        let mut taken = std::mem::take(&mut *rec);
        rec.open_outlets = open;
        taken.open_outlets = open;
        taken
    }

    pub fn lists(&self) -> Vec<Vec<HostAtom>> {
        self.record.borrow().lists.clone()
    }

    pub fn posts(&self) -> Vec<String> {
        self.record.borrow().posts.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.record.borrow().errors.clone()
    }

    pub fn open_outlets(&self) -> usize {
        self.record.borrow().open_outlets
    }
}

impl Host for CaptureHost {
    fn post(&self, line: &str) {
        self.record.borrow_mut().posts.push(line.to_owned());
    }

    fn error(&self, message: &str) {
        self.record.borrow_mut().errors.push(message.to_owned());
    }

    fn new_list_outlet(&self) -> Box<dyn ListOutlet> {
        self.record.borrow_mut().open_outlets += 1;
        Box::new(CaptureOutlet { record: Rc::clone(&self.record) })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_records_all_channels() {
        let host = CaptureHost::new();
        let outlet = host.new_list_outlet();
        outlet.send_list(&[HostAtom::Number(1.0), HostAtom::symbol("a")]);
        host.post("hello\n");
        host.error("oops");

        let rec = host.snapshot();
        assert_eq!(rec.lists, vec![vec![HostAtom::Number(1.0), HostAtom::symbol("a")]]);
        assert_eq!(rec.posts, ["hello\n"]);
        assert_eq!(rec.errors, ["oops"]);
        assert_eq!(rec.open_outlets, 1);
    }

    #[test]
    fn dropping_outlet_releases_it() {
        let host = CaptureHost::new();
        let outlet = host.new_list_outlet();
        assert_eq!(host.open_outlets(), 1);
        drop(outlet);
        assert_eq!(host.open_outlets(), 0);
    }

    #[test]
    fn take_empties_record_but_keeps_outlet_count() {
        let host = CaptureHost::new();
        let _outlet = host.new_list_outlet();
        host.post("x\n");
        let taken = host.take();
        assert_eq!(taken.posts, ["x\n"]);
        assert_eq!(taken.open_outlets, 1);
        assert!(host.posts().is_empty());
        assert_eq!(host.open_outlets(), 1);
    }
}
