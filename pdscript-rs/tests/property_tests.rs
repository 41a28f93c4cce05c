use std::rc::Rc;

use mlua::Lua;
use proptest::prelude::*;
use pdscript::host::CaptureHost;
use pdscript::sink::OutputSink;
use pdscript::value::{atom_to_value, value_to_atom};
use pdscript::{HostAtom, HostMessage, SymbolTable};

proptest! {
    /// Finite numbers survive host → Lua → host unchanged.
    #[test]
    fn number_round_trip(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        let lua = Lua::new();
        let mut syms = SymbolTable::new();
        let v = atom_to_value(&lua, &HostAtom::Number(x)).unwrap();
        prop_assert_eq!(value_to_atom(&v, &mut syms), Some(HostAtom::Number(x)));
    }
}

proptest! {
    /// Symbols become Lua strings with identical text and come back as
    /// the same symbol.
    #[test]
    fn symbol_round_trip(s in "\\PC*") {
        let lua = Lua::new();
        let mut syms = SymbolTable::new();
        let v = atom_to_value(&lua, &HostAtom::symbol(&s)).unwrap();
        match &v {
            mlua::Value::String(ls) => prop_assert_eq!(&*ls.to_str().unwrap(), s.as_str()),
            other => prop_assert!(false, "not a string: {:?}", other),
        }
        prop_assert_eq!(value_to_atom(&v, &mut syms), Some(HostAtom::symbol(&s)));
    }
}

proptest! {
    /// The sink never holds more than its capacity, and flushing loses no
    /// bytes.
    #[test]
    fn sink_preserves_bytes(s in "[a-z\\n]{0,200}", capacity in 1usize..32) {
        let host = CaptureHost::new();
        let mut sink = OutputSink::new(Rc::new(host.clone()), capacity);
        for &b in s.as_bytes() {
            sink.put_byte(b);
            prop_assert!(sink.len() < capacity);
        }
        sink.flush();
        prop_assert_eq!(host.posts().concat(), s);
        for line in host.posts() {
            prop_assert!(line.len() <= capacity);
            prop_assert!(!line[..line.len() - 1].contains('\n'));
        }
    }
}

proptest! {
    /// Message parsing never panics and never exceeds capacity.
    #[test]
    fn message_parse_is_total(s in "\\PC*") {
        if let Ok(msg) = HostMessage::parse(&s) {
            prop_assert!(msg.len() <= pdscript::MAX_ATOMS);
        }
    }
}
