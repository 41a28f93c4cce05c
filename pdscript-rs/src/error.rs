//! Bridge errors.

use thiserror::Error;

/// Result type used throughout the bridge.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Everything that can go wrong between the host and the interpreter.
///
/// None of these are fatal: [`crate::BridgeHandle`] reports them and stays
/// usable.  Script faults ([`BridgeError::Script`]) are rendered into the
/// node's console output; all other variants go to the host error channel.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no script value for atom of type '{kind}'")]
    UnsupportedAtomKind { kind: &'static str },

    #[error("function [{0}] not defined")]
    UndefinedFunction(String),

    #[error("first argument should be a symbol, got {kind}")]
    InvalidSelector { kind: &'static str },

    #[error("[{name}] is a {kind} value, not a function")]
    NotCallable { name: String, kind: &'static str },

    #[error("list truncated at {capacity} atoms")]
    CapacityExceeded { capacity: usize },

    #[error("load: no file name given")]
    MissingPath,

    #[error("no method for '{0}'")]
    UnknownMethod(String),

    #[error("{0}")]
    Script(#[from] mlua::Error),
}

impl BridgeError {
    /// `true` for faults raised by script code rather than by the bridge.
    pub fn is_script(&self) -> bool {
        matches!(self, BridgeError::Script(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_function_message() {
        let e = BridgeError::UndefinedFunction("nonexistent".into());
        assert_eq!(e.to_string(), "function [nonexistent] not defined");
        assert!(!e.is_script());
    }

    #[test]
    fn missing_path_names_the_message() {
        let e = BridgeError::MissingPath;
        assert_eq!(e.to_string(), "load: no file name given");
        assert!(!e.is_script());
    }

    #[test]
    fn script_errors_are_flagged() {
        let e = BridgeError::from(mlua::Error::RuntimeError("boom".into()));
        assert!(e.is_script());
        assert!(e.to_string().contains("boom"));
    }
}
