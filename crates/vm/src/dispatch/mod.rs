//! Dispatch strategies.
//!
//! A strategy owns the fetch/decode/execute loop and nothing else. All
//! instruction semantics live on [`Engine`], so every strategy produces the
//! same observable result for the same program and input.

mod jump_table;
mod switch;
mod threaded;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use jump_table::{Handler, JumpTableDispatch, HANDLERS};
pub use switch::SwitchDispatch;
pub use threaded::{ThreadedCode, ThreadedDispatch};

use crate::error::RuntimeError;
use crate::machine::{Engine, RunResult};

/// A way of driving the engine until the run ends or fails.
pub trait DispatchStrategy {
    /// Short name used on the command line and in logs.
    fn name(&self) -> &'static str;

    /// Run from the engine's current ip until an exit or a fatal error.
    fn run(&self, engine: &mut Engine<'_>) -> Result<RunResult, RuntimeError>;
}

/// The built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dispatch {
    /// `match` on the opcode each step.
    #[default]
    Switch,
    /// Index a static table of handler functions by opcode.
    JumpTable,
    /// Pre-translate the program into a closure per instruction.
    Threaded,
}

/// Unrecognised strategy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dispatch strategy '{0}' (expected switch, jump-table or threaded)")]
pub struct UnknownDispatch(pub String);

impl Dispatch {
    pub const ALL: [Dispatch; 3] = [Dispatch::Switch, Dispatch::JumpTable, Dispatch::Threaded];

    pub fn name(self) -> &'static str {
        self.strategy().name()
    }

    pub fn strategy(self) -> &'static dyn DispatchStrategy {
        match self {
            Dispatch::Switch => &SwitchDispatch,
            Dispatch::JumpTable => &JumpTableDispatch,
            Dispatch::Threaded => &ThreadedDispatch,
        }
    }
}

impl FromStr for Dispatch {
    type Err = UnknownDispatch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "switch" => Ok(Dispatch::Switch),
            "jump-table" | "jump_table" | "table" => Ok(Dispatch::JumpTable),
            "threaded" => Ok(Dispatch::Threaded),
            _ => Err(UnknownDispatch(s.to_string())),
        }
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for d in Dispatch::ALL {
            assert_eq!(d.name().parse::<Dispatch>(), Ok(d));
            assert_eq!(d.to_string(), d.name());
        }
    }

    #[test]
    fn parse_aliases_and_errors() {
        assert_eq!("TABLE".parse::<Dispatch>(), Ok(Dispatch::JumpTable));
        assert_eq!("jump_table".parse::<Dispatch>(), Ok(Dispatch::JumpTable));
        assert_eq!(
            "native".parse::<Dispatch>(),
            Err(UnknownDispatch("native".to_string()))
        );
    }
}
