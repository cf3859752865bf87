//! Error types for the threadvm assembler.

use thiserror::Error;

/// Errors produced while assembling text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// An unrecognized mnemonic.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// An instruction has fewer operands than its arity.
    #[error("line {line}: {opcode} expects {expected} operand(s), found {found}")]
    MissingOperand {
        line: usize,
        opcode: &'static str,
        expected: usize,
        found: usize,
    },

    /// A numeric literal could not be parsed or is out of range.
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// A token appeared where it was not expected.
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },

    /// A target names a label that is never defined.
    #[error("line {line}: unknown label '{label}'")]
    UnknownLabel { line: usize, label: String },

    /// A label is defined twice.
    #[error("line {line}: duplicate label '{label}'")]
    DuplicateLabel { line: usize, label: String },
}
