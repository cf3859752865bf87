//! Decode errors for threadvm program images.

use thiserror::Error;

/// Errors that occur while turning a word stream into a [`Program`].
///
/// All of these are the `MalformedProgram` family: they are reported at the
/// load boundary, before any instruction executes.
///
/// [`Program`]: crate::Program
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Byte stream length is not a multiple of 4.
    #[error("invalid program image length: {0} bytes (must be a multiple of 4)")]
    InvalidLength(usize),

    /// The last instruction's immediates run past the end of the stream.
    #[error(
        "truncated instruction {opcode} at word {offset}: needs {needed} immediate(s), {available} available"
    )]
    Truncated {
        opcode: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Opcode word has no entry in the arity table.
    #[error("unknown opcode {opcode} at word {offset}")]
    UnknownOpcode { opcode: u32, offset: usize },

    /// Mnemonic text does not name any opcode.
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),
}
