//! Runtime errors for the threadvm engine.
//!
//! Every error carries the instruction index (`at`) at which execution
//! stopped. None of them are recovered locally: the dispatch loop halts and
//! hands the error to the driver.

use thiserror::Error;

use crate::memory::OutOfBounds;

/// Fatal conditions raised while executing a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Integer divide/modulo by zero, or float divide by `0.0`.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    /// A memory access reached past the end of memory.
    #[error("memory access of {len} byte(s) at offset {offset} out of bounds at instruction {at}")]
    MemoryOutOfBounds { at: usize, offset: u32, len: u32 },

    /// Pop or peek on an empty operand stack.
    #[error("stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    /// Push onto a full operand stack.
    #[error("stack overflow (capacity {capacity}) at instruction {at}")]
    StackOverflow { at: usize, capacity: usize },

    /// A call would nest deeper than the configured limit.
    #[error("call depth exceeded limit {limit} at instruction {at}")]
    CallDepthExceeded { at: usize, limit: usize },

    /// Jump or call target outside the program.
    #[error("invalid target {target} at instruction {at}")]
    InvalidTarget { at: usize, target: u32 },

    /// Opcode has no execution semantics.
    #[error("unknown opcode {opcode} at instruction {at}")]
    UnknownOpcode { at: usize, opcode: u32 },

    /// Input line could not be parsed, or input ended.
    #[error("invalid input {input:?} at instruction {at}")]
    InvalidInput { at: usize, input: String },

    /// Reading input or writing output failed.
    #[error("i/o error at instruction {at}: {message}")]
    Io { at: usize, message: String },

    /// The configured step budget ran out.
    #[error("step limit {limit} exceeded at instruction {at}")]
    StepLimitExceeded { at: usize, limit: u64 },
}

/// Error categories, independent of the payload carried by each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DivisionByZero,
    MemoryOutOfBounds,
    StackUnderflow,
    StackOverflow,
    CallDepthExceeded,
    InvalidTarget,
    UnknownOpcode,
    InvalidInput,
    Io,
    StepLimitExceeded,
}

impl RuntimeError {
    /// Build a memory error from a bounds fault.
    pub(crate) fn memory(at: usize, fault: OutOfBounds) -> Self {
        RuntimeError::MemoryOutOfBounds {
            at,
            offset: fault.offset,
            len: fault.len,
        }
    }

    /// Build an i/o error.
    pub(crate) fn io(at: usize, err: std::io::Error) -> Self {
        RuntimeError::Io {
            at,
            message: err.to_string(),
        }
    }

    /// Instruction index at which the error occurred.
    pub fn at(&self) -> usize {
        match self {
            RuntimeError::DivisionByZero { at }
            | RuntimeError::MemoryOutOfBounds { at, .. }
            | RuntimeError::StackUnderflow { at }
            | RuntimeError::StackOverflow { at, .. }
            | RuntimeError::CallDepthExceeded { at, .. }
            | RuntimeError::InvalidTarget { at, .. }
            | RuntimeError::UnknownOpcode { at, .. }
            | RuntimeError::InvalidInput { at, .. }
            | RuntimeError::Io { at, .. }
            | RuntimeError::StepLimitExceeded { at, .. } => *at,
        }
    }

    /// The error's category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            RuntimeError::MemoryOutOfBounds { .. } => ErrorKind::MemoryOutOfBounds,
            RuntimeError::StackUnderflow { .. } => ErrorKind::StackUnderflow,
            RuntimeError::StackOverflow { .. } => ErrorKind::StackOverflow,
            RuntimeError::CallDepthExceeded { .. } => ErrorKind::CallDepthExceeded,
            RuntimeError::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            RuntimeError::UnknownOpcode { .. } => ErrorKind::UnknownOpcode,
            RuntimeError::InvalidInput { .. } => ErrorKind::InvalidInput,
            RuntimeError::Io { .. } => ErrorKind::Io,
            RuntimeError::StepLimitExceeded { .. } => ErrorKind::StepLimitExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        assert_eq!(
            RuntimeError::DivisionByZero { at: 5 }.to_string(),
            "division by zero at instruction 5"
        );
        assert_eq!(
            RuntimeError::MemoryOutOfBounds {
                at: 2,
                offset: 4_194_303,
                len: 4
            }
            .to_string(),
            "memory access of 4 byte(s) at offset 4194303 out of bounds at instruction 2"
        );
        assert_eq!(
            RuntimeError::InvalidInput {
                at: 0,
                input: "abc".to_string()
            }
            .to_string(),
            "invalid input \"abc\" at instruction 0"
        );
    }

    #[test]
    fn at_and_kind() {
        let e = RuntimeError::InvalidTarget { at: 7, target: 99 };
        assert_eq!(e.at(), 7);
        assert_eq!(e.kind(), ErrorKind::InvalidTarget);

        let e = RuntimeError::memory(3, OutOfBounds { offset: 10, len: 4 });
        assert_eq!(e.at(), 3);
        assert_eq!(e.kind(), ErrorKind::MemoryOutOfBounds);
    }
}
