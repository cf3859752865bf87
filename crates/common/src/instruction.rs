//! Decoded instructions.
//!
//! In a program image an instruction occupies `1 + arity` consecutive
//! 32-bit words: the opcode word followed by its immediates.

use std::fmt;

use crate::opcode::Opcode;

/// Maximum number of immediates any opcode takes.
pub const MAX_IMMEDIATES: usize = 3;

/// A single decoded instruction: an opcode plus its immediates.
///
/// Immediate slots beyond the opcode's arity are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    operands: [u32; MAX_IMMEDIATES],
}

impl Instruction {
    /// Create an instruction from an opcode and its immediates.
    ///
    /// Extra values beyond the opcode's arity are discarded and missing ones
    /// are zero, so the result always satisfies the arity invariant.
    pub fn new(opcode: Opcode, immediates: &[u32]) -> Self {
        let mut operands = [0; MAX_IMMEDIATES];
        for (slot, value) in operands
            .iter_mut()
            .zip(immediates.iter())
            .take(opcode.arity())
        {
            *slot = *value;
        }
        Self { opcode, operands }
    }

    /// Instruction with no immediates.
    pub fn nullary(opcode: Opcode) -> Self {
        Self::new(opcode, &[])
    }

    /// Instruction with one immediate.
    pub fn unary(opcode: Opcode, a: u32) -> Self {
        Self::new(opcode, &[a])
    }

    /// Instruction with two immediates.
    pub fn binary(opcode: Opcode, a: u32, b: u32) -> Self {
        Self::new(opcode, &[a, b])
    }

    /// Instruction with three immediates.
    pub fn ternary(opcode: Opcode, a: u32, b: u32, c: u32) -> Self {
        Self::new(opcode, &[a, b, c])
    }

    /// The immediate at `index`, or zero beyond the arity.
    #[inline]
    pub fn imm(&self, index: usize) -> u32 {
        self.operands.get(index).copied().unwrap_or(0)
    }

    /// The opcode's immediates, exactly `arity` long.
    pub fn immediates(&self) -> &[u32] {
        &self.operands[..self.opcode.arity()]
    }

    /// Replace the immediate at `index`. Indices beyond the arity are ignored.
    pub fn set_imm(&mut self, index: usize, value: u32) {
        if index < self.opcode.arity() {
            self.operands[index] = value;
        }
    }

    /// Number of image words this instruction occupies.
    pub fn word_len(&self) -> usize {
        1 + self.opcode.arity()
    }

    /// Append the instruction's image words to `out`.
    pub fn encode_into(&self, out: &mut Vec<u32>) {
        out.push(self.opcode.word());
        out.extend_from_slice(self.immediates());
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for value in self.immediates() {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}
