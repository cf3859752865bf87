//! Program representation and the image codec.
//!
//! A program image is a flat sequence of little-endian 32-bit words with no
//! header. Inside an image, jump and call targets are word offsets of the
//! target's opcode word. A decoded [`Program`] holds absolute instruction
//! indices instead; [`Program::decode`] and [`Program::encode`] translate
//! between the two.

use crate::error::DecodeError;
use crate::instruction::Instruction;
use crate::opcode::Opcode;

/// A decoded program: an immutable sequence of instructions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    /// The instruction stream. Targets are instruction indices.
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Target value for an image offset that does not start an instruction.
    ///
    /// It is never a valid index, so executing the jump fails with an
    /// invalid-target error.
    pub const UNRESOLVED_TARGET: u32 = u32::MAX;

    /// Create a program from instructions whose targets are already
    /// instruction indices.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Decode a word stream.
    ///
    /// Reads one opcode word, looks up its arity, consumes that many
    /// immediates, and repeats until the stream is exhausted. Targets are
    /// then rewritten from word offsets to instruction indices.
    pub fn decode(words: &[u32]) -> Result<Self, DecodeError> {
        let mut instructions = Vec::new();
        let mut offsets = Vec::new();
        let mut pos = 0;

        while pos < words.len() {
            let opcode = Opcode::from_word(words[pos]).ok_or(DecodeError::UnknownOpcode {
                opcode: words[pos],
                offset: pos,
            })?;
            let needed = opcode.arity();
            let available = words.len() - pos - 1;
            if needed > available {
                return Err(DecodeError::Truncated {
                    opcode: opcode.mnemonic(),
                    offset: pos,
                    needed,
                    available,
                });
            }

            instructions.push(Instruction::new(opcode, &words[pos + 1..pos + 1 + needed]));
            offsets.push(pos);
            pos += 1 + needed;
        }

        for instr in &mut instructions {
            for &slot in instr.opcode.target_slots() {
                let offset = instr.imm(slot) as usize;
                let index = offsets
                    .binary_search(&offset)
                    .ok()
                    .and_then(|i| u32::try_from(i).ok())
                    .unwrap_or(Self::UNRESOLVED_TARGET);
                instr.set_imm(slot, index);
            }
        }

        Ok(Self { instructions })
    }

    /// Decode raw image bytes (little-endian words).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if !bytes.len().is_multiple_of(4) {
            return Err(DecodeError::InvalidLength(bytes.len()));
        }

        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self::decode(&words)
    }

    /// Encode to image words, mapping targets back to word offsets.
    ///
    /// Targets that are not valid instruction indices are written as
    /// [`Program::UNRESOLVED_TARGET`].
    pub fn encode(&self) -> Vec<u32> {
        let offsets = self.word_offsets();
        let mut words = Vec::with_capacity(offsets.last().map_or(0, |&o| o as usize + 4));

        for instr in &self.instructions {
            let mut out = *instr;
            for &slot in instr.opcode.target_slots() {
                let offset = offsets
                    .get(instr.imm(slot) as usize)
                    .copied()
                    .unwrap_or(Self::UNRESOLVED_TARGET);
                out.set_imm(slot, offset);
            }
            out.encode_into(&mut words);
        }

        words
    }

    /// Encode to image bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode()
            .into_iter()
            .flat_map(u32::to_le_bytes)
            .collect()
    }

    /// Image word offset of every instruction, in order.
    pub fn word_offsets(&self) -> Vec<u32> {
        let mut offsets = Vec::with_capacity(self.instructions.len());
        let mut pos: u32 = 0;
        for instr in &self.instructions {
            offsets.push(pos);
            pos = pos.wrapping_add(instr.word_len() as u32);
        }
        offsets
    }

    /// Image word offset of the instruction at `index`.
    pub fn word_offset(&self, index: usize) -> Option<u32> {
        self.word_offsets().get(index).copied()
    }

    /// Instruction at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
